//! Authentication routes.
//!
//! Registration, login, logout, access token refresh, and the current
//! account lookup. The refresh token only ever travels in a cookie.

use axum::{
    Extension, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::cookie::{
    REFRESH_COOKIE_NAME, clear_refresh_cookie, get_cookie, refresh_cookie, to_header_value,
};
use crate::api::error::{ApiError, ApiResult, FieldErrors};
use crate::api::jwt::Claims;
use crate::api::middleware::jwt_auth_middleware;
use crate::api::models::{AccessTokenResponse, AccountResponse, MessageResponse};
use crate::api::server::AppState;
use crate::api::validation::{Schema, Validate, ValidatedJson, ValidationRules};

/// Registration request body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Plaintext password
    pub password: String,
}

impl Validate for RegisterRequest {
    fn validate(&self, rules: &ValidationRules) -> Result<(), FieldErrors> {
        let mut schema = Schema::new();
        schema.field("name", &self.name).non_empty();
        schema.field("email", &self.email).email();
        schema
            .field("password", &self.password)
            .min_chars(rules.min_password_length);
        schema.finish()
    }
}

/// Login request body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Login email
    pub email: String,
    /// Plaintext password
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self, rules: &ValidationRules) -> Result<(), FieldErrors> {
        let mut schema = Schema::new();
        schema.field("email", &self.email).email();
        schema
            .field("password", &self.password)
            .min_chars(rules.min_password_length);
        schema.finish()
    }
}

/// Create the auth router.
pub fn router(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(me))
        .route_layer(from_fn_with_state(
            state.access_jwt.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh", post(refresh))
        .merge(protected)
}

fn with_cookie(mut response: Response, cookie: &str) -> ApiResult<Response> {
    let value = to_header_value(cookie)
        .ok_or_else(|| ApiError::internal("Failed to build refresh cookie"))?;
    response.headers_mut().append(SET_COOKIE, value);
    Ok(response)
}

/// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = MessageResponse),
        (status = 400, description = "Invalid body or email already registered", body = crate::api::error::ApiErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    state
        .auth_service
        .register(&request.name, &request.email, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered Successfully")),
    ))
}

/// POST /api/auth/login
///
/// Returns the access token in the body and sets the refresh cookie.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful; refresh token set as HttpOnly cookie", body = AccessTokenResponse),
        (status = 400, description = "Invalid body", body = crate::api::error::ApiErrorResponse),
        (status = 401, description = "Invalid email or password", body = crate::api::error::ApiErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<Response> {
    let tokens = state
        .auth_service
        .authenticate(&request.email, &request.password)
        .await?;

    let cookie = refresh_cookie(
        &tokens.refresh_token,
        tokens.refresh_expires_in,
        state.secure_cookies,
    );
    let response = Json(AccessTokenResponse {
        access_token: tokens.access_token,
    })
    .into_response();

    with_cookie(response, &cookie)
}

/// POST /api/auth/logout
///
/// Always succeeds. Clears the refresh cookie; issued access tokens stay
/// valid until they expire.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Refresh cookie cleared", body = MessageResponse)
    )
)]
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    state
        .auth_service
        .logout(get_cookie(&headers, REFRESH_COOKIE_NAME));

    let response = Json(MessageResponse::new("Logged out successfully")).into_response();
    with_cookie(response, &clear_refresh_cookie(state.secure_cookies))
}

/// POST /api/auth/refresh
///
/// Mints a new access token from the refresh cookie.
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    tag = "auth",
    responses(
        (status = 200, description = "New access token", body = AccessTokenResponse),
        (status = 401, description = "No refresh cookie", body = crate::api::error::ApiErrorResponse),
        (status = 403, description = "Invalid or expired refresh token", body = crate::api::error::ApiErrorResponse),
        (status = 404, description = "Account no longer exists", body = crate::api::error::ApiErrorResponse)
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<AccessTokenResponse>> {
    let token = get_cookie(&headers, REFRESH_COOKIE_NAME)
        .ok_or_else(|| ApiError::unauthorized("No refresh token provided"))?;

    let access_token = state.auth_service.refresh_access_token(token).await?;

    Ok(Json(AccessTokenResponse { access_token }))
}

/// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current account", body = AccountResponse),
        (status = 401, description = "No token provided", body = crate::api::error::ApiErrorResponse),
        (status = 403, description = "Invalid or expired token", body = crate::api::error::ApiErrorResponse),
        (status = 404, description = "Account not found", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<AccountResponse>> {
    let account = state.auth_service.get_account(&claims.sub).await?;
    Ok(Json(account))
}
