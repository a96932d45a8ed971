//! JWT authentication middleware.
//!
//! Gates protected routes on a Bearer access token. The two failure tiers
//! are distinct: no credential at all is 401, a credential that does not
//! verify (bad signature, malformed, expired, wrong type or scheme) is 403.
//! Verification never touches the account store.

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

use crate::api::error::ApiError;
use crate::api::jwt::{JwtError, JwtService};

/// JWT authentication failure.
#[derive(Debug)]
pub enum JwtAuthError {
    /// No Authorization header, or one without a credential part
    MissingToken,
    /// Credential present but not a Bearer token
    InvalidFormat,
    /// Token validation failed
    InvalidToken(JwtError),
}

impl IntoResponse for JwtAuthError {
    fn into_response(self) -> Response {
        let error = match self {
            JwtAuthError::MissingToken => {
                ApiError::unauthorized("Access denied. No token provided.")
            }
            JwtAuthError::InvalidFormat | JwtAuthError::InvalidToken(_) => {
                ApiError::forbidden("Invalid or expired token")
            }
        };
        error.into_response()
    }
}

/// Extract the Bearer token from the Authorization header.
fn extract_bearer_token(request: &Request) -> Result<&str, JwtAuthError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(JwtAuthError::MissingToken)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| JwtAuthError::InvalidFormat)?;

    let (scheme, token) = auth_str
        .trim()
        .split_once(' ')
        .ok_or(JwtAuthError::MissingToken)?;

    let token = token.trim();
    if token.is_empty() {
        return Err(JwtAuthError::MissingToken);
    }
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(JwtAuthError::InvalidFormat);
    }

    Ok(token)
}

/// JWT authentication middleware.
///
/// Validates the Bearer token and injects its [`Claims`](crate::api::jwt::Claims) into the request
/// extensions for downstream handlers.
pub async fn jwt_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, JwtAuthError> {
    let token = extract_bearer_token(&request)?;

    let claims = jwt_service.validate_token(token).map_err(|e| {
        debug!(error = %e, "Rejected access token");
        JwtAuthError::InvalidToken(e)
    })?;

    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
