//! Account management routes for the signed-in user.

use axum::{
    Extension, Json, Router, extract::State, middleware::from_fn_with_state, routing::post,
    routing::put,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::error::{ApiResult, FieldErrors};
use crate::api::jwt::Claims;
use crate::api::middleware::jwt_auth_middleware;
use crate::api::models::{AccountResponse, MessageResponse};
use crate::api::server::AppState;
use crate::api::validation::{Schema, Validate, ValidatedJson, ValidationRules};

/// Change password request body.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    /// Current password for verification
    pub old_password: String,
    /// New password to set
    pub new_password: String,
}

impl Validate for ChangePasswordRequest {
    fn validate(&self, rules: &ValidationRules) -> Result<(), FieldErrors> {
        let mut schema = Schema::new();
        schema
            .field("oldPassword", &self.old_password)
            .min_chars(rules.min_password_length);
        schema
            .field("newPassword", &self.new_password)
            .min_chars(rules.min_password_length)
            .differs_from(
                &self.old_password,
                "New password must be different from old password",
            );
        schema.finish()
    }
}

/// Profile update request body. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    /// New display name
    pub name: Option<String>,
    /// New login email
    pub email: Option<String>,
}

impl Validate for UpdateProfileRequest {
    fn validate(&self, _rules: &ValidationRules) -> Result<(), FieldErrors> {
        let mut schema = Schema::new();
        if let Some(name) = &self.name {
            schema.field("name", name).non_empty();
        }
        if let Some(email) = &self.email {
            schema.field("email", email).email();
        }
        schema.finish()
    }
}

/// Create the users router. Every route requires an access token.
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/me", put(update_me))
        .route("/change-password", post(change_password))
        .route_layer(from_fn_with_state(
            state.access_jwt.clone(),
            jwt_auth_middleware,
        ))
}

/// POST /api/users/change-password
#[utoipa::path(
    post,
    path = "/api/users/change-password",
    tag = "users",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid body or incorrect current password", body = crate::api::error::ApiErrorResponse),
        (status = 401, description = "No token provided", body = crate::api::error::ApiErrorResponse),
        (status = 403, description = "Invalid or expired token", body = crate::api::error::ApiErrorResponse),
        (status = 404, description = "Account not found", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(request): ValidatedJson<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .auth_service
        .change_password(&claims.sub, &request.old_password, &request.new_password)
        .await?;

    Ok(Json(MessageResponse::new("Password changed successfully")))
}

/// PUT /api/users/me
#[utoipa::path(
    put,
    path = "/api/users/me",
    tag = "users",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated account", body = AccountResponse),
        (status = 400, description = "Invalid body or email already registered", body = crate::api::error::ApiErrorResponse),
        (status = 404, description = "Account not found", body = crate::api::error::ApiErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_me(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<Json<AccountResponse>> {
    let account = state
        .auth_service
        .update_profile(
            &claims.sub,
            request.name.as_deref(),
            request.email.as_deref(),
        )
        .await?;

    Ok(Json(account))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_password_request_is_camel_case() {
        let request: ChangePasswordRequest =
            serde_json::from_str(r#"{"oldPassword": "secret1", "newPassword": "secret2"}"#)
                .unwrap();
        assert_eq!(request.old_password, "secret1");
        assert!(request.validate(&ValidationRules::default()).is_ok());
    }

    #[test]
    fn test_change_password_rejects_same_password() {
        let request = ChangePasswordRequest {
            old_password: "secret1".to_string(),
            new_password: "secret1".to_string(),
        };
        let errors = request.validate(&ValidationRules::default()).unwrap_err();
        assert_eq!(
            errors["newPassword"],
            vec!["New password must be different from old password"]
        );
    }

    #[test]
    fn test_change_password_rejects_short_new_password() {
        let request = ChangePasswordRequest {
            old_password: "secret1".to_string(),
            new_password: "abc".to_string(),
        };
        let errors = request.validate(&ValidationRules::default()).unwrap_err();
        assert!(errors.contains_key("newPassword"));
    }

    #[test]
    fn test_change_password_uses_configured_minimum() {
        let request = ChangePasswordRequest {
            old_password: "abcd".to_string(),
            new_password: "wxyz".to_string(),
        };
        let rules = ValidationRules {
            min_password_length: 4,
        };
        assert!(request.validate(&rules).is_ok());
    }

    #[test]
    fn test_update_profile_validates_present_fields_only() {
        let rules = ValidationRules::default();
        assert!(UpdateProfileRequest::default().validate(&rules).is_ok());

        let request = UpdateProfileRequest {
            name: Some(" ".to_string()),
            email: Some("not-an-email".to_string()),
        };
        let errors = request.validate(&rules).unwrap_err();
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("email"));
    }
}
