//! OpenAPI documentation configuration.
//!
//! The document is generated with `utoipa` and served as JSON at
//! `/api/docs/openapi.json`.

use utoipa::OpenApi;

use crate::api::error::ApiErrorResponse;
use crate::api::models::{AccessTokenResponse, AccountResponse, HealthResponse, MessageResponse};
use crate::api::routes::auth::{LoginRequest, RegisterRequest};
use crate::api::routes::users::{ChangePasswordRequest, UpdateProfileRequest};

/// OpenAPI documentation for the job-tracker API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "job-tracker API",
        version = "0.1.0",
        description = "Account and session endpoints for the job tracker: registration, login, token refresh, and profile management."
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "auth", description = "Registration, login, logout, and token refresh"),
        (name = "users", description = "Profile and password management for the signed-in user")
    ),
    paths(
        // Health endpoints
        crate::api::routes::health::health_check,
        // Auth endpoints
        crate::api::routes::auth::register,
        crate::api::routes::auth::login,
        crate::api::routes::auth::logout,
        crate::api::routes::auth::refresh,
        crate::api::routes::auth::me,
        // User endpoints
        crate::api::routes::users::change_password,
        crate::api::routes::users::update_me,
    ),
    components(
        schemas(
            HealthResponse,
            RegisterRequest,
            LoginRequest,
            ChangePasswordRequest,
            UpdateProfileRequest,
            AccessTokenResponse,
            AccountResponse,
            MessageResponse,
            ApiErrorResponse,
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Security scheme addon for Bearer JWT authentication.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_auth_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/register",
            "/api/auth/login",
            "/api/auth/me",
            "/api/users/change-password",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_openapi_has_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
