//! API error handling.
//!
//! Every failure leaving a handler becomes an [`ApiError`], rendered as a JSON
//! body with a status code. Internal details are logged, never returned.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::auth_service::AuthError;

/// Per-field validation messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// API error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Validation failures keyed by field name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

/// API error type that can be converted to HTTP responses.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub errors: Option<FieldErrors>,
}

impl ApiError {
    /// Create a new API error.
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            errors: None,
        }
    }

    /// Attach per-field validation messages.
    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = Some(errors);
        self
    }

    /// Create a 400 Bad Request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    /// Create a 400 error for a request body that failed its schema.
    pub fn validation(errors: FieldErrors) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "Invalid request body",
        )
        .with_errors(errors)
    }

    /// Create a 400 error for a duplicate unique key.
    ///
    /// Reported as 400 rather than 409 to keep the client contract of the
    /// registration endpoint.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "CONFLICT", message)
    }

    /// Create a 401 Unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    /// Create a 403 Forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    /// Create a 404 Not Found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    /// Create a 500 Internal Server Error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorResponse {
            code: self.code,
            message: self.message,
            errors: self.errors,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailTaken => ApiError::conflict("User already exists"),
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid email or password"),
            AuthError::IncorrectCurrentPassword => {
                ApiError::bad_request("Current password is incorrect")
            }
            AuthError::WeakPassword(msg) => ApiError::bad_request(msg),
            AuthError::InvalidToken | AuthError::TokenExpired => {
                ApiError::forbidden("Invalid or expired token")
            }
            AuthError::UserNotFound => ApiError::not_found("User not found"),
            AuthError::Database(msg) => {
                tracing::error!("Database error: {}", msg);
                ApiError::internal("Server Error")
            }
            AuthError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ApiError::internal("Server Error")
            }
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_creation() {
        let err = ApiError::not_found("User not found");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.code, "NOT_FOUND");
        assert_eq!(err.message, "User not found");
    }

    #[test]
    fn test_auth_error_status_mapping() {
        let cases = [
            (AuthError::EmailTaken, StatusCode::BAD_REQUEST),
            (AuthError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (AuthError::IncorrectCurrentPassword, StatusCode::BAD_REQUEST),
            (AuthError::InvalidToken, StatusCode::FORBIDDEN),
            (AuthError::TokenExpired, StatusCode::FORBIDDEN),
            (AuthError::UserNotFound, StatusCode::NOT_FOUND),
            (
                AuthError::Database("disk full".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_internal_details_are_not_leaked() {
        let err = ApiError::from(AuthError::Database("secret table layout".to_string()));
        assert!(!err.message.contains("secret"));
    }

    #[test]
    fn test_validation_body_shape() {
        let mut errors = FieldErrors::new();
        errors.insert("email".to_string(), vec!["Invalid email".to_string()]);
        let body = ApiErrorResponse {
            code: "VALIDATION_ERROR".to_string(),
            message: "Invalid request body".to_string(),
            errors: Some(errors),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["errors"]["email"][0], "Invalid email");
    }
}
