//! API response models shared across routes.
//!
//! Request bodies live next to the routes that accept them, together with
//! their validation schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::database::models::UserDbModel;

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    /// Account ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl From<UserDbModel> for AccountResponse {
    fn from(user: UserDbModel) -> Self {
        Self {
            created_at: user.get_created_at(),
            updated_at: user.get_updated_at(),
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

/// Generic message response for operations that return only a status message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    /// Status or result message
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Access token returned by login and refresh.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    /// JWT access token, sent back as `Authorization: Bearer <token>`
    pub access_token: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always "Ok" when the process answers
    pub status: String,
    /// Crate version
    pub version: String,
    /// Seconds since the server started
    pub uptime_secs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_response_hides_password_hash() {
        let user = UserDbModel::new("Alice", "a@x.com", "$argon2id$secret-hash");
        let json = serde_json::to_value(AccountResponse::from(user)).unwrap();

        assert_eq!(json["name"], "Alice");
        assert_eq!(json["email"], "a@x.com");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2id"));
    }

    #[test]
    fn test_access_token_response_is_camel_case() {
        let json = serde_json::to_string(&AccessTokenResponse {
            access_token: "abc".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"accessToken":"abc"}"#);
    }
}
