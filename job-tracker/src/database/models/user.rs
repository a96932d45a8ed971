//! User database model.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// User database model.
///
/// Carries the password hash, so it deliberately does not implement
/// `Serialize`; API responses go through `AccountResponse`.
#[derive(Debug, Clone, FromRow)]
pub struct UserDbModel {
    /// Unique identifier (UUID)
    pub id: String,
    /// Display name
    pub name: String,
    /// Login key, unique and case-sensitive
    pub email: String,
    /// Argon2id password hash (PHC string)
    pub password_hash: String,
    /// Unix epoch milliseconds (UTC) when the user was created.
    pub created_at: i64,
    /// Unix epoch milliseconds (UTC) when the user was last updated.
    pub updated_at: i64,
}

impl UserDbModel {
    /// Create a new user. The password must already be hashed.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = crate::database::time::now_ms();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Get created_at as `DateTime<Utc>`.
    pub fn get_created_at(&self) -> DateTime<Utc> {
        crate::database::time::ms_to_datetime(self.created_at)
    }

    /// Get updated_at as `DateTime<Utc>`.
    pub fn get_updated_at(&self) -> DateTime<Utc> {
        crate::database::time::ms_to_datetime(self.updated_at)
    }

    /// Update the updated_at timestamp to now.
    pub fn touch(&mut self) {
        self.updated_at = crate::database::time::now_ms();
    }
}
