//! Declarative request validation.
//!
//! Each request body type implements [`Validate`] by listing its field rules
//! against a [`Schema`]. Handlers take a [`ValidatedJson<T>`], which only
//! exists once the body has been parsed and every rule passed; failures are
//! answered with 400 and a per-field `errors` map before the handler runs.

use std::sync::LazyLock;

use axum::{
    Json,
    extract::{FromRef, FromRequest, Request},
};
use regex::Regex;
use serde::de::DeserializeOwned;

use crate::api::auth_service::DEFAULT_MIN_PASSWORD_LENGTH;
use crate::api::error::{ApiError, FieldErrors};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Check an address against the email shape `local@domain.tld`.
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Runtime-configured limits the schemas check against.
///
/// Extracted from the router state, so the HTTP layer and the service
/// enforce the same password minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    pub min_password_length: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

/// A request body with a validation schema.
pub trait Validate {
    /// Evaluate the schema, returning every failed rule keyed by field.
    fn validate(&self, rules: &ValidationRules) -> Result<(), FieldErrors>;
}

/// Collects rule failures for one request body.
#[derive(Debug, Default)]
pub struct Schema {
    errors: FieldErrors,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start checking a string field.
    pub fn field<'a>(&'a mut self, name: &'static str, value: &'a str) -> FieldRules<'a> {
        FieldRules {
            schema: self,
            name,
            value,
        }
    }

    fn push(&mut self, field: &str, message: String) {
        self.errors
            .entry(field.to_string())
            .or_default()
            .push(message);
    }

    /// Finish the schema.
    pub fn finish(self) -> Result<(), FieldErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Rules applicable to a single string field.
pub struct FieldRules<'a> {
    schema: &'a mut Schema,
    name: &'static str,
    value: &'a str,
}

impl FieldRules<'_> {
    /// Require at least one non-whitespace character.
    pub fn non_empty(self) -> Self {
        if self.value.trim().is_empty() {
            self.schema
                .push(self.name, format!("{} is required", self.name));
        }
        self
    }

    /// Require at least `min` characters.
    pub fn min_chars(self, min: usize) -> Self {
        if self.value.chars().count() < min {
            self.schema.push(
                self.name,
                format!("{} must be at least {} characters", self.name, min),
            );
        }
        self
    }

    /// Require a syntactically valid email address.
    pub fn email(self) -> Self {
        if !is_valid_email(self.value) {
            self.schema.push(self.name, "Invalid email".to_string());
        }
        self
    }

    /// Require the value to differ from `other`.
    pub fn differs_from(self, other: &str, message: &str) -> Self {
        if self.value == other {
            self.schema.push(self.name, message.to_string());
        }
        self
    }
}

/// JSON body extractor that runs the body's [`Validate`] schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    ValidationRules: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                let mut errors = FieldErrors::new();
                errors.insert("body".to_string(), vec![rejection.body_text()]);
                ApiError::validation(errors)
            })?;

        let rules = ValidationRules::from_ref(state);
        value.validate(&rules).map_err(ApiError::validation)?;

        Ok(ValidatedJson(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shapes() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("ax.com"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_schema_collects_all_failures() {
        let mut schema = Schema::new();
        schema.field("name", "  ").non_empty();
        schema.field("email", "nope").email();
        schema.field("password", "abc").min_chars(6);
        let errors = schema.finish().unwrap_err();

        assert_eq!(errors.len(), 3);
        assert_eq!(errors["password"], vec!["password must be at least 6 characters"]);
    }

    #[test]
    fn test_schema_passes() {
        let mut schema = Schema::new();
        schema.field("name", "Alice").non_empty();
        schema.field("email", "a@x.com").email();
        schema
            .field("newPassword", "secret2")
            .min_chars(6)
            .differs_from("secret1", "must differ");
        assert!(schema.finish().is_ok());
    }

    #[test]
    fn test_min_chars_counts_characters_not_bytes() {
        let mut schema = Schema::new();
        schema.field("password", "ééééé").min_chars(6);
        assert!(schema.finish().is_err());

        let mut schema = Schema::new();
        schema.field("password", "éééééé").min_chars(6);
        assert!(schema.finish().is_ok());
    }
}
