//! Authentication service: accounts, password hashing, and token issuance.
//!
//! This module provides the credential & session core:
//! - Registration with Argon2id password hashing and email uniqueness
//! - Login with enumeration-resistant failure handling
//! - Access/refresh token minting and access token re-issuance
//! - Password change and profile updates
//!
//! Passwords use Argon2id (m=19456 KiB, t=2, p=1) rather than bcrypt with
//! cost factor 10.
//!
//! Sessions are stateless on the server. Logout only clears the refresh
//! cookie; an access token already handed out stays valid until it expires.

use std::sync::{Arc, OnceLock};

use argon2::{
    Argon2, Params,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{debug, info, warn};

use crate::Result;
use crate::api::jwt::{JwtError, JwtService, TokenType};
use crate::api::models::AccountResponse;
use crate::config::{env_non_empty, env_parse_or, env_required};
use crate::database::models::UserDbModel;
use crate::database::repositories::UserRepository;

/// Default access token lifetime (15 minutes).
pub const DEFAULT_ACCESS_TOKEN_EXPIRATION_SECS: u64 = 900;

/// Default refresh token lifetime (7 days).
pub const DEFAULT_REFRESH_TOKEN_EXPIRATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Default minimum password length.
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;

/// Authentication configuration.
#[derive(Clone)]
pub struct AuthConfig {
    /// Secret used to sign access tokens
    pub jwt_secret: String,
    /// Secret used to sign refresh tokens
    pub jwt_refresh_secret: String,
    /// Token issuer claim
    pub issuer: String,
    /// Token audience claim
    pub audience: String,
    /// Access token expiration in seconds (default: 900 = 15 minutes)
    pub access_token_expiration_secs: u64,
    /// Refresh token expiration in seconds (default: 604800 = 7 days)
    pub refresh_token_expiration_secs: u64,
    /// Minimum password length in characters
    pub min_password_length: usize,
}

impl AuthConfig {
    /// Create a config with the given secret and default lifetimes.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        Self {
            jwt_refresh_secret: secret.clone(),
            jwt_secret: secret,
            issuer: "job-tracker".to_string(),
            audience: "job-tracker-api".to_string(),
            access_token_expiration_secs: DEFAULT_ACCESS_TOKEN_EXPIRATION_SECS,
            refresh_token_expiration_secs: DEFAULT_REFRESH_TOKEN_EXPIRATION_SECS,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }

    /// Create AuthConfig from environment variables.
    ///
    /// Environment variables:
    /// - `JWT_SECRET`: access token signing secret (required)
    /// - `JWT_REFRESH_SECRET`: refresh token signing secret (default: `JWT_SECRET`)
    /// - `JWT_ISSUER` / `JWT_AUDIENCE`: claim values
    /// - `ACCESS_TOKEN_EXPIRATION_SECS`: default 900
    /// - `REFRESH_TOKEN_EXPIRATION_SECS`: default 604800
    /// - `MIN_PASSWORD_LENGTH`: default 6
    pub fn from_env() -> Result<Self> {
        let defaults = Self::with_secret(env_required("JWT_SECRET")?);

        Ok(Self {
            jwt_refresh_secret: env_non_empty("JWT_REFRESH_SECRET")
                .unwrap_or_else(|| defaults.jwt_secret.clone()),
            issuer: env_non_empty("JWT_ISSUER").unwrap_or(defaults.issuer),
            audience: env_non_empty("JWT_AUDIENCE").unwrap_or(defaults.audience),
            access_token_expiration_secs: env_parse_or(
                "ACCESS_TOKEN_EXPIRATION_SECS",
                DEFAULT_ACCESS_TOKEN_EXPIRATION_SECS,
            ),
            refresh_token_expiration_secs: env_parse_or(
                "REFRESH_TOKEN_EXPIRATION_SECS",
                DEFAULT_REFRESH_TOKEN_EXPIRATION_SECS,
            ),
            min_password_length: env_parse_or("MIN_PASSWORD_LENGTH", DEFAULT_MIN_PASSWORD_LENGTH),
            jwt_secret: defaults.jwt_secret,
        })
    }

    /// Build the access token service.
    pub fn access_jwt_service(&self) -> JwtService {
        JwtService::new(
            &self.jwt_secret,
            &self.issuer,
            &self.audience,
            self.access_token_expiration_secs,
            TokenType::Access,
        )
    }

    /// Build the refresh token service.
    pub fn refresh_jwt_service(&self) -> JwtService {
        JwtService::new(
            &self.jwt_refresh_secret,
            &self.issuer,
            &self.audience,
            self.refresh_token_expiration_secs,
            TokenType::Refresh,
        )
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"<redacted>")
            .field("jwt_refresh_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field(
                "access_token_expiration_secs",
                &self.access_token_expiration_secs,
            )
            .field(
                "refresh_token_expiration_secs",
                &self.refresh_token_expiration_secs,
            )
            .field("min_password_length", &self.min_password_length)
            .finish()
    }
}

/// Authentication errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("User already exists")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Current password is incorrect")]
    IncorrectCurrentPassword,

    #[error("Password does not meet requirements: {0}")]
    WeakPassword(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::Error> for AuthError {
    fn from(err: crate::Error) -> Self {
        AuthError::Database(err.to_string())
    }
}

/// Tokens minted by a successful login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// JWT access token, returned in the response body
    pub access_token: String,
    /// JWT refresh token, delivered in an HttpOnly cookie
    pub refresh_token: String,
    /// Refresh token lifetime in seconds
    pub refresh_expires_in: u64,
}

/// Hash verified against when a login names an unknown email, so both
/// failure paths pay for one slow hash comparison. Computed once, when the
/// first `AuthService` is built, never on a login path.
static DUMMY_HASH: OnceLock<Option<String>> = OnceLock::new();

fn dummy_hash() -> Option<&'static str> {
    DUMMY_HASH
        .get_or_init(|| AuthService::hash_password("job-tracker-timing-equalizer").ok())
        .as_deref()
}

/// Authentication service for managing accounts and tokens.
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    access_jwt: Arc<JwtService>,
    refresh_jwt: Arc<JwtService>,
    config: AuthConfig,
}

impl AuthService {
    /// Create a new AuthService.
    ///
    /// The first call hashes the unknown-email placeholder, which takes as
    /// long as one password hash; build the service at startup.
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        access_jwt: Arc<JwtService>,
        refresh_jwt: Arc<JwtService>,
        config: AuthConfig,
    ) -> Self {
        if dummy_hash().is_none() {
            warn!("Failed to prepare placeholder hash; unknown-email logins will skip verification");
        }
        Self {
            user_repo,
            access_jwt,
            refresh_jwt,
            config,
        }
    }

    /// Hash a password using Argon2id with OWASP recommended parameters.
    ///
    /// A fresh random salt is generated per call, so hashing the same
    /// password twice yields different strings.
    pub fn hash_password(password: &str) -> std::result::Result<String, AuthError> {
        // m=19456 (19 MiB), t=2, p=1
        let params = Params::new(19456, 2, 1, None)
            .map_err(|e| AuthError::Internal(format!("Invalid Argon2 params: {}", e)))?;
        let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a stored hash.
    pub fn verify_password(password: &str, hash: &str) -> std::result::Result<bool, AuthError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AuthError::Internal(format!("Invalid password hash format: {}", e)))?;

        // Parameters are read back from the PHC string.
        let argon2 = Argon2::default();
        Ok(argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash on the blocking pool; Argon2 is deliberately slow.
    async fn hash_password_blocking(password: &str) -> std::result::Result<String, AuthError> {
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || Self::hash_password(&password))
            .await
            .map_err(|e| AuthError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    /// Verify on the blocking pool.
    async fn verify_password_blocking(
        password: &str,
        hash: &str,
    ) -> std::result::Result<bool, AuthError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || Self::verify_password(&password, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("Password verification task failed: {}", e)))?
    }

    /// Check the password length minimum (counted in characters).
    pub fn validate_password_strength(&self, password: &str) -> std::result::Result<(), AuthError> {
        if password.chars().count() < self.config.min_password_length {
            return Err(AuthError::WeakPassword(format!(
                "Password must be at least {} characters",
                self.config.min_password_length
            )));
        }
        Ok(())
    }

    /// Register a new account.
    ///
    /// Fails with [`AuthError::EmailTaken`] when the email is already in use,
    /// including when a concurrent registration wins the race at the store.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> std::result::Result<AccountResponse, AuthError> {
        debug!(email = %email, "Registration attempt");

        self.validate_password_strength(password)?;

        if self.user_repo.find_by_email(email).await?.is_some() {
            info!(email = %email, "Registration rejected: email already registered");
            return Err(AuthError::EmailTaken);
        }

        let password_hash = Self::hash_password_blocking(password).await?;
        let user = UserDbModel::new(name, email, password_hash);

        if let Err(e) = self.user_repo.create(&user).await {
            if e.is_unique_violation() {
                info!(email = %email, "Registration lost race on unique email");
                return Err(AuthError::EmailTaken);
            }
            return Err(e.into());
        }

        info!(user_id = %user.id, "User registered");
        Ok(AccountResponse::from(user))
    }

    /// Authenticate a login attempt and mint a token pair.
    ///
    /// Unknown email and wrong password both yield
    /// [`AuthError::InvalidCredentials`].
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<TokenPair, AuthError> {
        debug!(email = %email, "Login attempt");

        let user = match self.user_repo.find_by_email(email).await? {
            Some(user) => user,
            None => {
                if let Some(hash) = dummy_hash() {
                    let _ = Self::verify_password_blocking(password, hash).await;
                }
                warn!(email = %email, "Login failed: invalid credentials");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !Self::verify_password_blocking(password, &user.password_hash).await? {
            warn!(user_id = %user.id, "Login failed: invalid credentials");
            return Err(AuthError::InvalidCredentials);
        }

        let access_token = self
            .access_jwt
            .generate_token(&user.id)
            .map_err(|e| AuthError::Internal(e.to_string()))?;
        let refresh_token = self
            .refresh_jwt
            .generate_token(&user.id)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        info!(user_id = %user.id, "Login successful");

        Ok(TokenPair {
            access_token,
            refresh_token,
            refresh_expires_in: self.refresh_jwt.expiration_secs(),
        })
    }

    /// Mint a new access token from a valid refresh token.
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> std::result::Result<String, AuthError> {
        let claims = self
            .refresh_jwt
            .validate_token(refresh_token)
            .map_err(|e| match e {
                JwtError::TokenExpired => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })?;

        let user = self
            .user_repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "Refresh for missing user");
                AuthError::UserNotFound
            })?;

        let access_token = self
            .access_jwt
            .generate_token(&user.id)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        debug!(user_id = %user.id, "Access token re-issued");
        Ok(access_token)
    }

    /// Load the public view of an account.
    pub async fn get_account(
        &self,
        user_id: &str,
    ) -> std::result::Result<AccountResponse, AuthError> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .map(AccountResponse::from)
            .ok_or(AuthError::UserNotFound)
    }

    /// Change a user's password after verifying the current one.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> std::result::Result<(), AuthError> {
        debug!(user_id = %user_id, "Password change attempt");

        let user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !Self::verify_password_blocking(current_password, &user.password_hash).await? {
            warn!(user_id = %user_id, "Password change failed: incorrect current password");
            return Err(AuthError::IncorrectCurrentPassword);
        }

        self.validate_password_strength(new_password)?;

        let new_hash = Self::hash_password_blocking(new_password).await?;
        if !self.user_repo.update_password(user_id, &new_hash).await? {
            return Err(AuthError::UserNotFound);
        }

        info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// Update the name and/or email of an account.
    pub async fn update_profile(
        &self,
        user_id: &str,
        name: Option<&str>,
        email: Option<&str>,
    ) -> std::result::Result<AccountResponse, AuthError> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if let Some(email) = email
            && email != user.email
        {
            if self.user_repo.find_by_email(email).await?.is_some() {
                return Err(AuthError::EmailTaken);
            }
            user.email = email.to_string();
        }
        if let Some(name) = name {
            user.name = name.to_string();
        }

        match self
            .user_repo
            .update_profile(&user.id, &user.name, &user.email)
            .await
        {
            Ok(true) => {}
            Ok(false) => return Err(AuthError::UserNotFound),
            Err(e) if e.is_unique_violation() => return Err(AuthError::EmailTaken),
            Err(e) => return Err(e.into()),
        }
        user.touch();

        info!(user_id = %user_id, "Profile updated");
        Ok(AccountResponse::from(user))
    }

    /// Log out.
    ///
    /// Nothing is revoked server-side; the caller clears the refresh cookie.
    /// The presented refresh token, if any, is only decoded for the log line.
    pub fn logout(&self, refresh_token: Option<&str>) {
        match refresh_token.map(|t| self.refresh_jwt.validate_token(t)) {
            Some(Ok(claims)) => info!(user_id = %claims.sub, "Logout"),
            _ => debug!("Logout without a valid refresh token"),
        }
    }

    /// Get the authentication configuration.
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10))]

        #[test]
        fn prop_hash_never_equals_plaintext_and_verifies(
            password in "[a-zA-Z0-9!@#$%^&*]{6,64}"
        ) {
            let hash = AuthService::hash_password(&password).expect("Hashing should succeed");

            prop_assert!(hash.starts_with("$argon2id$"));
            prop_assert_ne!(&hash, &password);
            prop_assert!(AuthService::verify_password(&password, &hash).expect("verify"));
        }

        #[test]
        fn prop_other_passwords_do_not_verify(
            password in "[a-zA-Z0-9]{6,32}",
            suffix in "[a-zA-Z0-9]{1,8}",
        ) {
            let hash = AuthService::hash_password(&password).expect("Hashing should succeed");
            let other = format!("{}{}", password, suffix);
            prop_assert!(!AuthService::verify_password(&other, &hash).expect("verify"));
        }
    }
}
