//! API middleware.

pub mod jwt_auth;

pub use jwt_auth::{JwtAuthError, jwt_auth_middleware};
