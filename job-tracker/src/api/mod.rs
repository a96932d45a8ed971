//! REST API module.
//!
//! Provides HTTP endpoints for account registration, login, token refresh,
//! and profile management.

pub mod auth_service;
pub mod cookie;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod validation;

pub use server::{ApiServer, ApiServerConfig, AppState};
