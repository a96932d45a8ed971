//! job-tracker library crate.
//!
//! Credential and session management for the job tracker: account
//! registration, login with access/refresh JWTs, and the HTTP API around it.

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
