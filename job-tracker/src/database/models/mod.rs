//! Database models.
//!
//! These map directly to the database schema.

pub mod user;

pub use user::*;
