//! Repository layer for database access.
//!
//! Services depend on the traits here, never on a concrete pool, so tests can
//! swap in in-memory implementations.

pub mod user;

pub use user::*;
