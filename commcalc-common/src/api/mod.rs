//! Shared HTTP API functionality
//!
//! Pure functions only (no HTTP framework dependencies). The dashboard wraps
//! these with its own axum middleware.

pub mod auth;

pub use auth::{hash_password, AuthError, PasswordGate};
