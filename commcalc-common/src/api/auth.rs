//! Password gate for the dashboard
//!
//! # Architecture
//!
//! - The configured credential is the SHA-256 of the password, as 64 hex
//!   characters (`[auth] password_sha256`); the plain password is never stored
//! - Callers send the plain password; it is hashed and compared in constant
//!   time against the configured hash
//! - An empty configured hash disables the gate
//!
//! # Pure Functions
//!
//! No HTTP framework dependencies. The dashboard wraps [`PasswordGate`] in its
//! own axum middleware.

use sha2::{Digest, Sha256};

// ========================================
// Error Types
// ========================================

/// Authentication error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No password supplied while the gate is enabled
    MissingPassword,

    /// Password hash does not match the configured value
    InvalidPassword,

    /// Configured hash is not 64 hex characters
    MalformedHash(String),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingPassword => write!(f, "Password required"),
            AuthError::InvalidPassword => write!(f, "Incorrect password"),
            AuthError::MalformedHash(hash) => {
                write!(f, "Configured password hash is malformed: {:?}", hash)
            }
        }
    }
}

impl std::error::Error for AuthError {}

// ========================================
// Hash Calculation
// ========================================

/// SHA-256 of a password as 64 lowercase hex characters
///
/// # Examples
///
/// ```
/// use commcalc_common::api::auth::hash_password;
///
/// let hash = hash_password("letmein");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(
///     hash_password(""),
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Byte comparison whose running time does not depend on where inputs differ
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

// ========================================
// Gate
// ========================================

/// Capability check run before the report pipeline
#[derive(Debug, Clone, Default)]
pub struct PasswordGate {
    /// Lowercase hex hash; `None` disables the gate
    expected: Option<String>,
}

impl PasswordGate {
    /// Build from the configured hash; blank disables the gate
    pub fn from_hash(configured: &str) -> Result<Self, AuthError> {
        let hash = configured.trim().to_ascii_lowercase();
        if hash.is_empty() {
            return Ok(Self::disabled());
        }
        if hash.len() != 64 || !hash.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AuthError::MalformedHash(configured.to_string()));
        }
        Ok(Self {
            expected: Some(hash),
        })
    }

    /// A gate that admits every caller
    pub fn disabled() -> Self {
        Self { expected: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.expected.is_some()
    }

    /// Check a caller-supplied plain password
    pub fn check(&self, password: Option<&str>) -> Result<(), AuthError> {
        let Some(expected) = &self.expected else {
            return Ok(());
        };
        let password = password.ok_or(AuthError::MissingPassword)?;
        let provided = hash_password(password);
        if constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
            Ok(())
        } else {
            Err(AuthError::InvalidPassword)
        }
    }
}
