//! Password hashing and verification
//!
//! Thin wrapper over bcrypt; hashes are salted per bcrypt's cost format.

use bcrypt::{hash, verify, DEFAULT_COST};
use thiserror::Error;

/// Errors that can occur during password hashing
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashFailed(String),

    #[error("Failed to verify password: {0}")]
    VerifyFailed(String),
}

/// Hash a plaintext password for storage
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash(password, DEFAULT_COST).map_err(|e| PasswordError::HashFailed(e.to_string()))
}

/// Check a plaintext password against a stored hash
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PasswordError> {
    verify(password, password_hash).map_err(|e| PasswordError::VerifyFailed(e.to_string()))
}
