//! Credential persistence.
//!
//! # Responsibilities
//! - Define the store boundary used by the login flow
//! - Provide the Postgres-backed implementation
//!
//! # Design Decisions
//! - "No matching credential" (`Ok(false)`) is distinct from "store could
//!   not be reached" (`Err`); callers map them to different outcomes
//! - Passwords are compared as SHA-256 digests; plaintext is never stored

pub mod postgres;

pub use postgres::PgCredentialStore;

use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Error type for credential store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Boundary to whatever holds stored credentials.
///
/// The forwarding path never touches this; only the login/issuance flow
/// does.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns whether a credential matching `username` and `password`
    /// exists. `Err` means the store itself failed, which is reported
    /// separately from `Ok(false)`.
    async fn check(&self, username: &str, password: &str) -> Result<bool, StoreError>;
}

/// Hex-encoded SHA-256 digest used for password comparison at rest.
pub fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_digest_is_stable_hex_sha256() {
        // SHA-256 of the empty string.
        assert_eq!(
            password_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(password_digest("a"), password_digest("a"));
        assert_ne!(password_digest("a"), password_digest("b"));
    }
}
