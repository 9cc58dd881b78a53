//! Bearer-token authentication.
//!
//! # Responsibilities
//! - Parse the `Authorization` header into a bearer credential
//! - Issue HS256 tokens carrying the authenticated principal
//! - Verify presented tokens and extract the identity claim
//!
//! # Design Decisions
//! - Signing key material is read-only, established once at startup
//! - Verification has exactly two outcomes: valid claims or a hard failure.
//!   There is no pass-through for tokens that decode but fail validation.

use jsonwebtoken::{
    decode, encode, get_current_timestamp, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

/// Error type for authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The header could not be decomposed into scheme + credential.
    #[error("authorization header is not a bearer credential")]
    MalformedToken,

    /// Signature or claims verification failed.
    #[error("token verification failed")]
    InvalidToken,

    /// Token signing failed.
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Claims carried by an issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated principal (username).
    pub sub: String,
    /// Issued-at, seconds since the epoch.
    pub iat: u64,
    /// Expiry, seconds since the epoch.
    pub exp: u64,
}

/// Extract the bearer credential from an `Authorization` header value.
/// Per RFC 6750, the "Bearer" scheme is case-insensitive.
pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
    if header.len() >= 7 && header[..7].eq_ignore_ascii_case("bearer ") {
        Ok(&header[7..])
    } else {
        Err(AuthError::MalformedToken)
    }
}

/// Issues and verifies HS256 bearer tokens.
pub struct TokenAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: u64,
}

impl TokenAuthenticator {
    /// Create an authenticator from a shared secret and token lifetime.
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl_secs,
        }
    }

    /// Issue a token for the given principal.
    pub fn issue(&self, username: &str) -> Result<String, AuthError> {
        let now = get_current_timestamp();
        let claims = Claims {
            sub: username.to_owned(),
            iat: now,
            exp: now + self.ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(AuthError::Signing)
    }

    /// Verify a presented token and return its claims.
    ///
    /// Every non-valid outcome (bad signature, expired, wrong algorithm,
    /// undecodable) is `InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_verify_roundtrip() {
        let auth = TokenAuthenticator::new("unit-test-secret", 3600);

        let token = auth.issue("alice").unwrap();
        let claims = auth.verify(&token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.exp, claims.iat + 3600);
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let issuer = TokenAuthenticator::new("secret-a", 3600);
        let verifier = TokenAuthenticator::new("secret-b", 3600);

        let token = issuer.issue("alice").unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let auth = TokenAuthenticator::new("unit-test-secret", 3600);

        let mut token = auth.issue("alice").unwrap();
        token.push('x');
        assert!(matches!(auth.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn verify_rejects_expired_claims() {
        let auth = TokenAuthenticator::new("unit-test-secret", 3600);

        let now = get_current_timestamp();
        let claims = Claims {
            sub: "alice".into(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();

        assert!(matches!(auth.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn verify_rejects_garbage() {
        let auth = TokenAuthenticator::new("unit-test-secret", 3600);
        assert!(matches!(
            auth.verify("not-a-token"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc").unwrap(), "abc");
        assert_eq!(bearer_token("bearer abc").unwrap(), "abc");

        assert!(bearer_token("Basic abc").is_err());
        assert!(bearer_token("Bearer").is_err());
        assert!(bearer_token("").is_err());
    }
}
