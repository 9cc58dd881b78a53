//! Gateway handler subsystem.
//!
//! # Data Flow
//! ```text
//! inbound forward request
//!     → authorize (bearer parse + token verify; terminal on failure)
//!     → connector.apply_command(command, payload)   [exactly once]
//!     → ForwardResponse { command echoed verbatim, backend payload }
//!
//! inbound login request
//!     → credential store check (store failure ≠ unknown credential)
//!     → authenticator.issue(username)
//! ```
//!
//! # Design Decisions
//! - The connector is never invoked for unauthenticated requests
//! - Connector failures never panic the serving task; the precise kind is
//!   kept for diagnostics while callers see a generic upstream failure

use std::sync::Arc;

use serde::Serialize;

use crate::auth::{self, AuthError, Claims, TokenAuthenticator};
use crate::connector::{ClassificationConnector, ConnectorError};
use crate::store::{CredentialStore, StoreError};

/// Caller-facing result of a successful forward.
#[derive(Debug, Clone, Serialize)]
pub struct ForwardResponse {
    /// The command, echoed verbatim from the request.
    pub command: String,
    /// The backend's raw response text.
    pub payload: String,
}

/// Error type for gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Missing, malformed, or invalid token.
    #[error("unauthorized: {0}")]
    Unauthorized(#[source] AuthError),

    /// Login presented a username/password with no stored match.
    #[error("unknown username or password")]
    InvalidCredentials,

    /// The credential store could not be reached.
    #[error("credential store failure: {0}")]
    Store(#[source] StoreError),

    /// Token issuance failed.
    #[error("token issuance failed: {0}")]
    Issue(#[source] AuthError),

    /// The backend round trip failed.
    #[error("backend round trip failed: {0}")]
    Backend(#[source] ConnectorError),
}

/// Orchestrates a single request: authenticate, forward, adapt the result.
pub struct Gateway {
    authenticator: TokenAuthenticator,
    connector: ClassificationConnector,
    store: Arc<dyn CredentialStore>,
}

impl Gateway {
    /// Create a gateway from its collaborators.
    pub fn new(
        authenticator: TokenAuthenticator,
        connector: ClassificationConnector,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            authenticator,
            connector,
            store,
        }
    }

    /// Gate a forwarding request behind authentication, then perform the
    /// backend exchange.
    ///
    /// `auth_header` is the raw `Authorization` header value, if any. On any
    /// authentication failure the backend is never contacted.
    pub async fn handle_forward(
        &self,
        auth_header: Option<&str>,
        command: &str,
        payload: &str,
    ) -> Result<ForwardResponse, GatewayError> {
        let claims = self.authorize(auth_header)?;

        tracing::debug!(user = %claims.sub, command = %command, "Forwarding command");

        let data = self
            .connector
            .apply_command(command, payload)
            .await
            .map_err(GatewayError::Backend)?;

        Ok(ForwardResponse {
            command: command.to_owned(),
            payload: data,
        })
    }

    /// Check the presented credentials and issue a token for them.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, GatewayError> {
        let found = self
            .store
            .check(username, password)
            .await
            .map_err(GatewayError::Store)?;

        if !found {
            return Err(GatewayError::InvalidCredentials);
        }

        self.authenticator.issue(username).map_err(GatewayError::Issue)
    }

    fn authorize(&self, auth_header: Option<&str>) -> Result<Claims, GatewayError> {
        let header = auth_header.ok_or(GatewayError::Unauthorized(AuthError::MalformedToken))?;
        let token = auth::bearer_token(header).map_err(GatewayError::Unauthorized)?;
        self.authenticator
            .verify(token)
            .map_err(GatewayError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeoutConfig;
    use async_trait::async_trait;

    struct FixedStore {
        result: Result<bool, ()>,
    }

    #[async_trait]
    impl CredentialStore for FixedStore {
        async fn check(&self, _username: &str, _password: &str) -> Result<bool, StoreError> {
            match self.result {
                Ok(found) => Ok(found),
                Err(()) => Err(StoreError::Unavailable("store down".into())),
            }
        }
    }

    fn gateway(store: FixedStore) -> Gateway {
        // The backend address is never dialed by these tests.
        Gateway::new(
            TokenAuthenticator::new("unit-test-secret", 3600),
            ClassificationConnector::new("127.0.0.1:1", TimeoutConfig::default()),
            Arc::new(store),
        )
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() {
        let gw = gateway(FixedStore { result: Ok(true) });

        let token = gw.login("alice", "wonderland").await.unwrap();
        let auth = TokenAuthenticator::new("unit-test-secret", 3600);
        assert_eq!(auth.verify(&token).unwrap().sub, "alice");
    }

    #[tokio::test]
    async fn login_rejects_unknown_credentials() {
        let gw = gateway(FixedStore { result: Ok(false) });

        assert!(matches!(
            gw.login("alice", "wrong").await,
            Err(GatewayError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn login_surfaces_store_failure_distinctly() {
        let gw = gateway(FixedStore { result: Err(()) });

        assert!(matches!(
            gw.login("alice", "wonderland").await,
            Err(GatewayError::Store(_))
        ));
    }

    #[tokio::test]
    async fn forward_without_header_is_unauthorized() {
        let gw = gateway(FixedStore { result: Ok(true) });

        let err = gw.handle_forward(None, "classify", "{}").await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Unauthorized(AuthError::MalformedToken)
        ));
    }

    #[tokio::test]
    async fn forward_with_wrong_scheme_is_unauthorized() {
        let gw = gateway(FixedStore { result: Ok(true) });

        let err = gw
            .handle_forward(Some("Basic abc"), "classify", "{}")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Unauthorized(AuthError::MalformedToken)
        ));
    }

    #[tokio::test]
    async fn forward_with_invalid_token_is_unauthorized() {
        let gw = gateway(FixedStore { result: Ok(true) });

        let err = gw
            .handle_forward(Some("Bearer garbage"), "classify", "{}")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Unauthorized(AuthError::InvalidToken)
        ));
    }
}
