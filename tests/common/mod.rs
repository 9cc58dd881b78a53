//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use payload_gateway::config::GatewayConfig;
use payload_gateway::lifecycle::Shutdown;
use payload_gateway::store::{password_digest, CredentialStore, StoreError};
use payload_gateway::HttpServer;

/// Handle to a running mock classificator.
pub struct BackendHandle {
    connections: Arc<AtomicUsize>,
}

impl BackendHandle {
    /// Number of TCP connections the backend has accepted so far.
    #[allow(dead_code)]
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }
}

/// Start a mock classificator speaking the backend's plaintext protocol:
/// one read per connection, then the reply produced by `respond`.
///
/// `respond` gets the raw received bytes as a string; returning `None`
/// closes the connection without replying.
pub async fn start_classificator<F, Fut>(respond: F) -> (SocketAddr, BackendHandle)
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<String>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicUsize::new(0));
    let conns = connections.clone();
    let respond = Arc::new(respond);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    conns.fetch_add(1, Ordering::SeqCst);
                    let respond = respond.clone();
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 32 * 1024];
                        let n = match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => n,
                        };
                        let request = String::from_utf8_lossy(&buf[..n]).to_string();
                        match respond(request).await {
                            Some(reply) => {
                                let _ = socket.write_all(reply.as_bytes()).await;
                                let _ = socket.shutdown().await;
                            }
                            None => {
                                let _ = socket.shutdown().await;
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, BackendHandle { connections })
}

/// In-memory credential store seeded with known users.
#[allow(dead_code)]
pub struct MemoryCredentialStore {
    users: HashMap<String, String>,
}

#[allow(dead_code)]
impl MemoryCredentialStore {
    pub fn with_user(username: &str, password: &str) -> Self {
        let mut users = HashMap::new();
        users.insert(username.to_string(), password_digest(password));
        Self { users }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn check(&self, username: &str, password: &str) -> Result<bool, StoreError> {
        Ok(self
            .users
            .get(username)
            .is_some_and(|digest| *digest == password_digest(password)))
    }
}

/// Credential store that always fails, for store-outage tests.
#[allow(dead_code)]
pub struct FailingCredentialStore;

#[async_trait]
impl CredentialStore for FailingCredentialStore {
    async fn check(&self, _username: &str, _password: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable("injected outage".into()))
    }
}

/// Config pointing at the given mock backend, with short timeouts and the
/// health probe disabled.
#[allow(dead_code)]
pub fn test_config(backend: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.backend.address = backend.to_string();
    config.auth.token_secret = "integration-test-secret".into();
    config.timeouts.connect_secs = 1;
    config.timeouts.write_secs = 1;
    config.timeouts.read_secs = 2;
    config.timeouts.request_secs = 10;
    config.health_check.enabled = false;
    config.observability.metrics_enabled = false;
    config
}

/// Start the gateway on an ephemeral port. The returned `Shutdown` stops it.
#[allow(dead_code)]
pub async fn start_gateway(
    config: GatewayConfig,
    store: Arc<dyn CredentialStore>,
) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, store);

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}
