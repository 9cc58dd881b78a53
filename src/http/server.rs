//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, body limit, request ID)
//! - Bind server to listener and serve with graceful shutdown
//! - Spawn the backend health monitor

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::TokenAuthenticator;
use crate::config::{GatewayConfig, HealthCheckConfig};
use crate::connector::ClassificationConnector;
use crate::gateway::Gateway;
use crate::health::{BackendHealth, HealthMonitor};
use crate::http::handlers;
use crate::store::CredentialStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub backend_health: Arc<BackendHealth>,
    pub health_config: HealthCheckConfig,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    backend_health: Arc<BackendHealth>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and credential
    /// store.
    pub fn new(config: GatewayConfig, store: Arc<dyn CredentialStore>) -> Self {
        let authenticator =
            TokenAuthenticator::new(&config.auth.token_secret, config.auth.token_ttl_secs);
        let connector =
            ClassificationConnector::new(config.backend.address.clone(), config.timeouts.clone());
        let gateway = Arc::new(Gateway::new(authenticator, connector, store));
        let backend_health = Arc::new(BackendHealth::new());

        let state = AppState {
            gateway,
            backend_health: backend_health.clone(),
            health_config: config.health_check.clone(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            backend_health,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/authenticate", post(handlers::authenticate))
            .route("/request-payload", post(handlers::request_payload))
            .route("/healthz", get(handlers::healthz))
            .with_state(state)
            .layer(TimeoutLayer::new(config.timeouts.request()))
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        if self.config.health_check.enabled {
            let monitor = HealthMonitor::new(
                self.config.backend.address.clone(),
                self.backend_health.clone(),
                self.config.health_check.clone(),
            );
            let monitor_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                monitor.run(monitor_shutdown).await;
            });
        }

        let app = self.router.into_make_service();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown requested, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}
