//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe the backend with its `CheckHealth` command
//! - Update shared health state based on results

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::config::{HealthCheckConfig, TimeoutConfig};
use crate::connector::ClassificationConnector;
use crate::health::state::BackendHealth;
use crate::observability::metrics;

/// Command the classificator answers without touching its analysis state.
const PROBE_COMMAND: &str = "CheckHealth";

/// The reply it gives when ready.
const READY_RESPONSE: &str = "{Ready}";

pub struct HealthMonitor {
    connector: ClassificationConnector,
    health: Arc<BackendHealth>,
    config: HealthCheckConfig,
}

impl HealthMonitor {
    pub fn new(
        backend_address: impl Into<String>,
        health: Arc<BackendHealth>,
        config: HealthCheckConfig,
    ) -> Self {
        // Probes get the probe timeout at every blocking point.
        let timeouts = TimeoutConfig {
            connect_secs: config.timeout_secs,
            write_secs: config.timeout_secs,
            read_secs: config.timeout_secs,
            request_secs: config.timeout_secs,
        };

        Self {
            connector: ClassificationConnector::new(backend_address, timeouts),
            health,
            config,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Active health checks disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            backend = %self.connector.address(),
            "Health monitor starting"
        );

        let interval = Duration::from_secs(self.config.interval_secs);
        let mut ticker = time::interval(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.probe().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn probe(&self) {
        match self.connector.apply_command(PROBE_COMMAND, "").await {
            Ok(reply) if reply == READY_RESPONSE => {
                self.health.mark_success(self.config.healthy_threshold);
            }
            Ok(reply) => {
                tracing::warn!(reply = %reply, "Health probe got unexpected reply");
                self.health.mark_failure(self.config.unhealthy_threshold);
            }
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "Health probe failed");
                self.health.mark_failure(self.config.unhealthy_threshold);
            }
        }

        metrics::record_backend_health(self.health.is_healthy());
    }
}
