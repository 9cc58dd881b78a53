//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by route, status
//! - `gateway_request_duration_seconds` (histogram): inbound latency
//! - `gateway_backend_round_trips_total` (counter): connector calls by outcome
//!   ("ok", "connect", "send", "receive")
//! - `gateway_backend_round_trip_duration_seconds` (histogram)
//! - `gateway_backend_healthy` (gauge): 1=healthy, 0=unhealthy

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and start the scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            tracing::info!(address = %addr, "Metrics endpoint started");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to start metrics endpoint");
            return;
        }
    }

    metrics::describe_counter!(
        "gateway_requests_total",
        "Inbound HTTP requests by route and status"
    );
    metrics::describe_histogram!(
        "gateway_request_duration_seconds",
        "Inbound HTTP request latency"
    );
    metrics::describe_counter!(
        "gateway_backend_round_trips_total",
        "Backend command exchanges by outcome"
    );
    metrics::describe_histogram!(
        "gateway_backend_round_trip_duration_seconds",
        "Backend command exchange latency"
    );
    metrics::describe_gauge!(
        "gateway_backend_healthy",
        "Backend health as observed by probes (1=healthy)"
    );
}

/// Record one inbound request.
pub fn record_request(route: &'static str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "route" => route,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "route" => route)
        .record(start.elapsed().as_secs_f64());
}

/// Record one backend round trip. `outcome` is "ok" or the connector error
/// kind.
pub fn record_round_trip(outcome: &'static str, start: Instant) {
    metrics::counter!(
        "gateway_backend_round_trips_total",
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("gateway_backend_round_trip_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record the probed backend health.
pub fn record_backend_health(healthy: bool) {
    metrics::gauge!("gateway_backend_healthy").set(if healthy { 1.0 } else { 0.0 });
}
