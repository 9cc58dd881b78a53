//! Backend health state machine.
//!
//! # Responsibilities
//! - Track the backend's observed health (Unknown → Healthy ↔ Unhealthy)
//! - Require consecutive successes/failures to transition, to prevent
//!   flapping
//!
//! Health state is observational: it feeds /healthz, logs, and metrics.
//! Forwarding always dials the backend regardless of this state.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Observed health of the classification backend.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

impl HealthState {
    /// Lowercase label for responses and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Unknown => "unknown",
            HealthState::Healthy => "healthy",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

/// Shared, lock-free health state for the single configured backend.
#[derive(Debug, Default)]
pub struct BackendHealth {
    state: AtomicU8,
    consecutive_failures: AtomicU32,
    consecutive_successes: AtomicU32,
}

impl BackendHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> HealthState {
        HealthState::from(self.state.load(Ordering::Relaxed))
    }

    /// Return true unless the backend has been marked unhealthy.
    pub fn is_healthy(&self) -> bool {
        self.state.load(Ordering::Relaxed) != HealthState::Unhealthy as u8
    }

    /// Report a successful probe or round trip.
    pub fn mark_success(&self, healthy_threshold: u32) {
        self.consecutive_failures.store(0, Ordering::Relaxed);

        if self.state.load(Ordering::Relaxed) == HealthState::Healthy as u8 {
            return;
        }

        let successes = self.consecutive_successes.fetch_add(1, Ordering::Relaxed) + 1;
        if successes >= healthy_threshold {
            self.state.store(HealthState::Healthy as u8, Ordering::Relaxed);
            tracing::info!("Backend marked healthy");
        }
    }

    /// Report a failed probe or round trip.
    pub fn mark_failure(&self, unhealthy_threshold: u32) {
        self.consecutive_successes.store(0, Ordering::Relaxed);

        if self.state.load(Ordering::Relaxed) == HealthState::Unhealthy as u8 {
            return;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= unhealthy_threshold {
            self.state.store(HealthState::Unhealthy as u8, Ordering::Relaxed);
            tracing::warn!("Backend marked unhealthy");
        }
    }
}
