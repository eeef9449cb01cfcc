//! Events emitted on health transitions.

use std::time::Instant;

use modelgate_core::GatewayEvent;

/// Events emitted by the health registry and prober.
#[derive(Debug, Clone)]
pub enum HealthEvent {
    /// A provider recovered.
    BecameHealthy {
        provider: String,
        timestamp: Instant,
    },
    /// A provider crossed the failure threshold.
    BecameUnhealthy {
        provider: String,
        timestamp: Instant,
        error: String,
    },
    /// A single failure was recorded, by probe or in-band call; the
    /// provider may still be below the threshold and healthy.
    ProbeFailed {
        provider: String,
        timestamp: Instant,
        error: String,
    },
}

impl GatewayEvent for HealthEvent {
    fn event_type(&self) -> &'static str {
        match self {
            HealthEvent::BecameHealthy { .. } => "became_healthy",
            HealthEvent::BecameUnhealthy { .. } => "became_unhealthy",
            HealthEvent::ProbeFailed { .. } => "probe_failed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            HealthEvent::BecameHealthy { timestamp, .. }
            | HealthEvent::BecameUnhealthy { timestamp, .. }
            | HealthEvent::ProbeFailed { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        match self {
            HealthEvent::BecameHealthy { provider, .. }
            | HealthEvent::BecameUnhealthy { provider, .. }
            | HealthEvent::ProbeFailed { provider, .. } => provider,
        }
    }
}
