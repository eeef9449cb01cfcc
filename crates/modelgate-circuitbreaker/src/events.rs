//! Events emitted by the circuit breaker.

use std::time::Instant;

use modelgate_core::GatewayEvent;

use crate::circuit::CircuitState;

/// Events emitted by the circuit breaker middleware.
#[derive(Debug, Clone)]
pub enum BreakerEvent {
    /// The breaker moved between states.
    Transition {
        component: String,
        timestamp: Instant,
        from: CircuitState,
        to: CircuitState,
    },
    /// A call was rejected without reaching downstream.
    Rejected {
        component: String,
        timestamp: Instant,
    },
    /// A probe was admitted through a half-open circuit.
    ProbeAdmitted {
        component: String,
        timestamp: Instant,
    },
    /// A success was recorded.
    SuccessRecorded {
        component: String,
        timestamp: Instant,
        state: CircuitState,
    },
    /// A failure was recorded.
    FailureRecorded {
        component: String,
        timestamp: Instant,
        state: CircuitState,
    },
}

impl GatewayEvent for BreakerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            BreakerEvent::Transition { .. } => "state_transition",
            BreakerEvent::Rejected { .. } => "call_rejected",
            BreakerEvent::ProbeAdmitted { .. } => "probe_admitted",
            BreakerEvent::SuccessRecorded { .. } => "success_recorded",
            BreakerEvent::FailureRecorded { .. } => "failure_recorded",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            BreakerEvent::Transition { timestamp, .. }
            | BreakerEvent::Rejected { timestamp, .. }
            | BreakerEvent::ProbeAdmitted { timestamp, .. }
            | BreakerEvent::SuccessRecorded { timestamp, .. }
            | BreakerEvent::FailureRecorded { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        match self {
            BreakerEvent::Transition { component, .. }
            | BreakerEvent::Rejected { component, .. }
            | BreakerEvent::ProbeAdmitted { component, .. }
            | BreakerEvent::SuccessRecorded { component, .. }
            | BreakerEvent::FailureRecorded { component, .. } => component,
        }
    }
}
