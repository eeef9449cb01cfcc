//! Events emitted by the timeout enforcer.

use std::time::{Duration, Instant};

use modelgate_core::GatewayEvent;

/// Events emitted by the timeout middleware.
#[derive(Debug, Clone)]
pub enum TimeoutEvent {
    /// The call completed inside the deadline.
    Completed {
        component: String,
        timestamp: Instant,
        elapsed: Duration,
    },
    /// The deadline fired before the call completed.
    TimedOut {
        component: String,
        timestamp: Instant,
        limit: Duration,
    },
    /// A chunk stream was closed by its deadline.
    StreamExpired {
        component: String,
        timestamp: Instant,
    },
}

impl GatewayEvent for TimeoutEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TimeoutEvent::Completed { .. } => "completed",
            TimeoutEvent::TimedOut { .. } => "timed_out",
            TimeoutEvent::StreamExpired { .. } => "stream_expired",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            TimeoutEvent::Completed { timestamp, .. }
            | TimeoutEvent::TimedOut { timestamp, .. }
            | TimeoutEvent::StreamExpired { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        match self {
            TimeoutEvent::Completed { component, .. }
            | TimeoutEvent::TimedOut { component, .. }
            | TimeoutEvent::StreamExpired { component, .. } => component,
        }
    }
}
