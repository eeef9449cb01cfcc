//! Events emitted by the retry engine.

use std::time::{Duration, Instant};

use modelgate_core::GatewayEvent;

/// Events emitted by the retry middleware.
#[derive(Debug, Clone)]
pub enum RetryEvent {
    /// An attempt failed with a retryable error.
    AttemptFailed {
        component: String,
        timestamp: Instant,
        attempt: usize,
    },
    /// A backoff wait was scheduled before the next attempt.
    BackingOff {
        component: String,
        timestamp: Instant,
        attempt: usize,
        delay: Duration,
    },
    /// Every attempt failed; the last error was returned.
    Exhausted {
        component: String,
        timestamp: Instant,
        attempts: usize,
    },
    /// A retry succeeded after at least one failure.
    Recovered {
        component: String,
        timestamp: Instant,
        attempts: usize,
    },
}

impl GatewayEvent for RetryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RetryEvent::AttemptFailed { .. } => "attempt_failed",
            RetryEvent::BackingOff { .. } => "backing_off",
            RetryEvent::Exhausted { .. } => "retries_exhausted",
            RetryEvent::Recovered { .. } => "recovered",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RetryEvent::AttemptFailed { timestamp, .. }
            | RetryEvent::BackingOff { timestamp, .. }
            | RetryEvent::Exhausted { timestamp, .. }
            | RetryEvent::Recovered { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        match self {
            RetryEvent::AttemptFailed { component, .. }
            | RetryEvent::BackingOff { component, .. }
            | RetryEvent::Exhausted { component, .. }
            | RetryEvent::Recovered { component, .. } => component,
        }
    }
}
