//! Events emitted by the rate limiter.

use std::time::{Duration, Instant};

use modelgate_core::GatewayEvent;

/// Events emitted by the rate limiter middleware.
#[derive(Debug, Clone)]
pub enum RateLimiterEvent {
    /// A token was acquired, possibly after queueing.
    Acquired {
        component: String,
        timestamp: Instant,
        waited: Duration,
    },
    /// The call was rejected: no token and the policy forbids waiting.
    Rejected {
        component: String,
        timestamp: Instant,
    },
    /// The call was rejected because the waiter queue is at capacity.
    QueueFull {
        component: String,
        timestamp: Instant,
    },
    /// The adaptive controller moved the refill rate.
    RateAdjusted {
        component: String,
        timestamp: Instant,
        from: f64,
        to: f64,
    },
}

impl GatewayEvent for RateLimiterEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RateLimiterEvent::Acquired { .. } => "permit_acquired",
            RateLimiterEvent::Rejected { .. } => "call_rejected",
            RateLimiterEvent::QueueFull { .. } => "queue_full",
            RateLimiterEvent::RateAdjusted { .. } => "rate_adjusted",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            RateLimiterEvent::Acquired { timestamp, .. }
            | RateLimiterEvent::Rejected { timestamp, .. }
            | RateLimiterEvent::QueueFull { timestamp, .. }
            | RateLimiterEvent::RateAdjusted { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        match self {
            RateLimiterEvent::Acquired { component, .. }
            | RateLimiterEvent::Rejected { component, .. }
            | RateLimiterEvent::QueueFull { component, .. }
            | RateLimiterEvent::RateAdjusted { component, .. } => component,
        }
    }
}
