//! Events emitted by the cache middleware.

use std::time::Instant;

use modelgate_core::GatewayEvent;

/// Events emitted by the cache middleware.
#[derive(Debug, Clone)]
pub enum CacheEvent {
    /// A request was served from the store without calling downstream.
    Hit {
        component: String,
        timestamp: Instant,
        key: String,
    },
    /// No live entry existed; downstream was invoked.
    Miss {
        component: String,
        timestamp: Instant,
        key: String,
    },
    /// A successful response was stored.
    Stored {
        component: String,
        timestamp: Instant,
        key: String,
    },
    /// An entry was evicted to make room.
    Evicted {
        component: String,
        timestamp: Instant,
        key: String,
    },
    /// Key generation declined or failed; the call bypassed the cache.
    Bypassed {
        component: String,
        timestamp: Instant,
    },
}

impl GatewayEvent for CacheEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CacheEvent::Hit { .. } => "cache_hit",
            CacheEvent::Miss { .. } => "cache_miss",
            CacheEvent::Stored { .. } => "cache_stored",
            CacheEvent::Evicted { .. } => "cache_evicted",
            CacheEvent::Bypassed { .. } => "cache_bypassed",
        }
    }

    fn timestamp(&self) -> Instant {
        match self {
            CacheEvent::Hit { timestamp, .. }
            | CacheEvent::Miss { timestamp, .. }
            | CacheEvent::Stored { timestamp, .. }
            | CacheEvent::Evicted { timestamp, .. }
            | CacheEvent::Bypassed { timestamp, .. } => *timestamp,
        }
    }

    fn component(&self) -> &str {
        match self {
            CacheEvent::Hit { component, .. }
            | CacheEvent::Miss { component, .. }
            | CacheEvent::Stored { component, .. }
            | CacheEvent::Evicted { component, .. }
            | CacheEvent::Bypassed { component, .. } => component,
        }
    }
}
