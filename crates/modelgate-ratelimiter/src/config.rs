//! Configuration for the rate limiter.

use modelgate_core::{EventListener, EventListeners};

use crate::adaptive::AdaptiveConfig;
use crate::bucket::QueuePolicy;
use crate::events::RateLimiterEvent;

/// Configuration for the rate limiter middleware.
pub struct RateLimiterConfig {
    pub(crate) rate: f64,
    pub(crate) capacity: Option<f64>,
    pub(crate) policy: QueuePolicy,
    pub(crate) adaptive: Option<AdaptiveConfig>,
    pub(crate) name: String,
    pub(crate) event_listeners: EventListeners<RateLimiterEvent>,
}

impl RateLimiterConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RateLimiterConfigBuilder {
        RateLimiterConfigBuilder::new()
    }
}

/// Builder for [`RateLimiterConfig`].
pub struct RateLimiterConfigBuilder {
    rate: f64,
    capacity: Option<f64>,
    policy: QueuePolicy,
    adaptive: Option<AdaptiveConfig>,
    name: String,
    event_listeners: EventListeners<RateLimiterEvent>,
}

impl RateLimiterConfigBuilder {
    /// Creates a builder with default values: 10 tokens per second,
    /// capacity twice the rate, queueing enabled, no adaptation.
    pub fn new() -> Self {
        Self {
            rate: 10.0,
            capacity: None,
            policy: QueuePolicy::Wait,
            adaptive: None,
            name: String::from("<unnamed>"),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the refill rate in tokens per second.
    ///
    /// Default: 10
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    /// Overrides the bucket capacity.
    ///
    /// Default: twice the rate, allowing a 2x burst
    pub fn capacity(mut self, capacity: f64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets what happens when no token is immediately available.
    ///
    /// Default: [`QueuePolicy::Wait`]
    pub fn queue_policy(mut self, policy: QueuePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enables latency-driven (and optionally health-aware) rate
    /// adaptation.
    pub fn adaptive(mut self, adaptive: AdaptiveConfig) -> Self {
        self.adaptive = Some(adaptive);
        self
    }

    /// Names this instance for events and metrics labels.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Subscribes an event listener.
    pub fn event_listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<RateLimiterEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Finalizes the configuration into a layer.
    pub fn build(self) -> crate::RateLimiterLayer {
        crate::RateLimiterLayer::new(RateLimiterConfig {
            rate: self.rate,
            capacity: self.capacity,
            policy: self.policy,
            adaptive: self.adaptive,
            name: self.name,
            event_listeners: self.event_listeners,
        })
    }
}

impl Default for RateLimiterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
