//! Configuration for the circuit breaker.

use std::time::Duration;

use modelgate_core::{EventListener, EventListeners};

use crate::events::BreakerEvent;

/// Configuration for the circuit breaker middleware.
pub struct BreakerConfig {
    pub(crate) failure_threshold: u32,
    pub(crate) success_threshold: Option<u32>,
    pub(crate) open_timeout: Duration,
    pub(crate) half_open_max_probes: u32,
    pub(crate) reset_timer_on_half_open_failure: bool,
    pub(crate) name: String,
    pub(crate) event_listeners: EventListeners<BreakerEvent>,
}

impl BreakerConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> BreakerConfigBuilder {
        BreakerConfigBuilder::new()
    }

    /// Probe successes required to close a half-open circuit. Defaults to
    /// half the failure threshold, at least one.
    pub(crate) fn success_threshold(&self) -> u32 {
        self.success_threshold
            .unwrap_or_else(|| (self.failure_threshold / 2).max(1))
    }
}

/// Builder for [`BreakerConfig`].
pub struct BreakerConfigBuilder {
    failure_threshold: u32,
    success_threshold: Option<u32>,
    open_timeout: Duration,
    half_open_max_probes: u32,
    reset_timer_on_half_open_failure: bool,
    name: String,
    event_listeners: EventListeners<BreakerEvent>,
}

impl BreakerConfigBuilder {
    /// Creates a builder with default values.
    pub fn new() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: None,
            open_timeout: Duration::from_secs(30),
            half_open_max_probes: 3,
            reset_timer_on_half_open_failure: true,
            name: String::from("<unnamed>"),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the number of consecutive failures that opens the circuit.
    ///
    /// Default: 5
    pub fn failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// Sets the number of probe successes that closes a half-open circuit.
    ///
    /// Default: half the failure threshold, at least one
    pub fn success_threshold(mut self, threshold: u32) -> Self {
        self.success_threshold = Some(threshold.max(1));
        self
    }

    /// Sets how long the circuit stays open before admitting a probe.
    ///
    /// Default: 30 seconds
    pub fn open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    /// Sets the number of probes admitted concurrently while half-open.
    ///
    /// Default: 3
    pub fn half_open_max_probes(mut self, probes: u32) -> Self {
        self.half_open_max_probes = probes.max(1);
        self
    }

    /// Controls whether a half-open probe failure restarts the open
    /// timeout from now (`true`) or preserves the original opening
    /// instant (`false`).
    ///
    /// Default: true
    pub fn reset_timer_on_half_open_failure(mut self, reset: bool) -> Self {
        self.reset_timer_on_half_open_failure = reset;
        self
    }

    /// Names this instance for events, logs and metrics labels.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Subscribes an event listener.
    pub fn event_listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<BreakerEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Finalizes the configuration into a layer.
    pub fn build(self) -> crate::BreakerLayer {
        crate::BreakerLayer::new(BreakerConfig {
            failure_threshold: self.failure_threshold,
            success_threshold: self.success_threshold,
            open_timeout: self.open_timeout,
            half_open_max_probes: self.half_open_max_probes,
            reset_timer_on_half_open_failure: self.reset_timer_on_half_open_failure,
            name: self.name,
            event_listeners: self.event_listeners,
        })
    }
}

impl Default for BreakerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) fn test_config(failure_threshold: u32, open_timeout: Duration) -> BreakerConfig {
    BreakerConfig {
        failure_threshold,
        success_threshold: None,
        open_timeout,
        half_open_max_probes: 3,
        reset_timer_on_half_open_failure: true,
        name: String::from("test"),
        event_listeners: EventListeners::new(),
    }
}
