//! Configuration for the timeout enforcer.

use std::time::Duration;

use modelgate_core::{EventListener, EventListeners};

use crate::events::TimeoutEvent;

/// Configuration for the timeout middleware.
pub struct TimeoutConfig {
    pub(crate) timeout: Duration,
    pub(crate) detach_on_timeout: bool,
    pub(crate) name: String,
    pub(crate) event_listeners: EventListeners<TimeoutEvent>,
}

impl TimeoutConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> TimeoutConfigBuilder {
        TimeoutConfigBuilder::new()
    }
}

/// Builder for [`TimeoutConfig`].
pub struct TimeoutConfigBuilder {
    timeout: Duration,
    detach_on_timeout: bool,
    name: String,
    event_listeners: EventListeners<TimeoutEvent>,
}

impl TimeoutConfigBuilder {
    /// Creates a builder with default values: a 30 second deadline and
    /// detached completion on expiry.
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            detach_on_timeout: true,
            name: String::from("<unnamed>"),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the deadline for each call. For Stream operations the same
    /// deadline also bounds the end-to-end stream lifetime.
    ///
    /// Default: 30 seconds
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Controls what happens to the in-flight call when the deadline
    /// fires: `true` lets it run to completion on a detached task,
    /// `false` drops the future (cooperative cancellation).
    ///
    /// Default: true
    pub fn detach_on_timeout(mut self, detach: bool) -> Self {
        self.detach_on_timeout = detach;
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
        L: EventListener<TimeoutEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Finalizes the configuration into a layer.
    pub fn build(self) -> crate::TimeoutLayer {
        crate::TimeoutLayer::new(TimeoutConfig {
            timeout: self.timeout,
            detach_on_timeout: self.detach_on_timeout,
            name: self.name,
            event_listeners: self.event_listeners,
        })
    }
}

impl Default for TimeoutConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
