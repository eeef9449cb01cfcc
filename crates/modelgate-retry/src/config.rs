//! Configuration for the retry engine.

use std::sync::Arc;
use std::time::Duration;

use modelgate_core::{EventListener, EventListeners, LlmError};

use crate::adaptive::AdaptiveBackoff;
use crate::backoff::Backoff;
use crate::events::RetryEvent;

/// Decides whether a failure is worth another attempt.
pub type RetryPredicate = Arc<dyn Fn(&LlmError) -> bool + Send + Sync>;

/// Where the per-attempt delay comes from.
#[derive(Clone)]
pub(crate) enum BackoffSource {
    Static(Backoff),
    Adaptive(Arc<AdaptiveBackoff>),
}

/// Configuration for the retry middleware.
pub struct RetryConfig {
    pub(crate) max_retries: usize,
    pub(crate) backoff: BackoffSource,
    pub(crate) max_delay: Duration,
    pub(crate) jitter: bool,
    pub(crate) predicate: RetryPredicate,
    pub(crate) name: String,
    pub(crate) event_listeners: EventListeners<RetryEvent>,
}

impl RetryConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> RetryConfigBuilder {
        RetryConfigBuilder::new()
    }

    /// The delay scheduled after the given 0-indexed attempt, including
    /// jitter when enabled.
    pub(crate) fn delay_for(&self, attempt: u32) -> Duration {
        let base = match &self.backoff {
            BackoffSource::Static(backoff) => backoff.delay_for(attempt, self.max_delay),
            BackoffSource::Adaptive(adaptive) => adaptive.current_delay().min(self.max_delay),
        };
        if self.jitter {
            crate::backoff::apply_jitter(base).min(self.max_delay)
        } else {
            base
        }
    }
}

/// Builder for [`RetryConfig`].
pub struct RetryConfigBuilder {
    max_retries: usize,
    backoff: BackoffSource,
    max_delay: Duration,
    jitter: bool,
    predicate: RetryPredicate,
    name: String,
    event_listeners: EventListeners<RetryEvent>,
}

impl RetryConfigBuilder {
    /// Creates a builder with default values: 3 retries, 100ms doubling
    /// exponential backoff capped at 30s, no jitter, and the error's own
    /// retryability as the predicate.
    pub fn new() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffSource::Static(Backoff::exponential(Duration::from_millis(100))),
            max_delay: Duration::from_secs(30),
            jitter: false,
            predicate: Arc::new(LlmError::retryable),
            name: String::from("<unnamed>"),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the number of retries after the initial attempt. Downstream is
    /// invoked at most `max_retries + 1` times.
    ///
    /// Default: 3
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    /// Uses the given backoff family.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = BackoffSource::Static(backoff);
        self
    }

    /// Uses the same delay before every retry.
    pub fn fixed_backoff(mut self, delay: Duration) -> Self {
        self.backoff = BackoffSource::Static(Backoff::fixed(delay));
        self
    }

    /// Uses doubling exponential backoff from the given initial delay.
    pub fn exponential_backoff(mut self, initial: Duration) -> Self {
        self.backoff = BackoffSource::Static(Backoff::exponential(initial));
        self
    }

    /// Uses an exponential backoff with an explicit growth factor.
    pub fn exponential_backoff_with_factor(mut self, initial: Duration, factor: f64) -> Self {
        self.backoff = BackoffSource::Static(Backoff::Exponential { initial, factor });
        self
    }

    /// Uses linearly growing backoff from the given initial delay.
    pub fn linear_backoff(mut self, initial: Duration) -> Self {
        self.backoff = BackoffSource::Static(Backoff::linear(initial));
        self
    }

    /// Uses Fibonacci backoff from the given initial delay.
    pub fn fibonacci_backoff(mut self, initial: Duration) -> Self {
        self.backoff = BackoffSource::Static(Backoff::fibonacci(initial));
        self
    }

    /// Uses an outcome-driven adaptive delay shared across calls.
    pub fn adaptive_backoff(mut self, adaptive: AdaptiveBackoff) -> Self {
        self.backoff = BackoffSource::Adaptive(Arc::new(adaptive));
        self
    }

    /// Caps every scheduled delay.
    ///
    /// Default: 30 seconds
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Multiplies each delay by `1 + U[0, 0.3)`.
    ///
    /// Default: disabled
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Replaces the retry predicate.
    ///
    /// Default: the error's own retryability flag
    pub fn retry_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&LlmError) -> bool + Send + Sync + 'static,
    {
        self.predicate = Arc::new(predicate);
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
        L: EventListener<RetryEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Finalizes the configuration into a layer.
    pub fn build(self) -> crate::RetryLayer {
        crate::RetryLayer::new(RetryConfig {
            max_retries: self.max_retries,
            backoff: self.backoff,
            max_delay: self.max_delay,
            jitter: self.jitter,
            predicate: self.predicate,
            name: self.name,
            event_listeners: self.event_listeners,
        })
    }
}

impl Default for RetryConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
