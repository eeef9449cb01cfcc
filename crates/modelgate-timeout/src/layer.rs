//! Layer wiring for the timeout enforcer.

use std::sync::Arc;

use tower::Layer;

use crate::config::TimeoutConfig;
use crate::Timeout;

/// A middleware layer that enforces a deadline on every call.
///
/// # Examples
///
/// ```
/// use modelgate_timeout::TimeoutLayer;
/// use std::time::Duration;
///
/// let layer = TimeoutLayer::builder()
///     .timeout(Duration::from_secs(20))
///     .name("chat")
///     .build();
/// ```
#[derive(Clone)]
pub struct TimeoutLayer {
    config: Arc<TimeoutConfig>,
}

impl TimeoutLayer {
    pub(crate) fn new(config: TimeoutConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Creates a new builder for configuring a timeout layer.
    pub fn builder() -> crate::TimeoutConfigBuilder {
        crate::TimeoutConfigBuilder::new()
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = Timeout<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Timeout::new(inner, Arc::clone(&self.config))
    }
}
