//! Layer wiring for the retry engine.

use std::sync::Arc;

use tower::Layer;

use crate::config::RetryConfig;
use crate::Retry;

/// A middleware layer that retries failed calls according to the
/// configured policy.
///
/// # Examples
///
/// ```
/// use modelgate_retry::{Backoff, RetryLayer};
/// use std::time::Duration;
///
/// let layer = RetryLayer::builder()
///     .max_retries(4)
///     .backoff(Backoff::exponential(Duration::from_millis(100)))
///     .jitter(true)
///     .name("chat")
///     .build();
/// ```
#[derive(Clone)]
pub struct RetryLayer {
    config: Arc<RetryConfig>,
}

impl RetryLayer {
    pub(crate) fn new(config: RetryConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Creates a new builder for configuring a retry layer.
    pub fn builder() -> crate::RetryConfigBuilder {
        crate::RetryConfigBuilder::new()
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = Retry<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Retry::new(inner, Arc::clone(&self.config))
    }
}
