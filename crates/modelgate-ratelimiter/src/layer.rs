//! Layer wiring for the rate limiter.

use std::sync::Arc;

use tower::Layer;

use crate::adaptive::AdaptiveController;
use crate::bucket::SharedBucket;
use crate::config::RateLimiterConfig;
use crate::RateLimiter;

/// A middleware layer that applies token-bucket admission to an inner
/// service. The bucket and its waiter queue are shared by every service
/// the layer wraps.
///
/// # Examples
///
/// ```
/// use modelgate_ratelimiter::{AdaptiveConfig, RateLimiterLayer};
/// use std::time::Duration;
///
/// let layer = RateLimiterLayer::builder()
///     .rate(5.0)
///     .adaptive(AdaptiveConfig::new(Duration::from_secs(1), 1.0, 50.0))
///     .name("openai")
///     .build();
/// ```
#[derive(Clone)]
pub struct RateLimiterLayer {
    config: Arc<RateLimiterConfig>,
    bucket: SharedBucket,
    controller: Option<Arc<AdaptiveController>>,
}

impl RateLimiterLayer {
    pub(crate) fn new(mut config: RateLimiterConfig) -> Self {
        let capacity = config.capacity.unwrap_or(config.rate * 2.0).max(1.0);
        let bucket = SharedBucket::new(config.rate, capacity, config.policy);
        let controller = config
            .adaptive
            .take()
            .map(|adaptive| Arc::new(AdaptiveController::new(adaptive)));
        Self {
            config: Arc::new(config),
            bucket,
            controller,
        }
    }

    /// Creates a new builder for configuring a rate limiter layer.
    pub fn builder() -> crate::RateLimiterConfigBuilder {
        crate::RateLimiterConfigBuilder::new()
    }

    /// Current refill rate in tokens per second.
    pub fn rate(&self) -> f64 {
        self.bucket.bucket().rate()
    }

    /// Current token level.
    pub fn available(&self) -> f64 {
        self.bucket.bucket().available()
    }
}

impl<S> Layer<S> for RateLimiterLayer {
    type Service = RateLimiter<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimiter::new(
            inner,
            Arc::clone(&self.config),
            self.bucket.clone(),
            self.controller.clone(),
        )
    }
}
