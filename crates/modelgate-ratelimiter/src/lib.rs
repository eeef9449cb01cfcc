//! Token-bucket rate limiting for modelgate.
//!
//! Tokens accrue continuously at the configured rate up to a capacity of
//! twice the rate (a 2x burst allowance); each admitted call consumes one.
//! When no token is available the caller either joins a bounded waiter
//! queue that re-attempts as tokens refill, or fails immediately,
//! depending on the queue policy. A caller that gives up (drops the call
//! future) surrenders its queue slot at once.
//!
//! The adaptive variant watches a rolling window of call latencies and
//! nudges the rate every adjustment interval; the health-aware variant
//! additionally folds an external health signal into a multiplicative
//! factor. There is deliberately no jitter here — jitter belongs to retry
//! backoff, not admission.
//!
//! # Example
//!
//! ```
//! use modelgate_ratelimiter::RateLimiterLayer;
//!
//! let layer = RateLimiterLayer::builder()
//!     .rate(5.0)
//!     .name("chat")
//!     .build();
//! ```

mod adaptive;
mod bucket;
mod config;
mod events;
pub mod health;
mod layer;

pub use adaptive::AdaptiveConfig;
pub use bucket::{AcquireError, QueuePolicy, TokenBucket};
pub use config::{RateLimiterConfig, RateLimiterConfigBuilder};
pub use events::RateLimiterEvent;
pub use health::{composite_score, score_factor, HealthSignal, HealthSignalFn};
pub use layer::RateLimiterLayer;

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use adaptive::AdaptiveController;
use bucket::SharedBucket;
use futures::future::BoxFuture;
#[cfg(feature = "metrics")]
use metrics::counter;
use modelgate_core::{LlmError, LlmRequest, LlmResponse};
use tower::{Service, ServiceExt};

/// The rate limiter middleware service. Built by [`RateLimiterLayer`].
#[derive(Clone)]
pub struct RateLimiter<S> {
    inner: S,
    config: Arc<RateLimiterConfig>,
    bucket: SharedBucket,
    controller: Option<Arc<AdaptiveController>>,
}

impl<S> RateLimiter<S> {
    pub(crate) fn new(
        inner: S,
        config: Arc<RateLimiterConfig>,
        bucket: SharedBucket,
        controller: Option<Arc<AdaptiveController>>,
    ) -> Self {
        Self {
            inner,
            config,
            bucket,
            controller,
        }
    }
}

impl<S> Service<LlmRequest> for RateLimiter<S>
where
    S: Service<LlmRequest, Response = LlmResponse, Error = LlmError> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = LlmResponse;
    type Error = LlmError;
    type Future = BoxFuture<'static, Result<LlmResponse, LlmError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: LlmRequest) -> Self::Future {
        let config = Arc::clone(&self.config);
        let bucket = self.bucket.clone();
        let controller = self.controller.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match bucket.acquire().await {
                Ok(waited) => {
                    config.event_listeners.emit(&RateLimiterEvent::Acquired {
                        component: config.name.clone(),
                        timestamp: Instant::now(),
                        waited,
                    });
                    #[cfg(feature = "metrics")]
                    counter!("ratelimiter_acquired_total", "ratelimiter" => config.name.clone())
                        .increment(1);
                }
                Err(reason) => {
                    let (event, message) = match reason {
                        AcquireError::Exhausted => (
                            RateLimiterEvent::Rejected {
                                component: config.name.clone(),
                                timestamp: Instant::now(),
                            },
                            format!("rate limit of {}/s exceeded", bucket.bucket().rate()),
                        ),
                        AcquireError::QueueFull => (
                            RateLimiterEvent::QueueFull {
                                component: config.name.clone(),
                                timestamp: Instant::now(),
                            },
                            String::from("rate limiter queue is at capacity"),
                        ),
                    };
                    config.event_listeners.emit(&event);
                    #[cfg(feature = "metrics")]
                    counter!("ratelimiter_rejections_total", "ratelimiter" => config.name.clone())
                        .increment(1);
                    return Err(LlmError::rate_limit(message));
                }
            }

            let started = Instant::now();
            let result = inner.ready().await?.call(req).await;

            if let Some(controller) = &controller {
                if let Some((from, to)) = controller.record(started.elapsed(), bucket.bucket()) {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(ratelimiter = %config.name, from, to, "rate adjusted");
                    config.event_listeners.emit(&RateLimiterEvent::RateAdjusted {
                        component: config.name.clone(),
                        timestamp: Instant::now(),
                        from,
                        to,
                    });
                }
            }

            result
        })
    }
}
