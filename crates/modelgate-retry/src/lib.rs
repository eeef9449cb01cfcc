//! Bounded-attempt retry middleware for modelgate.
//!
//! The engine attempts the call, consults the retry predicate on failure
//! (non-retryable errors propagate immediately), and otherwise sleeps the
//! configured backoff before the next attempt. After `max_retries` retries
//! the last failure is returned verbatim — downstream is invoked at most
//! `max_retries + 1` times. Dropping the call future during a backoff
//! sleep abandons the remaining attempts.
//!
//! Stream responses are never replayed: a retry re-invokes the handler
//! that produces the sequence, it cannot resume a partially consumed one.
//!
//! # Example
//!
//! ```
//! use modelgate_retry::RetryLayer;
//! use std::time::Duration;
//!
//! let layer = RetryLayer::builder()
//!     .max_retries(3)
//!     .exponential_backoff(Duration::from_millis(100))
//!     .jitter(true)
//!     .build();
//! ```

mod adaptive;
mod backoff;
mod config;
mod events;
mod layer;

pub use adaptive::AdaptiveBackoff;
pub use backoff::{apply_jitter, Backoff};
pub use config::{RetryConfig, RetryConfigBuilder, RetryPredicate};
pub use events::RetryEvent;
pub use layer::RetryLayer;

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use config::BackoffSource;
use futures::future::BoxFuture;
#[cfg(feature = "metrics")]
use metrics::{counter, histogram};
use modelgate_core::{LlmError, LlmRequest, LlmResponse};
use tower::{Service, ServiceExt};

/// The retry middleware service. Built by [`RetryLayer`].
#[derive(Clone)]
pub struct Retry<S> {
    inner: S,
    config: Arc<RetryConfig>,
}

impl<S> Retry<S> {
    pub(crate) fn new(inner: S, config: Arc<RetryConfig>) -> Self {
        Self { inner, config }
    }
}

impl<S> Service<LlmRequest> for Retry<S>
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
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let mut attempt: usize = 0;
            loop {
                let result = inner.ready().await?.call(req.clone()).await;

                match result {
                    Ok(response) => {
                        if let BackoffSource::Adaptive(adaptive) = &config.backoff {
                            adaptive.on_success();
                        }
                        if attempt > 0 {
                            config.event_listeners.emit(&RetryEvent::Recovered {
                                component: config.name.clone(),
                                timestamp: Instant::now(),
                                attempts: attempt + 1,
                            });
                        }
                        #[cfg(feature = "metrics")]
                        {
                            counter!("retry_calls_total", "retry" => config.name.clone(), "outcome" => "success").increment(1);
                            histogram!("retry_attempts", "retry" => config.name.clone())
                                .record((attempt + 1) as f64);
                        }
                        return Ok(response);
                    }
                    Err(error) => {
                        if let BackoffSource::Adaptive(adaptive) = &config.backoff {
                            adaptive.on_failure(config.max_delay);
                        }
                        if !(config.predicate)(&error) {
                            #[cfg(feature = "metrics")]
                            counter!("retry_calls_total", "retry" => config.name.clone(), "outcome" => "non_retryable").increment(1);
                            return Err(error);
                        }
                        config.event_listeners.emit(&RetryEvent::AttemptFailed {
                            component: config.name.clone(),
                            timestamp: Instant::now(),
                            attempt,
                        });
                        if attempt >= config.max_retries {
                            config.event_listeners.emit(&RetryEvent::Exhausted {
                                component: config.name.clone(),
                                timestamp: Instant::now(),
                                attempts: attempt + 1,
                            });
                            #[cfg(feature = "metrics")]
                            counter!("retry_calls_total", "retry" => config.name.clone(), "outcome" => "exhausted").increment(1);
                            return Err(error);
                        }

                        let delay = config.delay_for(attempt as u32);
                        config.event_listeners.emit(&RetryEvent::BackingOff {
                            component: config.name.clone(),
                            timestamp: Instant::now(),
                            attempt,
                            delay,
                        });
                        #[cfg(feature = "tracing")]
                        tracing::debug!(
                            retry = %config.name,
                            attempt,
                            ?delay,
                            error = %error,
                            "backing off before next attempt"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                }
            }
        })
    }
}
