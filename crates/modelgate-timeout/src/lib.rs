//! Deadline enforcement middleware for modelgate.
//!
//! Each call races against a configured deadline. When the deadline fires
//! first the caller gets a Timeout error; by default the in-flight call is
//! moved onto a detached task and runs to completion in the background —
//! expiry never pre-empts downstream work. Cooperative cancellation
//! (dropping the inner future on expiry) is available behind
//! [`detach_on_timeout(false)`](TimeoutConfigBuilder::detach_on_timeout).
//!
//! For the Stream operation the same deadline bounds both obtaining the
//! chunk sequence and its end-to-end lifetime: the returned stream is
//! wrapped so that expiry closes it cleanly, without an error chunk.
//!
//! # Example
//!
//! ```
//! use modelgate_timeout::TimeoutLayer;
//! use std::time::Duration;
//!
//! let layer = TimeoutLayer::builder()
//!     .timeout(Duration::from_secs(30))
//!     .build();
//! ```

mod config;
mod events;
mod layer;
mod stream;

pub use config::{TimeoutConfig, TimeoutConfigBuilder};
pub use events::TimeoutEvent;
pub use layer::TimeoutLayer;
pub use stream::DeadlineStream;

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant as StdInstant;

use futures::future::BoxFuture;
#[cfg(feature = "metrics")]
use metrics::counter;
use modelgate_core::{LlmError, LlmRequest, LlmResponse, MiddlewareError};
use tower::{Service, ServiceExt};

/// The timeout middleware service. Built by [`TimeoutLayer`].
#[derive(Clone)]
pub struct Timeout<S> {
    inner: S,
    config: Arc<TimeoutConfig>,
}

impl<S> Timeout<S> {
    pub(crate) fn new(inner: S, config: Arc<TimeoutConfig>) -> Self {
        Self { inner, config }
    }
}

impl<S> Service<LlmRequest> for Timeout<S>
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
            let op = req.kind();
            let started = StdInstant::now();
            let deadline = tokio::time::Instant::now() + config.timeout;

            let outcome = if config.detach_on_timeout {
                // The inner call survives expiry on its own task; only the
                // caller's wait is bounded.
                let handle = tokio::spawn(async move { inner.ready().await?.call(req).await });
                match tokio::time::timeout_at(deadline, handle).await {
                    Ok(Ok(result)) => Some(result),
                    Ok(Err(join_error)) => Some(Err(LlmError::from_middleware(
                        MiddlewareError::new("timeout", op, join_error),
                    ))),
                    Err(_) => None,
                }
            } else {
                let call = async move { inner.ready().await?.call(req).await };
                tokio::time::timeout_at(deadline, call).await.ok()
            };

            let result = match outcome {
                Some(result) => result,
                None => {
                    config.event_listeners.emit(&TimeoutEvent::TimedOut {
                        component: config.name.clone(),
                        timestamp: StdInstant::now(),
                        limit: config.timeout,
                    });
                    #[cfg(feature = "tracing")]
                    tracing::debug!(timeout = %config.name, limit = ?config.timeout, %op, "deadline exceeded");
                    #[cfg(feature = "metrics")]
                    counter!("timeout_expired_total", "timeout" => config.name.clone())
                        .increment(1);
                    return Err(LlmError::timeout(format!(
                        "deadline of {:?} exceeded",
                        config.timeout
                    )));
                }
            };

            config.event_listeners.emit(&TimeoutEvent::Completed {
                component: config.name.clone(),
                timestamp: StdInstant::now(),
                elapsed: started.elapsed(),
            });

            // The remaining budget also bounds a stream's lifetime.
            match result {
                Ok(LlmResponse::Stream(chunks)) => {
                    let listeners = config.event_listeners.clone();
                    let name = config.name.clone();
                    let wrapped = DeadlineStream::new(chunks, deadline).with_expire_hook(
                        Box::new(move || {
                            listeners.emit(&TimeoutEvent::StreamExpired {
                                component: name,
                                timestamp: StdInstant::now(),
                            });
                        }),
                    );
                    Ok(LlmResponse::Stream(Box::pin(wrapped)))
                }
                other => other,
            }
        })
    }
}
