//! Provider health tracking for modelgate.
//!
//! Three pieces share one [`HealthRegistry`]:
//!
//! - the registry itself holds a [`HealthRecord`] per provider, flipping
//!   it unhealthy after a run of consecutive failures (default 3) and
//!   healthy again on the first success;
//! - [`HealthChecker`] samples liveness out-of-band, running a
//!   caller-supplied [`HealthProbe`] against every tracked provider on an
//!   interval, each probe bounded by a 10 second timeout;
//! - [`HealthGateLayer`] gates calls in-band, rejecting while the
//!   provider is unhealthy and reporting every call outcome.
//!
//! The load balancer consults the same registry when excluding providers
//! from selection.

mod checker;
mod events;
mod layer;
mod registry;

pub use checker::{HealthChecker, HealthProbe};
pub use events::HealthEvent;
pub use layer::HealthGateLayer;
pub use registry::{HealthRecord, HealthRegistry};

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::future::BoxFuture;
use modelgate_core::{LlmError, LlmRequest, LlmResponse};
use tower::{Service, ServiceExt};

/// The in-band health gate service. Built by [`HealthGateLayer`].
#[derive(Clone)]
pub struct HealthGate<S> {
    inner: S,
    provider: String,
    registry: Arc<HealthRegistry>,
}

impl<S> HealthGate<S> {
    pub(crate) fn new(inner: S, provider: String, registry: Arc<HealthRegistry>) -> Self {
        Self {
            inner,
            provider,
            registry,
        }
    }
}

impl<S> Service<LlmRequest> for HealthGate<S>
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
        let provider = self.provider.clone();
        let registry = Arc::clone(&self.registry);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !registry.is_healthy(&provider) {
                return Err(LlmError::provider_error(format!(
                    "provider '{provider}' is unhealthy"
                ))
                .with_provider(provider));
            }

            let started = Instant::now();
            let result = inner.ready().await?.call(req).await;
            match &result {
                Ok(_) => registry.report_success(&provider, started.elapsed()),
                Err(error) => registry.report_failure(&provider, error.message()),
            }
            result
        })
    }
}
