//! Three-state circuit breaker middleware for modelgate.
//!
//! The breaker counts consecutive failures while closed; at the configured
//! threshold it opens and rejects every call immediately with a
//! non-retryable Provider error. After the open timeout it admits a bounded
//! number of concurrent probes; enough probe successes close the circuit,
//! any probe failure re-opens it.
//!
//! The breaker gates entry only: a call already in flight is never
//! cancelled, and its late outcome is still recorded safely.
//!
//! # Example
//!
//! ```
//! use modelgate_circuitbreaker::BreakerLayer;
//! use std::time::Duration;
//!
//! let layer = BreakerLayer::builder()
//!     .failure_threshold(5)
//!     .open_timeout(Duration::from_secs(30))
//!     .half_open_max_probes(3)
//!     .build();
//! ```

mod circuit;
mod config;
mod events;
mod layer;

pub use circuit::CircuitState;
pub use config::{BreakerConfig, BreakerConfigBuilder};
pub use events::BreakerEvent;
pub use layer::BreakerLayer;

use std::sync::Arc;
use std::task::{Context, Poll};

use circuit::{Admission, SharedCircuit};
use futures::future::BoxFuture;
use modelgate_core::{LlmError, LlmRequest, LlmResponse};
use tower::{Service, ServiceExt};

/// The circuit breaker middleware service. Built by [`BreakerLayer`].
#[derive(Clone)]
pub struct CircuitBreaker<S> {
    inner: S,
    config: Arc<BreakerConfig>,
    circuit: SharedCircuit,
}

impl<S> CircuitBreaker<S> {
    pub(crate) fn new(inner: S, config: Arc<BreakerConfig>, circuit: SharedCircuit) -> Self {
        Self {
            inner,
            config,
            circuit,
        }
    }

    /// Lock-free view of the circuit state.
    pub fn state(&self) -> CircuitState {
        self.circuit.state()
    }
}

/// Releases a probe slot if the call future is dropped before its outcome
/// is recorded.
struct ProbeSlot {
    circuit: SharedCircuit,
    armed: bool,
}

impl ProbeSlot {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for ProbeSlot {
    fn drop(&mut self) {
        if self.armed {
            self.circuit.abandon_probe();
        }
    }
}

impl<S> Service<LlmRequest> for CircuitBreaker<S>
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
        let circuit = self.circuit.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let admission = circuit.try_acquire(&config);
            let probe = match admission {
                Admission::Rejected => {
                    return Err(LlmError::provider_error(format!(
                        "circuit breaker '{}' is open",
                        config.name
                    )))
                }
                Admission::Probe => true,
                Admission::Allowed => false,
            };

            let mut slot = ProbeSlot {
                circuit: circuit.clone(),
                armed: probe,
            };

            let result = inner.ready().await?.call(req).await;
            slot.disarm();
            match &result {
                Ok(_) => circuit.record_success(probe, &config),
                Err(_) => circuit.record_failure(probe, &config),
            }
            result
        })
    }
}
