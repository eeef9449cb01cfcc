//! Layer wiring for the circuit breaker.

use std::sync::Arc;

use tower::Layer;

use crate::circuit::SharedCircuit;
use crate::config::BreakerConfig;
use crate::CircuitBreaker;

/// A middleware layer that applies circuit breaking to an inner service.
///
/// The breaker state is created per layer and shared by every service the
/// layer wraps: all calls through one layer gate on the same circuit.
/// Protecting backends individually means one layer per backend.
///
/// # Examples
///
/// ```
/// use modelgate_circuitbreaker::BreakerLayer;
/// use std::time::Duration;
///
/// let layer = BreakerLayer::builder()
///     .failure_threshold(3)
///     .open_timeout(Duration::from_secs(30))
///     .name("anthropic")
///     .build();
/// ```
#[derive(Clone)]
pub struct BreakerLayer {
    config: Arc<BreakerConfig>,
    circuit: SharedCircuit,
}

impl BreakerLayer {
    pub(crate) fn new(config: BreakerConfig) -> Self {
        Self {
            config: Arc::new(config),
            circuit: SharedCircuit::new(),
        }
    }

    /// Creates a new builder for configuring a circuit breaker layer.
    pub fn builder() -> crate::BreakerConfigBuilder {
        crate::BreakerConfigBuilder::new()
    }

    /// Lock-free view of the shared circuit state.
    pub fn state(&self) -> crate::CircuitState {
        self.circuit.state()
    }
}

impl<S> Layer<S> for BreakerLayer {
    type Service = CircuitBreaker<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CircuitBreaker::new(inner, Arc::clone(&self.config), self.circuit.clone())
    }
}
