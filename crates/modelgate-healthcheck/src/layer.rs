//! Layer wiring for the in-band health gate.

use std::sync::Arc;

use tower::Layer;

use crate::registry::HealthRegistry;
use crate::HealthGate;

/// A middleware layer that gates calls on a provider's health and feeds
/// call outcomes back into the registry.
///
/// The layer is bound to one provider name; place one per dispatch target.
///
/// # Examples
///
/// ```
/// use modelgate_healthcheck::{HealthGateLayer, HealthRegistry};
/// use std::sync::Arc;
///
/// let registry = Arc::new(HealthRegistry::new());
/// let layer = HealthGateLayer::new("anthropic", Arc::clone(&registry));
/// ```
#[derive(Clone)]
pub struct HealthGateLayer {
    provider: String,
    registry: Arc<HealthRegistry>,
}

impl HealthGateLayer {
    pub fn new(provider: impl Into<String>, registry: Arc<HealthRegistry>) -> Self {
        let provider = provider.into();
        registry.track(provider.clone());
        Self { provider, registry }
    }
}

impl<S> Layer<S> for HealthGateLayer {
    type Service = HealthGate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HealthGate::new(inner, self.provider.clone(), Arc::clone(&self.registry))
    }
}
