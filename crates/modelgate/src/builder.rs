//! Gateway construction.

use std::collections::HashMap;
use std::sync::Arc;

use modelgate_balancer::{LoadBalancer, ProviderEntry, Strategy};
use modelgate_core::{BoxLlmService, Chain, LlmError, LlmRequest, LlmResponse};
use modelgate_healthcheck::{HealthGateLayer, HealthRegistry};
use modelgate_metrics::{MetricsLayer, MetricsRegistry};
use tower::util::BoxCloneSyncService;
use tower::{Layer, Service};

use crate::gateway::Gateway;
use crate::provider::{provider_service, Provider};

/// Builds a [`Gateway`].
///
/// Middleware registration is declarative and ordered: the first layer
/// added is the outermost. Health gating and metrics, when enabled, sit
/// innermost (right around each backend) so they observe the call the
/// backend actually sees. After [`build`](GatewayBuilder::build) the
/// composition is immutable.
pub struct GatewayBuilder {
    providers: Vec<Arc<dyn Provider>>,
    default_provider: Option<String>,
    chain: Chain,
    balance: Option<Strategy>,
    weights: HashMap<String, u32>,
    health: Option<Arc<HealthRegistry>>,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl GatewayBuilder {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            default_provider: None,
            chain: Chain::new(),
            balance: None,
            weights: HashMap::new(),
            health: None,
            metrics: None,
        }
    }

    /// Registers a backend. The first registered backend is the default
    /// dispatch target unless overridden or balancing is enabled.
    pub fn provider(mut self, provider: impl Provider + 'static) -> Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Registers an already shared backend.
    pub fn shared_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Names the default dispatch target.
    pub fn default_provider(mut self, name: impl Into<String>) -> Self {
        self.default_provider = Some(name.into());
        self
    }

    /// Appends a middleware to the chain. First added is outermost.
    pub fn layer<L>(mut self, layer: L) -> Self
    where
        L: Layer<BoxLlmService> + Send + Sync + 'static,
        L::Service: Service<LlmRequest, Response = LlmResponse, Error = LlmError>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<LlmRequest>>::Future: Send + 'static,
    {
        self.chain = self.chain.with(layer);
        self
    }

    /// Dispatches unnamed calls through a load balancer over every
    /// registered provider, using the given strategy.
    pub fn balanced(mut self, strategy: Strategy) -> Self {
        self.balance = Some(strategy);
        self
    }

    /// Sets the balancer weight of one provider (weighted round-robin).
    pub fn weight(mut self, provider: impl Into<String>, weight: u32) -> Self {
        self.weights.insert(provider.into(), weight);
        self
    }

    /// Gates every backend on the shared health registry and reports call
    /// outcomes into it.
    pub fn health_registry(mut self, registry: Arc<HealthRegistry>) -> Self {
        self.health = Some(registry);
        self
    }

    /// Records per-call metrics into the shared registry, labeled by
    /// provider, model and method.
    pub fn metrics(mut self, registry: Arc<MetricsRegistry>) -> Self {
        self.metrics = Some(registry);
        self
    }

    /// Wraps a backend with the innermost per-target middleware.
    fn target_service(&self, provider: &Arc<dyn Provider>) -> BoxLlmService {
        let name = provider.name().to_string();
        let mut service = provider_service(Arc::clone(provider));
        if let Some(registry) = &self.health {
            let gate = HealthGateLayer::new(name.clone(), Arc::clone(registry));
            service = BoxCloneSyncService::new(gate.layer(service));
        }
        if let Some(registry) = &self.metrics {
            let layer = MetricsLayer::new(Arc::clone(registry)).provider(name);
            service = BoxCloneSyncService::new(layer.layer(service));
        }
        service
    }

    /// Applies the chain to every dispatch target and freezes the result.
    pub fn build(self) -> Gateway {
        let mut targets = HashMap::new();
        let mut providers = HashMap::new();
        for provider in &self.providers {
            let name = provider.name().to_string();
            let service = self.chain.apply(self.target_service(provider));
            targets.insert(name.clone(), service);
            providers.insert(name, Arc::clone(provider));
        }

        let balanced = self.balance.map(|strategy| {
            let mut builder = LoadBalancer::builder().strategy(strategy);
            for provider in &self.providers {
                let weight = self
                    .weights
                    .get(provider.name())
                    .copied()
                    .unwrap_or(1);
                let entry = ProviderEntry::new(provider.name(), self.target_service(provider))
                    .with_weight(weight);
                builder = builder.entry(entry);
            }
            if let Some(registry) = &self.health {
                builder = builder.health_registry(Arc::clone(registry));
            }
            self.chain.apply(BoxCloneSyncService::new(builder.build()))
        });

        let default_target = self
            .default_provider
            .or_else(|| self.providers.first().map(|p| p.name().to_string()));

        Gateway::new(targets, providers, default_target, balanced)
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
