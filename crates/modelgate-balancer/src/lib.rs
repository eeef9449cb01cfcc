//! Multi-provider load balancing for modelgate.
//!
//! The balancer holds an ordered list of provider entries, filters out
//! unhealthy ones (its own flag plus, when attached, the shared health
//! registry), and applies the configured [`Strategy`] to the survivors.
//! The selected provider's failure is returned to the caller as-is: there
//! is no automatic failover. Failover composes from this balancer plus the
//! retry middleware when a caller wants it.
//!
//! The balancer is itself a handler (`Service<LlmRequest>`), so it slots
//! in as the base of a middleware chain.
//!
//! # Example
//!
//! ```
//! use modelgate_balancer::{LoadBalancer, Strategy};
//! use modelgate_core::{handler_fn, LlmError};
//!
//! let balancer = LoadBalancer::builder()
//!     .strategy(Strategy::RoundRobin)
//!     .provider("a", handler_fn(|_req| async { Err(LlmError::unknown("stub")) }))
//!     .provider("b", handler_fn(|_req| async { Err(LlmError::unknown("stub")) }))
//!     .build();
//! ```

mod provider;
mod strategy;

pub use provider::ProviderEntry;
pub use strategy::Strategy;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::future::BoxFuture;
use modelgate_core::{BoxLlmService, LlmError, LlmRequest, LlmResponse};
use modelgate_healthcheck::HealthRegistry;
use provider::ActiveGuard;
use strategy::CandidateView;
use tower::{Service, ServiceExt};

/// Dispatches each call to one of several providers.
#[derive(Clone)]
pub struct LoadBalancer {
    entries: Vec<Arc<ProviderEntry>>,
    strategy: Strategy,
    counter: Arc<AtomicUsize>,
    registry: Option<Arc<HealthRegistry>>,
}

impl LoadBalancer {
    /// Creates a new builder.
    pub fn builder() -> LoadBalancerBuilder {
        LoadBalancerBuilder::new()
    }

    /// The entry for the named provider, if registered.
    pub fn entry(&self, name: &str) -> Option<&Arc<ProviderEntry>> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    /// All entries, in registration order.
    pub fn entries(&self) -> &[Arc<ProviderEntry>] {
        &self.entries
    }

    fn healthy_entries(&self) -> Vec<Arc<ProviderEntry>> {
        self.entries
            .iter()
            .filter(|entry| {
                entry.is_healthy()
                    && self
                        .registry
                        .as_ref()
                        .map(|registry| registry.is_healthy(entry.name()))
                        .unwrap_or(true)
            })
            .cloned()
            .collect()
    }
}

impl Service<LlmRequest> for LoadBalancer {
    type Response = LlmResponse;
    type Error = LlmError;
    type Future = BoxFuture<'static, Result<LlmResponse, LlmError>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: LlmRequest) -> Self::Future {
        let healthy = self.healthy_entries();
        let strategy = self.strategy;
        let counter = Arc::clone(&self.counter);

        Box::pin(async move {
            if healthy.is_empty() {
                return Err(LlmError::provider_error("no healthy providers"));
            }

            let views: Vec<CandidateView> = healthy
                .iter()
                .map(|entry| CandidateView {
                    weight: entry.weight(),
                    active: entry.active(),
                    error_rate: entry.error_rate(),
                    latency: entry.average_latency(),
                })
                .collect();
            let selected = Arc::clone(&healthy[strategy.select(&views, &counter)]);

            #[cfg(feature = "tracing")]
            tracing::trace!(provider = selected.name(), "balancer selected provider");
            #[cfg(feature = "metrics")]
            metrics::counter!("balancer_selections_total", "provider" => selected.name().to_string())
                .increment(1);

            let guard = ActiveGuard::acquire(Arc::clone(&selected));
            let started = Instant::now();
            let mut service = selected.service();
            let result = service.ready().await?.call(req).await;
            drop(guard);
            selected.record_outcome(started.elapsed(), result.is_err());
            result
        })
    }
}

/// Builder for [`LoadBalancer`].
pub struct LoadBalancerBuilder {
    entries: Vec<Arc<ProviderEntry>>,
    strategy: Strategy,
    registry: Option<Arc<HealthRegistry>>,
}

impl LoadBalancerBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            strategy: Strategy::RoundRobin,
            registry: None,
        }
    }

    /// Registers a provider handler under a name, weight 1.
    pub fn provider(self, name: impl Into<String>, service: BoxLlmService) -> Self {
        self.entry(ProviderEntry::new(name, service))
    }

    /// Registers a fully configured entry.
    pub fn entry(mut self, entry: ProviderEntry) -> Self {
        self.entries.push(Arc::new(entry));
        self
    }

    /// Sets the selection strategy.
    ///
    /// Default: [`Strategy::RoundRobin`]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Attaches a health registry; providers it reports unhealthy are
    /// excluded from selection alongside manually flagged ones.
    pub fn health_registry(mut self, registry: Arc<HealthRegistry>) -> Self {
        for entry in &self.entries {
            registry.track(entry.name());
        }
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> LoadBalancer {
        if let Some(registry) = &self.registry {
            for entry in &self.entries {
                registry.track(entry.name());
            }
        }
        LoadBalancer {
            entries: self.entries,
            strategy: self.strategy,
            counter: Arc::new(AtomicUsize::new(0)),
            registry: self.registry,
        }
    }
}

impl Default for LoadBalancerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
