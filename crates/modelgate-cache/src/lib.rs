//! Response memoization middleware for modelgate.
//!
//! The cache middleware fingerprints each request (SHA-256 over its stable
//! JSON form, unless a custom key generator is supplied), serves live
//! entries without calling downstream, and stores successful responses for
//! the configured TTL. Failures are never cached, and neither are streams:
//! a lazy chunk sequence has no cloneable payload, so the default
//! cacheability predicate skips Stream requests entirely.
//!
//! Key-generation failure disables caching for that single call but never
//! fails it.
//!
//! # Example
//!
//! ```
//! use modelgate_cache::{CacheLayer, EvictionPolicy};
//! use std::time::Duration;
//!
//! let layer = CacheLayer::builder()
//!     .capacity(100)
//!     .ttl(Duration::from_secs(600))
//!     .eviction(EvictionPolicy::Lru)
//!     .name("completions")
//!     .build();
//! ```

mod config;
mod events;
pub mod key;
mod layer;
mod store;

pub use config::{CacheConfig, CacheConfigBuilder, CachePredicate, EvictionPolicy, KeyGenerator};
pub use events::CacheEvent;
pub use layer::CacheLayer;
pub use store::{CacheStore, LruCache, MemoryCache, TtlCache};

use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use futures::future::BoxFuture;
#[cfg(feature = "metrics")]
use metrics::counter;
use modelgate_core::{LlmError, LlmRequest, LlmResponse};
use tower::{Service, ServiceExt};

/// The cache middleware service. Built by [`CacheLayer`].
#[derive(Clone)]
pub struct Cache<S> {
    inner: S,
    config: Arc<CacheConfig>,
    store: Arc<dyn CacheStore>,
}

impl<S> Cache<S> {
    pub(crate) fn new(inner: S, config: Arc<CacheConfig>, store: Arc<dyn CacheStore>) -> Self {
        Self {
            inner,
            config,
            store,
        }
    }
}

impl<S> Service<LlmRequest> for Cache<S>
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
        let store = Arc::clone(&self.store);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            if !(config.cacheable)(&req) {
                return inner.ready().await?.call(req).await;
            }

            let Some(key) = (config.key_generator)(&req) else {
                #[cfg(feature = "tracing")]
                tracing::debug!(cache = %config.name, "key generation failed; bypassing cache");
                config.event_listeners.emit(&CacheEvent::Bypassed {
                    component: config.name.clone(),
                    timestamp: Instant::now(),
                });
                return inner.ready().await?.call(req).await;
            };

            if let Some(hit) = store.get(&key) {
                config.event_listeners.emit(&CacheEvent::Hit {
                    component: config.name.clone(),
                    timestamp: Instant::now(),
                    key: key.clone(),
                });
                #[cfg(feature = "metrics")]
                counter!("cache_hits_total", "cache" => config.name.clone()).increment(1);
                return Ok(hit);
            }

            config.event_listeners.emit(&CacheEvent::Miss {
                component: config.name.clone(),
                timestamp: Instant::now(),
                key: key.clone(),
            });
            #[cfg(feature = "metrics")]
            counter!("cache_misses_total", "cache" => config.name.clone()).increment(1);

            // Errors propagate here and are never stored.
            let response = inner.ready().await?.call(req).await?;

            if let Some(copy) = response.try_clone() {
                if let Some(evicted) = store.set(key.clone(), copy, config.ttl) {
                    config.event_listeners.emit(&CacheEvent::Evicted {
                        component: config.name.clone(),
                        timestamp: Instant::now(),
                        key: evicted,
                    });
                }
                config.event_listeners.emit(&CacheEvent::Stored {
                    component: config.name.clone(),
                    timestamp: Instant::now(),
                    key,
                });
            }

            Ok(response)
        })
    }
}
