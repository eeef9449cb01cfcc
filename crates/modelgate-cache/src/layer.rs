//! Layer wiring for the cache middleware.

use std::sync::{Arc, Weak};

use tower::Layer;

use crate::config::{CacheConfig, EvictionPolicy};
use crate::store::{CacheStore, LruCache, MemoryCache, TtlCache};
use crate::Cache;

/// A middleware layer that memoizes successful responses.
///
/// Each layer owns one store shared by every service it wraps, so placing
/// the same layer around several dispatch targets shares their cache.
///
/// # Examples
///
/// ```
/// use modelgate_cache::CacheLayer;
/// use std::time::Duration;
///
/// let layer = CacheLayer::builder()
///     .capacity(500)
///     .ttl(Duration::from_secs(300))
///     .name("chat")
///     .build();
/// ```
#[derive(Clone)]
pub struct CacheLayer {
    config: Arc<CacheConfig>,
    store: Arc<dyn CacheStore>,
}

impl CacheLayer {
    /// Creates a layer from the given configuration, constructing the
    /// store the eviction policy calls for and starting the background
    /// sweep when a tokio runtime is available.
    pub(crate) fn new(config: CacheConfig) -> Self {
        let store: Arc<dyn CacheStore> = match (config.eviction, config.ttl) {
            (EvictionPolicy::Lru, _) => Arc::new(LruCache::new(config.capacity)),
            (EvictionPolicy::EarliestExpiry, Some(ttl)) => {
                Arc::new(TtlCache::new(config.capacity, ttl))
            }
            (EvictionPolicy::EarliestExpiry, None) => Arc::new(MemoryCache::new(config.capacity)),
        };
        let layer = Self {
            config: Arc::new(config),
            store,
        };
        layer.spawn_sweeper();
        layer
    }

    /// Creates a layer over a caller-supplied store. No sweeper is
    /// started; the owner of the store decides when to sweep.
    pub fn with_store(config: CacheConfig, store: Arc<dyn CacheStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// Creates a new builder for configuring a cache layer.
    pub fn builder() -> crate::CacheConfigBuilder {
        crate::CacheConfigBuilder::new()
    }

    /// The store backing this layer.
    pub fn store(&self) -> Arc<dyn CacheStore> {
        Arc::clone(&self.store)
    }

    /// Periodically drops expired entries. The task holds only a weak
    /// reference and exits once the store is gone. Outside a runtime the
    /// sweep is skipped; expired entries stay unobservable either way.
    fn spawn_sweeper(&self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let interval = self.config.sweep_interval;
        let store: Weak<dyn CacheStore> = Arc::downgrade(&self.store);
        handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else { break };
                let swept = store.sweep();
                #[cfg(feature = "tracing")]
                if swept > 0 {
                    tracing::debug!(swept, "cache sweep removed expired entries");
                }
                #[cfg(not(feature = "tracing"))]
                let _ = swept;
            }
        });
    }
}

impl<S> Layer<S> for CacheLayer {
    type Service = Cache<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Cache::new(inner, Arc::clone(&self.config), Arc::clone(&self.store))
    }
}
