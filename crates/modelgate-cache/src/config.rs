//! Configuration for the cache middleware.

use std::sync::Arc;
use std::time::Duration;

use modelgate_core::{EventListener, EventListeners, LlmRequest, OpKind};

use crate::events::CacheEvent;

/// Produces the cache key for a request. Returning `None` bypasses the
/// cache for that call without failing it.
pub type KeyGenerator = Arc<dyn Fn(&LlmRequest) -> Option<String> + Send + Sync>;

/// Decides whether a request participates in caching at all.
pub type CachePredicate = Arc<dyn Fn(&LlmRequest) -> bool + Send + Sync>;

/// Which store backs the middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionPolicy {
    /// [`MemoryCache`](crate::MemoryCache): overflow evicts the entry
    /// closest to expiring; a background sweep removes expired entries.
    EarliestExpiry,
    /// [`LruCache`](crate::LruCache): overflow evicts the least recently
    /// accessed entry; TTLs are ignored.
    Lru,
}

/// Configuration for the cache middleware.
pub struct CacheConfig {
    pub(crate) capacity: usize,
    pub(crate) ttl: Option<Duration>,
    pub(crate) eviction: EvictionPolicy,
    pub(crate) key_generator: KeyGenerator,
    pub(crate) cacheable: CachePredicate,
    pub(crate) sweep_interval: Duration,
    pub(crate) name: String,
    pub(crate) event_listeners: EventListeners<CacheEvent>,
}

impl CacheConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::new()
    }
}

/// Builder for [`CacheConfig`].
pub struct CacheConfigBuilder {
    capacity: usize,
    ttl: Option<Duration>,
    eviction: EvictionPolicy,
    key_generator: KeyGenerator,
    cacheable: CachePredicate,
    sweep_interval: Duration,
    name: String,
    event_listeners: EventListeners<CacheEvent>,
}

impl CacheConfigBuilder {
    /// Creates a builder with default values: 1000 entries, 1 hour TTL,
    /// earliest-expiry eviction, fingerprint keys, everything except
    /// Stream requests cacheable, 5 minute sweep.
    pub fn new() -> Self {
        Self {
            capacity: 1000,
            ttl: Some(Duration::from_secs(3600)),
            eviction: EvictionPolicy::EarliestExpiry,
            key_generator: Arc::new(crate::key::fingerprint),
            cacheable: Arc::new(|req| req.kind() != OpKind::Stream),
            sweep_interval: Duration::from_secs(300),
            name: String::from("<unnamed>"),
            event_listeners: EventListeners::new(),
        }
    }

    /// Sets the maximum number of entries.
    ///
    /// Default: 1000
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the TTL applied to stored responses. Ignored by the LRU store.
    ///
    /// Default: 1 hour
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Stores entries without an expiration.
    pub fn no_ttl(mut self) -> Self {
        self.ttl = None;
        self
    }

    /// Sets the eviction policy.
    ///
    /// Default: [`EvictionPolicy::EarliestExpiry`]
    pub fn eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    /// Replaces the default fingerprint key generator.
    pub fn key_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn(&LlmRequest) -> Option<String> + Send + Sync + 'static,
    {
        self.key_generator = Arc::new(generator);
        self
    }

    /// Replaces the cacheability predicate.
    ///
    /// Default: every kind except Stream
    pub fn cacheable<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&LlmRequest) -> bool + Send + Sync + 'static,
    {
        self.cacheable = Arc::new(predicate);
        self
    }

    /// Sets the interval of the background sweep that drops expired
    /// entries.
    ///
    /// Default: 5 minutes
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Names this instance for events and metrics labels.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Subscribes an event listener.
    pub fn event_listener<L>(mut self, listener: L) -> Self
    where
        L: EventListener<CacheEvent> + 'static,
    {
        self.event_listeners.add(listener);
        self
    }

    /// Finalizes the configuration into a layer.
    pub fn build(self) -> crate::CacheLayer {
        crate::CacheLayer::new(CacheConfig {
            capacity: self.capacity,
            ttl: self.ttl,
            eviction: self.eviction,
            key_generator: self.key_generator,
            cacheable: self.cacheable,
            sweep_interval: self.sweep_interval,
            name: self.name,
            event_listeners: self.event_listeners,
        })
    }
}

impl Default for CacheConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
