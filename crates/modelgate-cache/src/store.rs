//! Cache stores.
//!
//! Three realizations of the same contract: [`MemoryCache`] (absolute
//! expirations, overflow evicts the entry closest to expiring),
//! [`TtlCache`] (memory store with a default TTL for callers that omit
//! one), and [`LruCache`] (access-ordered, ignores TTLs).
//!
//! All stores are safe for concurrent use. Writes are serialized; memory
//! reads may proceed concurrently with other reads. Expired entries are
//! unobservable through `get` but may linger until the next sweep or
//! eviction.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};

use modelgate_core::LlmResponse;

/// Shared contract for response stores.
///
/// Values are [`LlmResponse`]s that are guaranteed cloneable (streams are
/// rejected by [`set`](CacheStore::set) before they reach a store).
pub trait CacheStore: Send + Sync {
    /// Returns a clone of the live entry for `key`, if any.
    fn get(&self, key: &str) -> Option<LlmResponse>;

    /// Inserts an entry, evicting if at capacity. Returns the evicted key.
    fn set(&self, key: String, value: LlmResponse, ttl: Option<Duration>) -> Option<String>;

    /// Removes the entry for `key`, if present.
    fn delete(&self, key: &str);

    /// Drops every entry.
    fn clear(&self);

    /// Number of entries currently held, including not-yet-swept expired
    /// ones.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes expired entries in bulk; returns how many were dropped.
    /// Stores without expirations have nothing to sweep.
    fn sweep(&self) -> usize {
        0
    }
}

struct Entry {
    value: LlmResponse,
    /// `None` means the entry never expires.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map(|at| at > now).unwrap_or(true)
    }
}

/// Map-backed store with absolute expirations.
///
/// On overflow the entry with the earliest expiration is evicted (entries
/// without an expiration count as latest). [`sweep`](MemoryCache::sweep)
/// removes expired entries in bulk; the cache middleware runs it
/// periodically.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    capacity: usize,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Picks the key with the earliest expiration for eviction. Entries
    /// without an expiration count as latest-expiring.
    fn evict_earliest_expiring(entries: &mut HashMap<String, Entry>) -> Option<String> {
        let horizon = Instant::now() + Duration::from_secs(60 * 60 * 24 * 365 * 30);
        let victim = entries
            .iter()
            .min_by_key(|(_, entry)| entry.expires_at.unwrap_or(horizon))
            .map(|(key, _)| key.clone())?;
        entries.remove(&victim);
        Some(victim)
    }
}

impl CacheStore for MemoryCache {
    fn get(&self, key: &str) -> Option<LlmResponse> {
        let now = Instant::now();
        let entries = self.entries.read().unwrap();
        let entry = entries.get(key)?;
        if !entry.is_live(now) {
            return None;
        }
        entry.value.try_clone()
    }

    fn set(&self, key: String, value: LlmResponse, ttl: Option<Duration>) -> Option<String> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        let mut entries = self.entries.write().unwrap();
        let mut evicted = None;
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            evicted = Self::evict_earliest_expiring(&mut entries);
        }
        entries.insert(key, Entry { value, expires_at });
        evicted
    }

    fn delete(&self, key: &str) {
        self.entries.write().unwrap().remove(key);
    }

    fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }
}

/// [`MemoryCache`] with a default TTL applied when the caller passes none.
pub struct TtlCache {
    inner: MemoryCache,
    default_ttl: Duration,
}

impl TtlCache {
    pub fn new(capacity: usize, default_ttl: Duration) -> Self {
        Self {
            inner: MemoryCache::new(capacity),
            default_ttl,
        }
    }
}

impl CacheStore for TtlCache {
    fn get(&self, key: &str) -> Option<LlmResponse> {
        self.inner.get(key)
    }

    fn set(&self, key: String, value: LlmResponse, ttl: Option<Duration>) -> Option<String> {
        self.inner.set(key, value, Some(ttl.unwrap_or(self.default_ttl)))
    }

    fn delete(&self, key: &str) {
        self.inner.delete(key)
    }

    fn clear(&self) {
        self.inner.clear()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn sweep(&self) -> usize {
        self.inner.sweep()
    }
}

/// Access-ordered store: every hit refreshes recency, overflow drops the
/// least-recently-used entry. TTL arguments are ignored.
pub struct LruCache {
    entries: Mutex<lru::LruCache<String, LlmResponse>>,
}

impl LruCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("non-zero");
        Self {
            entries: Mutex::new(lru::LruCache::new(capacity)),
        }
    }
}

impl CacheStore for LruCache {
    fn get(&self, key: &str) -> Option<LlmResponse> {
        let mut entries = self.entries.lock().unwrap();
        entries.get(key).and_then(|value| value.try_clone())
    }

    fn set(&self, key: String, value: LlmResponse, _ttl: Option<Duration>) -> Option<String> {
        let mut entries = self.entries.lock().unwrap();
        entries.push(key, value).map(|(evicted, _)| evicted)
    }

    fn delete(&self, key: &str) {
        self.entries.lock().unwrap().pop(key);
    }

    fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
