//! Eviction behavior: capacity bounds and LRU access ordering.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use modelgate_cache::{CacheLayer, CacheStore, EvictionPolicy, LruCache};
use tower::{Layer, Service, ServiceExt};

use crate::support;

#[tokio::test]
async fn capacity_overflow_evicts_something() {
    let capacity = 3;
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = CacheLayer::builder()
        .capacity(capacity)
        .ttl(Duration::from_secs(3600))
        .build();
    let store = layer.store();
    let mut svc = layer.layer(support::counting_ok("answer", Arc::clone(&calls)));

    for i in 0..=capacity {
        svc.ready()
            .await
            .unwrap()
            .call(support::request(&format!("prompt-{i}")))
            .await
            .unwrap();
    }
    // capacity + 1 inserts into a capacity-bounded store.
    assert_eq!(store.len(), capacity);
}

#[tokio::test]
async fn lru_eviction_follows_access_order() {
    let store = LruCache::new(2);
    store.set("k1".into(), support::response("1"), None);
    store.set("k2".into(), support::response("2"), None);

    // Touch k1, then insert k3: k2 is the least recently used.
    store.get("k1").unwrap();
    store.set("k3".into(), support::response("3"), None);

    assert!(store.get("k1").is_some());
    assert!(store.get("k2").is_none());
    assert!(store.get("k3").is_some());
}

#[tokio::test]
async fn lru_layer_end_to_end() {
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = CacheLayer::builder()
        .capacity(2)
        .eviction(EvictionPolicy::Lru)
        .build();
    let mut svc = layer.layer(support::counting_ok("answer", Arc::clone(&calls)));

    // Fill with a and b, refresh a, then c evicts b.
    for prompt in ["a", "b", "a", "c", "a", "b"] {
        svc.ready()
            .await
            .unwrap()
            .call(support::request(prompt))
            .await
            .unwrap();
    }
    // Downstream calls: a, b miss; a hit; c miss; a hit; b miss again.
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}
