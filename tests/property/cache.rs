//! Cache store invariants.

use std::time::Duration;

use modelgate_cache::{CacheStore, LruCache, MemoryCache};
use modelgate_core::{FinishReason, LlmResponse, TextResponse, Usage};
use proptest::prelude::*;

fn response(text: String) -> LlmResponse {
    LlmResponse::Text(TextResponse {
        id: "r".into(),
        model: "m".into(),
        text,
        tool_calls: Vec::new(),
        finish_reason: FinishReason::Stop,
        usage: Usage::default(),
        created: 0,
    })
}

fn text_of(response: LlmResponse) -> String {
    match response {
        LlmResponse::Text(r) => r.text,
        _ => unreachable!(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Stores never hold more than their capacity, whatever the insert
    /// sequence.
    #[test]
    fn capacity_is_never_exceeded(
        capacity in 1usize..16,
        keys in proptest::collection::vec("[a-d]{1,3}", 1..64),
    ) {
        let memory = MemoryCache::new(capacity);
        let lru = LruCache::new(capacity);
        for key in &keys {
            memory.set(key.clone(), response(key.clone()), Some(Duration::from_secs(60)));
            lru.set(key.clone(), response(key.clone()), None);
            prop_assert!(memory.len() <= capacity);
            prop_assert!(lru.len() <= capacity);
        }
    }

    /// A live entry always reads back the stored value.
    #[test]
    fn hits_return_the_stored_value(
        keys in proptest::collection::vec("[a-f]{1,4}", 1..32),
    ) {
        let store = MemoryCache::new(64);
        for key in &keys {
            store.set(key.clone(), response(format!("value-{key}")), Some(Duration::from_secs(60)));
        }
        // The last write for each key wins.
        for key in &keys {
            let hit = store.get(key).expect("live entry");
            prop_assert_eq!(text_of(hit), format!("value-{key}"));
        }
    }

    /// After capacity + 1 distinct inserts at least one original key is
    /// gone.
    #[test]
    fn overflow_evicts_an_original_key(capacity in 1usize..8) {
        let store = MemoryCache::new(capacity);
        let keys: Vec<String> = (0..=capacity).map(|i| format!("key-{i}")).collect();
        for key in &keys {
            store.set(key.clone(), response(key.clone()), Some(Duration::from_secs(60)));
        }
        let survivors = keys.iter().filter(|key| store.get(key).is_some()).count();
        prop_assert_eq!(survivors, capacity);
    }
}
