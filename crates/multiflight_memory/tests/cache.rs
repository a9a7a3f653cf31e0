// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the in-memory cache tiers.

use std::time::Duration;

use multiflight_memory::{BoundedPromiseCache, InMemoryCacheBuilder, InMemoryValueCache};
use multiflight_tier::{DynamicValueCacheExt, PromiseCache, ValueCache};

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

#[test]
fn new_cache_starts_empty() {
    let cache = InMemoryValueCache::<String, i32>::new();
    assert_eq!(cache.entry_count(), 0);
}

#[test]
fn get_returns_none_for_missing_key() {
    block_on(async {
        let cache = InMemoryValueCache::<String, i32>::new();
        let result = cache.get(&"missing".to_string()).await.expect("get failed");
        assert!(result.is_none());
    });
}

#[test]
fn set_overwrites_existing_value() {
    block_on(async {
        let cache = InMemoryValueCache::<String, i32>::default();
        cache.set(&"key".to_string(), 42).await.expect("set failed");
        cache.set(&"key".to_string(), 100).await.expect("set failed");

        assert_eq!(cache.get(&"key".to_string()).await.expect("get failed"), Some(100));
    });
}

#[test]
fn delete_removes_value() {
    block_on(async {
        let cache = InMemoryValueCache::<String, i32>::new();
        cache.set(&"key".to_string(), 42).await.expect("set failed");

        cache.delete(&"key".to_string()).await.expect("delete failed");
        cache.delete(&"never-set".to_string()).await.expect("delete failed");

        assert!(cache.get(&"key".to_string()).await.expect("get failed").is_none());
    });
}

#[test]
fn get_many_preserves_key_order() {
    block_on(async {
        let cache = InMemoryValueCache::<String, i32>::new();
        cache
            .set_many(vec![("a".to_string(), 1), ("c".to_string(), 3)])
            .await
            .expect("set_many failed");

        let keys = ["c".to_string(), "b".to_string(), "a".to_string()];
        let values: Vec<Option<i32>> = cache
            .get_many(&keys)
            .await
            .into_iter()
            .map(|r| r.expect("get failed"))
            .collect();

        assert_eq!(values, vec![Some(3), None, Some(1)]);
    });
}

#[test]
fn dynamic_wrapper_shares_storage_with_original() {
    block_on(async {
        let cache = InMemoryValueCache::<String, i32>::new();
        let dynamic = cache.clone().into_dynamic();

        dynamic.set(&"key".to_string(), 7).await.expect("set failed");
        assert_eq!(cache.get(&"key".to_string()).await.expect("get failed"), Some(7));
    });
}

#[test]
fn builder_applies_every_setting() {
    block_on(async {
        let cache = InMemoryCacheBuilder::<String, i32>::new()
            .max_capacity(100)
            .initial_capacity(10)
            .time_to_live(Duration::from_secs(300))
            .time_to_idle(Duration::from_secs(60))
            .name("settings")
            .build();

        cache.set(&"key".to_string(), 1).await.expect("set failed");
        assert_eq!(cache.get(&"key".to_string()).await.expect("get failed"), Some(1));
    });
}

#[test]
fn time_to_live_expires_values() {
    block_on(async {
        let cache = InMemoryValueCache::<String, i32>::builder()
            .time_to_live(Duration::from_millis(20))
            .build();
        cache.set(&"key".to_string(), 1).await.expect("set failed");

        std::thread::sleep(Duration::from_millis(60));

        assert!(cache.get(&"key".to_string()).await.expect("get failed").is_none());
    });
}

#[test]
fn bounded_promise_cache_replaces_handles() {
    let mut cache = BoundedPromiseCache::<String, u32>::with_capacity(10);
    cache.set("a".to_string(), 1);
    cache.set("a".to_string(), 2);

    assert_eq!(cache.get(&"a".to_string()), Some(2));
    assert_eq!(cache.len(), Some(1));
}

#[test]
fn bounded_promise_cache_expires_handles() {
    let mut cache = BoundedPromiseCache::<String, u32>::builder()
        .time_to_live(Duration::from_millis(20))
        .build_promise_cache();
    cache.set("a".to_string(), 1);

    std::thread::sleep(Duration::from_millis(60));

    assert!(!cache.contains_key(&"a".to_string()));
    assert_eq!(cache.get(&"a".to_string()), None);
}
