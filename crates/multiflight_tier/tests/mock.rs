// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for `MockValueCache`.

use std::collections::HashMap;

use multiflight_tier::ValueCache;
use multiflight_tier::testing::{MockValueCache, ValueCacheOp};

#[tokio::test]
async fn records_operations_in_order() {
    let cache = MockValueCache::<String, i32>::new();
    cache.set(&"a".to_string(), 1).await.expect("error on set");
    let _ = cache.get(&"a".to_string()).await.expect("error on get");
    cache.delete(&"a".to_string()).await.expect("error on delete");
    cache.clear().await.expect("error on clear");

    assert_eq!(
        cache.operations(),
        vec![
            ValueCacheOp::Set {
                key: "a".to_string(),
                value: 1
            },
            ValueCacheOp::Get("a".to_string()),
            ValueCacheOp::Delete("a".to_string()),
            ValueCacheOp::Clear,
        ]
    );
}

#[tokio::test]
async fn bulk_operations_are_recorded_once() {
    let cache = MockValueCache::<String, i32>::new();
    cache
        .set_many(vec![("a".to_string(), 1), ("b".to_string(), 2)])
        .await
        .expect("error on set_many");
    let results = cache.get_many(&["b".to_string(), "c".to_string()]).await;

    assert!(matches!(results[0], Ok(Some(2))));
    assert!(matches!(results[1], Ok(None)));
    assert_eq!(
        cache.operations(),
        vec![
            ValueCacheOp::SetMany(vec![("a".to_string(), 1), ("b".to_string(), 2)]),
            ValueCacheOp::GetMany(vec!["b".to_string(), "c".to_string()]),
        ]
    );
}

#[tokio::test]
async fn single_key_predicate_fails_matching_bulk_slots() {
    let cache = MockValueCache::with_data(HashMap::from([("ok".to_string(), 1), ("bad".to_string(), 2)]));
    cache.fail_when(|op| matches!(op, ValueCacheOp::Get(k) if k == "bad"));

    let results = cache.get_many(&["ok".to_string(), "bad".to_string()]).await;

    assert!(matches!(results[0], Ok(Some(1))));
    results[1].as_ref().unwrap_err();
}

#[tokio::test]
async fn failing_writes_leave_data_untouched() {
    let cache = MockValueCache::<String, i32>::new();
    cache.fail_when(|op| matches!(op, ValueCacheOp::SetMany(_)));

    let result = cache.set_many(vec![("a".to_string(), 1)]).await;

    result.unwrap_err();
    assert_eq!(cache.entry_count(), 0);
    assert_eq!(cache.operations().len(), 1);

    cache.clear_failures();
    cache.set_many(vec![("a".to_string(), 1)]).await.expect("error on set_many");
    assert!(cache.contains_key(&"a".to_string()));
}

#[tokio::test]
async fn clones_share_state() {
    let cache = MockValueCache::<String, i32>::new();
    let clone = cache.clone();

    clone.set(&"shared".to_string(), 9).await.expect("error on set");
    cache.clear_operations();

    assert_eq!(cache.get(&"shared".to_string()).await.expect("error on get"), Some(9));
    assert_eq!(clone.operations(), vec![ValueCacheOp::Get("shared".to_string())]);
}
