// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The second-tier, value-holding cache.
//!
//! [`ValueCache`] stores raw values rather than in-flight loads, so it can be
//! backed by anything that outlives a single loader: a shared in-memory
//! cache, Redis, memcached and so on.

use futures::future::join_all;

use crate::Error;

/// Trait for second-tier value cache implementations.
///
/// A lookup distinguishes three outcomes:
/// - `Ok(Some(value))`: the identity is cached. `value` may itself be an
///   "empty" value such as `None` when `V` is an `Option`.
/// - `Ok(None)`: an explicit miss.
/// - `Err(_)`: the tier failed. Callers treat this the same as a miss.
///
/// Only `get`, `set`, `delete` and `clear` are required. The bulk methods
/// default to a concurrent fan-out over the single-key methods; override them
/// when the backing store has a native bulk primitive.
#[dynosaur::dynosaur(pub(crate) DynValueCache = dyn(box) ValueCache, bridge(none))]
pub trait ValueCache<C, V>: Send + Sync {
    /// Looks up a single identity.
    fn get(&self, key: &C) -> impl Future<Output = Result<Option<V>, Error>> + Send;

    /// Looks up many identities at once.
    ///
    /// Implementations must return exactly one result per key, in key order.
    fn get_many(&self, keys: &[C]) -> impl Future<Output = Vec<Result<Option<V>, Error>>> + Send
    where
        C: Sync,
        V: Send,
    {
        async move { join_all(keys.iter().map(|key| self.get(key))).await }
    }

    /// Stores a value, replacing any previous value for the identity.
    fn set(&self, key: &C, value: V) -> impl Future<Output = Result<(), Error>> + Send;

    /// Stores many values at once.
    ///
    /// Returns the first failure, if any. Entries that did not fail are
    /// still stored.
    fn set_many(&self, entries: Vec<(C, V)>) -> impl Future<Output = Result<(), Error>> + Send
    where
        C: Send + Sync,
        V: Send,
    {
        async move {
            join_all(entries.into_iter().map(|(key, value)| async move { self.set(&key, value).await }))
                .await
                .into_iter()
                .collect()
        }
    }

    /// Removes the value for an identity, if present.
    fn delete(&self, key: &C) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes every value.
    fn clear(&self) -> impl Future<Output = Result<(), Error>> + Send;
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use futures::executor::block_on;
    use parking_lot::Mutex;

    use super::*;

    /// A tier that only implements the required methods.
    #[derive(Debug, Default)]
    struct MapTier {
        data: Mutex<HashMap<String, Option<i32>>>,
        fail_key: Option<String>,
    }

    impl ValueCache<String, Option<i32>> for MapTier {
        async fn get(&self, key: &String) -> Result<Option<Option<i32>>, Error> {
            if self.fail_key.as_ref() == Some(key) {
                return Err(Error::from_message("get failed"));
            }
            Ok(self.data.lock().get(key).cloned())
        }

        async fn set(&self, key: &String, value: Option<i32>) -> Result<(), Error> {
            if self.fail_key.as_ref() == Some(key) {
                return Err(Error::from_message("set failed"));
            }
            self.data.lock().insert(key.clone(), value);
            Ok(())
        }

        async fn delete(&self, key: &String) -> Result<(), Error> {
            self.data.lock().remove(key);
            Ok(())
        }

        async fn clear(&self) -> Result<(), Error> {
            self.data.lock().clear();
            Ok(())
        }
    }

    #[test]
    fn get_many_fans_out_in_key_order() {
        let tier = MapTier::default();
        tier.data.lock().insert("b".to_string(), Some(2));
        tier.data.lock().insert("c".to_string(), None);

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let results = block_on(tier.get_many(&keys));

        assert_eq!(results.len(), 3);
        assert!(matches!(results[0], Ok(None)));
        assert!(matches!(results[1], Ok(Some(Some(2)))));
        // A cached empty value is a hit, not a miss.
        assert!(matches!(results[2], Ok(Some(None))));
    }

    #[test]
    fn get_many_keeps_failures_per_key() {
        let tier = MapTier {
            fail_key: Some("bad".to_string()),
            ..MapTier::default()
        };

        let keys = vec!["bad".to_string(), "good".to_string()];
        let results = block_on(tier.get_many(&keys));

        results[0].as_ref().expect_err("the failing key should fail");
        assert!(matches!(results[1], Ok(None)));
    }

    #[test]
    fn set_many_stores_everything_that_did_not_fail() {
        let tier = MapTier {
            fail_key: Some("bad".to_string()),
            ..MapTier::default()
        };

        let result = block_on(tier.set_many(vec![
            ("x".to_string(), Some(1)),
            ("bad".to_string(), Some(2)),
            ("y".to_string(), None),
        ]));

        result.expect_err("the failing write should be reported");
        let data = tier.data.lock();
        assert_eq!(data.get("x"), Some(&Some(1)));
        assert_eq!(data.get("y"), Some(&None));
        assert!(!data.contains_key("bad"));
    }
}
