// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock value cache implementation for testing.
//!
//! This module provides `MockValueCache`, an in-memory value cache that
//! records all operations and supports failure injection for testing error
//! paths.

use std::{collections::HashMap, hash::Hash, sync::Arc};

use parking_lot::Mutex;

use crate::{Error, ValueCache};

/// Recorded value cache operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueCacheOp<C, V> {
    /// A single-key lookup.
    Get(C),
    /// A bulk lookup of the given keys, in order.
    GetMany(Vec<C>),
    /// A single-key write.
    Set {
        /// The key that was written.
        key: C,
        /// The value that was written.
        value: V,
    },
    /// A bulk write of the given entries, in order.
    SetMany(Vec<(C, V)>),
    /// A delete of the given key.
    Delete(C),
    /// A clear of every key.
    Clear,
}

type FailPredicate<C, V> = Box<dyn Fn(&ValueCacheOp<C, V>) -> bool + Send + Sync>;

/// A configurable mock value cache for testing.
///
/// Values live in memory, every operation is recorded, and any operation can
/// be made to fail on demand. Bulk operations are recorded as a single
/// [`ValueCacheOp::GetMany`] or [`ValueCacheOp::SetMany`] so tests can assert
/// how a loader batched its tier traffic.
///
/// # Examples
///
/// ```
/// use multiflight_tier::{testing::{MockValueCache, ValueCacheOp}, ValueCache};
/// # futures::executor::block_on(async {
///
/// let cache = MockValueCache::<String, i32>::new();
/// cache.set(&"key".to_string(), 42).await?;
/// assert_eq!(cache.get(&"key".to_string()).await?, Some(42));
///
/// assert_eq!(cache.operations(), vec![
///     ValueCacheOp::Set { key: "key".to_string(), value: 42 },
///     ValueCacheOp::Get("key".to_string()),
/// ]);
/// # Ok::<(), multiflight_tier::Error>(())
/// # });
/// ```
///
/// # Failure Injection
///
/// ```
/// use multiflight_tier::{testing::{MockValueCache, ValueCacheOp}, ValueCache};
/// # futures::executor::block_on(async {
///
/// let cache = MockValueCache::<String, i32>::new();
/// cache.fail_when(|op| matches!(op, ValueCacheOp::Get(k) if k == "forbidden"));
///
/// cache.get(&"forbidden".to_string()).await.unwrap_err();
/// cache.get(&"allowed".to_string()).await.unwrap();
/// # });
/// ```
pub struct MockValueCache<C, V> {
    data: Arc<Mutex<HashMap<C, V>>>,
    operations: Arc<Mutex<Vec<ValueCacheOp<C, V>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<C, V>>>>,
}

impl<C, V> std::fmt::Debug for MockValueCache<C, V>
where
    C: std::fmt::Debug,
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockValueCache")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl<C, V> Clone for MockValueCache<C, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl<C, V> Default for MockValueCache<C, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, V> MockValueCache<C, V> {
    /// Creates a new empty mock value cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }
}

impl<C, V> MockValueCache<C, V>
where
    C: Eq + Hash,
{
    /// Creates a mock value cache with pre-populated data.
    #[must_use]
    pub fn with_data(data: HashMap<C, V>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if a value is stored for the given key.
    #[must_use]
    pub fn contains_key(&self, key: &C) -> bool {
        self.data.lock().contains_key(key)
    }
}

impl<C, V> MockValueCache<C, V>
where
    C: Clone,
    V: Clone,
{
    /// Sets a predicate that determines when operations should fail.
    ///
    /// A failing operation is still recorded but does not touch the data.
    /// For bulk lookups the predicate is also asked about each key as a
    /// [`ValueCacheOp::Get`], so single-key predicates fail the matching
    /// slots of a `get_many` while the other slots succeed.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&ValueCacheOp<C, V>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<ValueCacheOp<C, V>> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: ValueCacheOp<C, V>) {
        self.operations.lock().push(op);
    }

    fn should_fail(&self, op: &ValueCacheOp<C, V>) -> bool {
        self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(op))
    }
}

impl<C, V> ValueCache<C, V> for MockValueCache<C, V>
where
    C: Clone + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &C) -> Result<Option<V>, Error> {
        let op = ValueCacheOp::Get(key.clone());
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::caused_by("mock: get failed"));
        }
        Ok(self.data.lock().get(key).cloned())
    }

    async fn get_many(&self, keys: &[C]) -> Vec<Result<Option<V>, Error>> {
        let op = ValueCacheOp::GetMany(keys.to_vec());
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return keys.iter().map(|_| Err(Error::caused_by("mock: get_many failed"))).collect();
        }

        keys.iter()
            .map(|key| {
                if self.should_fail(&ValueCacheOp::Get(key.clone())) {
                    Err(Error::caused_by("mock: get failed"))
                } else {
                    Ok(self.data.lock().get(key).cloned())
                }
            })
            .collect()
    }

    async fn set(&self, key: &C, value: V) -> Result<(), Error> {
        let op = ValueCacheOp::Set {
            key: key.clone(),
            value: value.clone(),
        };
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::caused_by("mock: set failed"));
        }
        self.data.lock().insert(key.clone(), value);
        Ok(())
    }

    async fn set_many(&self, entries: Vec<(C, V)>) -> Result<(), Error> {
        let op = ValueCacheOp::SetMany(entries.clone());
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::caused_by("mock: set_many failed"));
        }
        self.data.lock().extend(entries);
        Ok(())
    }

    async fn delete(&self, key: &C) -> Result<(), Error> {
        let op = ValueCacheOp::Delete(key.clone());
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::caused_by("mock: delete failed"));
        }
        self.data.lock().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        let op = ValueCacheOp::Clear;
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::caused_by("mock: clear failed"));
        }
        self.data.lock().clear();
        Ok(())
    }
}
