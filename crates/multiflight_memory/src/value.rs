// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory value cache backed by moka.

use std::hash::Hash;

use moka::future::Cache;
use multiflight_tier::{Error, ValueCache};

use crate::builder::InMemoryCacheBuilder;

/// An in-memory value cache backed by moka.
///
/// Clones share the same storage, so a single instance can be handed to
/// several loaders and outlive each of them. Lookups never fail.
///
/// # Examples
///
/// ```
/// use multiflight_memory::InMemoryValueCache;
/// use multiflight_tier::ValueCache;
/// # futures::executor::block_on(async {
///
/// let cache = InMemoryValueCache::<String, Option<i32>>::new();
///
/// // An empty value is a hit, not a miss.
/// cache.set(&"key".to_string(), None).await?;
/// assert_eq!(cache.get(&"key".to_string()).await?, Some(None));
/// # Ok::<(), multiflight_tier::Error>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryValueCache<C, V>
where
    C: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Cache<C, V>,
}

impl<C, V> Default for InMemoryValueCache<C, V>
where
    C: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C, V> InMemoryValueCache<C, V>
where
    C: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new unbounded in-memory value cache.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new in-memory value cache holding at most `max_capacity` values.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::builder().max_capacity(max_capacity).build()
    }

    /// Creates a new builder for configuring an in-memory value cache.
    #[must_use]
    pub fn builder() -> InMemoryCacheBuilder<C, V> {
        InMemoryCacheBuilder::new()
    }

    /// Returns the approximate number of stored values.
    ///
    /// The count is eventually consistent: evictions and invalidations are
    /// applied in the background.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    pub(crate) fn from_builder(builder: &InMemoryCacheBuilder<C, V>) -> Self {
        let mut moka_builder = Cache::builder();

        if let Some(capacity) = builder.max_capacity {
            moka_builder = moka_builder.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(ttl) = builder.time_to_live {
            moka_builder = moka_builder.time_to_live(ttl);
        }

        if let Some(tti) = builder.time_to_idle {
            moka_builder = moka_builder.time_to_idle(tti);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: moka_builder.build(),
        }
    }
}

impl<C, V> ValueCache<C, V> for InMemoryValueCache<C, V>
where
    C: Clone + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &C) -> Result<Option<V>, Error> {
        Ok(self.inner.get(key).await)
    }

    async fn set(&self, key: &C, value: V) -> Result<(), Error> {
        self.inner.insert(key.clone(), value).await;
        Ok(())
    }

    async fn delete(&self, key: &C) -> Result<(), Error> {
        self.inner.invalidate(key).await;
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.inner.invalidate_all();
        Ok(())
    }
}
