// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring in-memory cache tiers.
//!
//! The same settings apply to both tiers: [`InMemoryCacheBuilder::build`]
//! produces a value cache and [`InMemoryCacheBuilder::build_promise_cache`]
//! produces a promise cache.

use std::hash::Hash;
use std::marker::PhantomData;
use std::time::Duration;

use crate::promise::BoundedPromiseCache;
use crate::value::InMemoryValueCache;

/// Builder for configuring an in-memory cache tier.
///
/// # Examples
///
/// ```
/// use multiflight_memory::InMemoryValueCache;
/// use std::time::Duration;
///
/// let cache = InMemoryValueCache::<String, i32>::builder()
///     .max_capacity(1000)
///     .time_to_live(Duration::from_secs(300))
///     .time_to_idle(Duration::from_secs(60))
///     .initial_capacity(100)
///     .name("users")
///     .build();
/// ```
#[derive(Debug)]
pub struct InMemoryCacheBuilder<C, V> {
    pub(crate) max_capacity: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) time_to_live: Option<Duration>,
    pub(crate) time_to_idle: Option<Duration>,
    pub(crate) name: Option<String>,
    _phantom: PhantomData<fn() -> (C, V)>,
}

impl<C, V> Default for InMemoryCacheBuilder<C, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, V> InMemoryCacheBuilder<C, V> {
    /// Creates a new builder for an unbounded cache without expiration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_capacity: None,
            initial_capacity: None,
            time_to_live: None,
            time_to_idle: None,
            name: None,
            _phantom: PhantomData,
        }
    }

    /// Sets the maximum number of entries.
    ///
    /// Once the capacity is reached, entries are evicted using the `TinyLFU`
    /// policy. If not set, the cache is unbounded.
    #[must_use]
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets the initial capacity (pre-allocation hint) for the cache.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Sets the time-to-live for all entries.
    ///
    /// Entries expire this long after insertion regardless of access.
    #[must_use]
    pub fn time_to_live(mut self, duration: Duration) -> Self {
        self.time_to_live = Some(duration);
        self
    }

    /// Sets the time-to-idle for all entries.
    ///
    /// Entries expire after this long without a read or write.
    #[must_use]
    pub fn time_to_idle(mut self, duration: Duration) -> Self {
        self.time_to_idle = Some(duration);
        self
    }

    /// Sets a name that may appear in debugging output of the backing cache.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds a value cache with this configuration.
    #[must_use]
    pub fn build(self) -> InMemoryValueCache<C, V>
    where
        C: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        InMemoryValueCache::from_builder(&self)
    }

    /// Builds a promise cache with this configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use multiflight_memory::InMemoryCacheBuilder;
    /// use multiflight_tier::PromiseCache;
    ///
    /// let mut cache = InMemoryCacheBuilder::<u32, &'static str>::new()
    ///     .max_capacity(10_000)
    ///     .build_promise_cache();
    ///
    /// cache.set(1, "pending");
    /// assert!(cache.contains_key(&1));
    /// ```
    #[must_use]
    pub fn build_promise_cache(self) -> BoundedPromiseCache<C, V>
    where
        C: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        BoundedPromiseCache::from_builder(&self)
    }
}
