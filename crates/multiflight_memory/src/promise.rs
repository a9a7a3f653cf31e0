// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bounded promise cache backed by moka.

use std::hash::Hash;

use moka::sync::Cache;
use multiflight_tier::PromiseCache;

use crate::builder::InMemoryCacheBuilder;

/// A promise cache with capacity and time based eviction.
///
/// A loader's default promise cache remembers every identity until it is
/// cleared. For long-lived loaders this one forgets old entries, so a later
/// load of an evicted identity goes back to the value cache or the batch
/// function. Evicting an in-flight handle never cancels it: waiters that
/// already hold it still resolve.
///
/// # Examples
///
/// ```
/// use multiflight_memory::BoundedPromiseCache;
/// use multiflight_tier::PromiseCache;
///
/// let mut cache = BoundedPromiseCache::<String, u32>::with_capacity(100);
/// cache.set("a".to_string(), 1);
/// assert_eq!(cache.get(&"a".to_string()), Some(1));
/// ```
#[derive(Debug)]
pub struct BoundedPromiseCache<C, F>
where
    C: Hash + Eq + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    inner: Cache<C, F>,
}

impl<C, F> BoundedPromiseCache<C, F>
where
    C: Hash + Eq + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    /// Creates a promise cache holding at most `max_capacity` handles.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::builder().max_capacity(max_capacity).build_promise_cache()
    }

    /// Creates a new builder for configuring a bounded promise cache.
    #[must_use]
    pub fn builder() -> InMemoryCacheBuilder<C, F> {
        InMemoryCacheBuilder::new()
    }

    pub(crate) fn from_builder(builder: &InMemoryCacheBuilder<C, F>) -> Self {
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

impl<C, F> PromiseCache<C, F> for BoundedPromiseCache<C, F>
where
    C: Hash + Eq + Send + Sync + 'static,
    F: Clone + Send + Sync + 'static,
{
    fn contains_key(&self, key: &C) -> bool {
        self.inner.contains_key(key)
    }

    fn get(&self, key: &C) -> Option<F> {
        self.inner.get(key)
    }

    fn set(&mut self, key: C, handle: F) {
        self.inner.insert(key, handle);
    }

    fn delete(&mut self, key: &C) {
        self.inner.invalidate(key);
    }

    fn clear(&mut self) {
        self.inner.invalidate_all();
    }

    fn len(&self) -> Option<usize> {
        self.inner.run_pending_tasks();
        usize::try_from(self.inner.entry_count()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_then_get_misses() {
        let mut cache = BoundedPromiseCache::<u32, &'static str>::with_capacity(8);
        cache.set(1, "a");
        cache.delete(&1);

        assert!(!cache.contains_key(&1));
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn len_is_tracked() {
        let mut cache = BoundedPromiseCache::<u32, &'static str>::with_capacity(8);
        cache.set(1, "a");
        cache.set(2, "b");

        assert_eq!(cache.len(), Some(2));

        cache.clear();
        assert!(!cache.contains_key(&1));
        assert!(!cache.contains_key(&2));
    }
}
