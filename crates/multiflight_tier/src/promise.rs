// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The first-tier cache of in-flight and completed loads.

use std::{collections::HashMap, fmt::Debug, hash::Hash};

/// Trait for first-tier promise cache implementations.
///
/// A promise cache maps a cache identity to a load handle `F`, which is
/// typically a cloneable shared future. The loader only needs the operations
/// below; eviction policy is entirely up to the implementation. Every method
/// is synchronous and only touches the mapping: none of them resolves or
/// fails the stored handles.
///
/// Implementations are always called under the loader's lock, so they do not
/// need interior synchronization.
pub trait PromiseCache<C, F>: Send {
    /// Returns `true` if a handle is stored for the identity.
    fn contains_key(&self, key: &C) -> bool;

    /// Returns a clone of the stored handle.
    fn get(&self, key: &C) -> Option<F>;

    /// Stores a handle, replacing any previous one.
    fn set(&mut self, key: C, handle: F);

    /// Removes the handle for an identity, if present.
    fn delete(&mut self, key: &C);

    /// Removes every handle.
    fn clear(&mut self);

    /// Returns the number of stored handles, if tracked.
    fn len(&self) -> Option<usize> {
        None
    }

    /// Returns `true` if no handles are stored, if tracked.
    fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }
}

/// The default promise cache: an unbounded map without eviction.
///
/// # Examples
///
/// ```
/// use multiflight_tier::{InProcessPromiseCache, PromiseCache};
///
/// let mut cache = InProcessPromiseCache::<&str, u32>::new();
/// cache.set("a", 1);
/// assert_eq!(cache.get(&"a"), Some(1));
///
/// cache.delete(&"a");
/// assert!(!cache.contains_key(&"a"));
/// ```
pub struct InProcessPromiseCache<C, F> {
    entries: HashMap<C, F>,
}

impl<C, F> InProcessPromiseCache<C, F> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }
}

impl<C, F> Default for InProcessPromiseCache<C, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, F> Debug for InProcessPromiseCache<C, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InProcessPromiseCache")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<C, F> PromiseCache<C, F> for InProcessPromiseCache<C, F>
where
    C: Eq + Hash + Send,
    F: Clone + Send,
{
    fn contains_key(&self, key: &C) -> bool {
        self.entries.contains_key(key)
    }

    fn get(&self, key: &C) -> Option<F> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: C, handle: F) {
        self.entries.insert(key, handle);
    }

    fn delete(&mut self, key: &C) {
        self.entries.remove(key);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> Option<usize> {
        Some(self.entries.len())
    }
}
