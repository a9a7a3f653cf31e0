// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::marker::PhantomData;

use crate::{Error, ValueCache};

/// A value cache that stores nothing.
///
/// Every lookup is a miss and every write is discarded. This is the value
/// cache a loader uses when none is configured, which keeps the promise cache
/// the only cache tier.
///
/// # Examples
///
/// ```
/// use multiflight_tier::{NoopValueCache, ValueCache};
/// # futures::executor::block_on(async {
///
/// let cache = NoopValueCache::<String, i32>::new();
/// cache.set(&"key".to_string(), 42).await?;
/// assert!(cache.get(&"key".to_string()).await?.is_none());
/// # Ok::<(), multiflight_tier::Error>(())
/// # });
/// ```
pub struct NoopValueCache<C, V> {
    _phantom: PhantomData<fn() -> (C, V)>,
}

impl<C, V> NoopValueCache<C, V> {
    /// Creates a new no-op value cache.
    #[must_use]
    pub fn new() -> Self {
        Self { _phantom: PhantomData }
    }
}

impl<C, V> Default for NoopValueCache<C, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, V> Clone for NoopValueCache<C, V> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<C, V> std::fmt::Debug for NoopValueCache<C, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoopValueCache").finish()
    }
}

impl<C, V> ValueCache<C, V> for NoopValueCache<C, V>
where
    C: Send + Sync,
    V: Send,
{
    async fn get(&self, _key: &C) -> Result<Option<V>, Error> {
        Ok(None)
    }

    async fn get_many(&self, keys: &[C]) -> Vec<Result<Option<V>, Error>> {
        keys.iter().map(|_| Ok(None)).collect()
    }

    async fn set(&self, _key: &C, _value: V) -> Result<(), Error> {
        Ok(())
    }

    async fn set_many(&self, _entries: Vec<(C, V)>) -> Result<(), Error> {
        Ok(())
    }

    async fn delete(&self, _key: &C) -> Result<(), Error> {
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        Ok(())
    }
}
