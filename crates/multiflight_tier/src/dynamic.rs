// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Dynamic value cache wrapper for type erasure.

use std::{fmt::Debug, sync::Arc};

use crate::{Error, ValueCache, value::DynValueCache};

/// Extension trait for converting any `ValueCache` into a `DynamicValueCache`.
///
/// This trait is automatically implemented for all types that implement `ValueCache`.
///
/// # Examples
///
/// ```
/// use multiflight_tier::{DynamicValueCache, DynamicValueCacheExt, NoopValueCache};
///
/// let dynamic: DynamicValueCache<String, i32> = NoopValueCache::new().into_dynamic();
/// ```
pub trait DynamicValueCacheExt<C, V>: Sized {
    /// Converts this value cache into a `DynamicValueCache`.
    fn into_dynamic(self) -> DynamicValueCache<C, V>;
}

impl<C, V, T> DynamicValueCacheExt<C, V> for T
where
    C: Send + Sync + 'static,
    V: Send + 'static,
    T: ValueCache<C, V> + 'static,
{
    fn into_dynamic(self) -> DynamicValueCache<C, V> {
        DynamicValueCache::new(self)
    }
}

/// A clonable value cache with type erasure.
///
/// `DynamicValueCache` wraps a trait object in an `Arc` so a loader can hold
/// any value cache without carrying its concrete type. Bulk operations are
/// forwarded to the wrapped cache, so native bulk primitives are preserved.
pub struct DynamicValueCache<C, V>(Arc<DynValueCache<'static, C, V>>);

impl<C, V> DynamicValueCache<C, V>
where
    C: Send + Sync + 'static,
    V: Send + 'static,
{
    /// Creates a new dynamic value cache from any `ValueCache` implementation.
    pub fn new<T>(cache: T) -> Self
    where
        T: ValueCache<C, V> + 'static,
    {
        Self(DynValueCache::new_arc(cache))
    }
}

impl<C, V> Debug for DynamicValueCache<C, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicValueCache").finish()
    }
}

impl<C, V> Clone for DynamicValueCache<C, V> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<C, V> ValueCache<C, V> for DynamicValueCache<C, V>
where
    C: Send + Sync + 'static,
    V: Send + 'static,
{
    async fn get(&self, key: &C) -> Result<Option<V>, Error> {
        self.0.get(key).await
    }

    async fn get_many(&self, keys: &[C]) -> Vec<Result<Option<V>, Error>> {
        self.0.get_many(keys).await
    }

    async fn set(&self, key: &C, value: V) -> Result<(), Error> {
        self.0.set(key, value).await
    }

    async fn set_many(&self, entries: Vec<(C, V)>) -> Result<(), Error> {
        self.0.set_many(entries).await
    }

    async fn delete(&self, key: &C) -> Result<(), Error> {
        self.0.delete(key).await
    }

    async fn clear(&self) -> Result<(), Error> {
        self.0.clear().await
    }
}
