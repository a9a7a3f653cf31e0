// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for [`DataLoader`].

use std::{fmt::Debug, hash::Hash, sync::Arc};

use multiflight_tier::{DynamicValueCache, InProcessPromiseCache, NoopValueCache, PromiseCache, ValueCache};
#[cfg(any(feature = "metrics", test))]
use opentelemetry::metrics::{Meter, MeterProvider};
use parking_lot::Mutex;

use crate::{
    BatchLoader, DataLoader, LoadFuture, LoaderOptions, NoopStatisticsCollector, StatisticsCollector,
    loader::{BoxPromiseCache, CacheKeyFn, LoaderInner, LoaderState},
    telemetry::{LoaderName, LoaderTelemetry},
};

const DEFAULT_NAME: LoaderName = "multiflight";

/// Configures and builds a [`DataLoader`].
///
/// Created by [`DataLoader::builder`] or [`DataLoader::builder_with_cache_key`].
/// Everything is optional: a loader built without further configuration
/// batches, caches in an unbounded [`InProcessPromiseCache`], has no value
/// cache, collects no statistics and logs through `tracing`.
///
/// # Examples
///
/// ```
/// use std::{convert::Infallible, sync::Arc};
///
/// use multiflight::{DataLoader, SimpleStatisticsCollector, batch_fn};
///
/// let statistics = Arc::new(SimpleStatisticsCollector::new());
/// let loader: DataLoader<u32, u32, _> = DataLoader::builder(batch_fn(|ids: Vec<u32>| async move {
///     Ok::<_, Infallible>(ids)
/// }))
/// .name("echo")
/// .max_batch_size(50)
/// .statistics(Arc::clone(&statistics))
/// .build();
///
/// let _ = loader.load(1);
/// assert_eq!(loader.name(), "echo");
/// assert_eq!(loader.statistics().load_count, 1);
/// ```
pub struct LoaderBuilder<K, V, B, C = K> {
    batch_loader: B,
    cache_key: CacheKeyFn<K, C>,
    name: LoaderName,
    options: LoaderOptions,
    promise_cache: Option<BoxPromiseCache<C, V>>,
    value_cache: Option<DynamicValueCache<C, V>>,
    statistics: Option<Arc<dyn StatisticsCollector>>,
    #[cfg(any(feature = "metrics", test))]
    meter: Option<Meter>,
}

impl<K, V, B, C> LoaderBuilder<K, V, B, C>
where
    K: Send + 'static,
    V: Clone + Send + Sync + 'static,
    B: BatchLoader<K, V> + 'static,
    C: Clone + Eq + Hash + Send + Sync + 'static,
{
    pub(crate) fn new(batch_loader: B, cache_key: CacheKeyFn<K, C>) -> Self {
        Self {
            batch_loader,
            cache_key,
            name: DEFAULT_NAME,
            options: LoaderOptions::default(),
            promise_cache: None,
            value_cache: None,
            statistics: None,
            #[cfg(any(feature = "metrics", test))]
            meter: None,
        }
    }

    /// Sets the name the loader reports its activity under.
    #[must_use]
    pub fn name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Replaces every option at once.
    #[must_use]
    pub fn options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets whether loads are queued until dispatch.
    #[must_use]
    pub fn batching(mut self, enabled: bool) -> Self {
        self.options = self.options.with_batching(enabled);
        self
    }

    /// Sets whether loads are memoized and the value cache consulted.
    #[must_use]
    pub fn caching(mut self, enabled: bool) -> Self {
        self.options = self.options.with_caching(enabled);
        self
    }

    /// Caps the keys per batch loader call. Zero removes the cap.
    #[must_use]
    pub fn max_batch_size(mut self, max: usize) -> Self {
        self.options = self.options.with_max_batch_size(max);
        self
    }

    /// Sets whether loader activity is logged through `tracing`.
    #[must_use]
    pub fn logs(mut self, enabled: bool) -> Self {
        self.options = self.options.with_logging(enabled);
        self
    }

    /// Replaces the default unbounded promise cache.
    #[must_use]
    pub fn promise_cache(mut self, cache: impl PromiseCache<C, LoadFuture<V>> + 'static) -> Self {
        self.promise_cache = Some(Box::new(cache));
        self
    }

    /// Adds a second-tier value cache.
    #[must_use]
    pub fn value_cache(mut self, cache: impl ValueCache<C, V> + 'static) -> Self {
        self.value_cache = Some(DynamicValueCache::new(cache));
        self
    }

    /// Sets the collector that receives load statistics.
    ///
    /// Pass an `Arc` to keep a handle for reading the collector directly.
    #[must_use]
    pub fn statistics(mut self, collector: impl StatisticsCollector + 'static) -> Self {
        self.statistics = Some(Arc::new(collector));
        self
    }

    /// Enables the `loader.event.count` counter on the given meter provider.
    #[cfg(any(feature = "metrics", test))]
    #[must_use]
    pub fn metrics(mut self, provider: &dyn MeterProvider) -> Self {
        self.meter = Some(crate::telemetry::metrics::create_meter(provider));
        self
    }

    /// Builds the loader.
    #[must_use]
    pub fn build(self) -> DataLoader<K, V, B, C> {
        let telemetry = LoaderTelemetry::new(self.options.logging_enabled);
        #[cfg(any(feature = "metrics", test))]
        let telemetry = match &self.meter {
            Some(meter) => telemetry.with_meter(meter),
            None => telemetry,
        };

        DataLoader::from_inner(LoaderInner {
            name: self.name,
            options: self.options,
            batch_loader: self.batch_loader,
            cache_key: self.cache_key,
            value_cache: self
                .value_cache
                .unwrap_or_else(|| DynamicValueCache::new(NoopValueCache::new())),
            state: Mutex::new(LoaderState::new(
                self.promise_cache
                    .unwrap_or_else(|| Box::new(InProcessPromiseCache::new())),
            )),
            statistics: self.statistics.unwrap_or_else(|| Arc::new(NoopStatisticsCollector)),
            telemetry,
        })
    }
}

impl<K, V, B, C> Debug for LoaderBuilder<K, V, B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderBuilder")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("custom_promise_cache", &self.promise_cache.is_some())
            .field("value_cache", &self.value_cache.is_some())
            .finish_non_exhaustive()
    }
}
