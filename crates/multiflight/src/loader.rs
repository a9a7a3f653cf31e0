// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The data loader: load coalescing, dispatch and the promise cache.

use std::{
    fmt::Debug,
    hash::Hash,
    mem,
    num::NonZeroUsize,
    sync::{Arc, Weak},
};

use futures::{
    FutureExt,
    executor::block_on,
    future::{join_all, try_join_all},
};
use multiflight_tier::{DynamicValueCache, PromiseCache, ValueCache};
use parking_lot::Mutex;

use crate::{
    BatchLoader, DispatchFuture, Error, LoadFuture, LoadManyFuture, LoaderBuilder, LoaderOptions, Statistics,
    StatisticsCollector,
    future::Promise,
    telemetry::{LoaderActivity, LoaderName, LoaderTelemetry},
};

pub(crate) type CacheKeyFn<K, C> = Arc<dyn Fn(&K) -> C + Send + Sync>;

pub(crate) type BoxPromiseCache<C, V> = Box<dyn PromiseCache<C, LoadFuture<V>>>;

/// Coalesces keyed loads into batched calls of a [`BatchLoader`].
///
/// Each [`load`](Self::load) returns a [`LoadFuture`] right away. With
/// batching enabled the key is queued, and the next [`dispatch`](Self::dispatch)
/// passes every queued key to the batch loader in a single call, in the order
/// they were queued. With caching enabled the handle is memoized under the
/// key's cache identity, so loading the same identity again returns the same
/// handle until it is [cleared](Self::clear).
///
/// A loader is cheap to clone; clones share their queue and caches.
///
/// # Cache tiers
///
/// The first tier is the promise cache, holding in-flight and completed
/// handles ([`InProcessPromiseCache`](multiflight_tier::InProcessPromiseCache)
/// by default). The optional second tier is a [`ValueCache`] holding raw
/// values. It is consulted for the queued keys right before the batch loader
/// is called, and successfully loaded values are written back to it. Value
/// cache faults are logged and otherwise treated as misses.
///
/// # Failures
///
/// A failure of the batch loader as a whole fails every key of that call.
/// Failures of individual keys fail only those keys. Either way the failed
/// handles are evicted from the promise cache so that a later load retries.
///
/// # Examples
///
/// ```
/// use std::convert::Infallible;
///
/// use multiflight::{DataLoader, batch_fn};
/// # futures::executor::block_on(async {
///
/// let loader: DataLoader<u32, u32, _> = DataLoader::new(batch_fn(|ids: Vec<u32>| async move {
///     Ok::<_, Infallible>(ids.iter().map(|id| id * 10).collect::<Vec<_>>())
/// }));
///
/// let first = loader.load(1);
/// let second = loader.load(2);
/// assert_eq!(loader.dispatch_depth(), 2);
///
/// let results = loader.dispatch().await;
/// assert_eq!(results.len(), 2);
/// assert_eq!(first.await?, 10);
/// assert_eq!(second.await?, 20);
/// # Ok::<(), multiflight::Error>(())
/// # });
/// ```
pub struct DataLoader<K, V, B, C = K> {
    inner: Arc<LoaderInner<K, V, B, C>>,
}

pub(crate) struct LoaderInner<K, V, B, C> {
    pub(crate) name: LoaderName,
    pub(crate) options: LoaderOptions,
    pub(crate) batch_loader: B,
    pub(crate) cache_key: CacheKeyFn<K, C>,
    pub(crate) value_cache: DynamicValueCache<C, V>,
    pub(crate) state: Mutex<LoaderState<K, V, C>>,
    pub(crate) statistics: Arc<dyn StatisticsCollector>,
    pub(crate) telemetry: LoaderTelemetry,
}

pub(crate) struct LoaderState<K, V, C> {
    queue: Vec<Queued<K, V, C>>,
    promises: BoxPromiseCache<C, V>,
}

impl<K, V, C> LoaderState<K, V, C> {
    pub(crate) fn new(promises: BoxPromiseCache<C, V>) -> Self {
        Self {
            queue: Vec::new(),
            promises,
        }
    }
}

struct Queued<K, V, C> {
    key: K,
    identity: C,
    promise: Promise<V>,
}

impl<K, V, B> DataLoader<K, V, B, K>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    B: BatchLoader<K, V> + 'static,
{
    /// Creates a loader with default options, keyed by the load key itself.
    #[must_use]
    pub fn new(batch_loader: B) -> Self {
        Self::builder(batch_loader).build()
    }

    /// Starts building a loader keyed by the load key itself.
    #[must_use]
    pub fn builder(batch_loader: B) -> LoaderBuilder<K, V, B, K> {
        LoaderBuilder::new(batch_loader, Arc::new(K::clone))
    }
}

impl<K, V, B, C> DataLoader<K, V, B, C>
where
    K: Send + 'static,
    V: Clone + Send + Sync + 'static,
    B: BatchLoader<K, V> + 'static,
    C: Clone + Eq + Hash + Send + Sync + 'static,
{
    /// Starts building a loader whose cache identity is derived from the load
    /// key by `cache_key`.
    ///
    /// Use this when load keys are not usable as cache keys themselves. Keys
    /// that name the same entity must map to equal identities.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::convert::Infallible;
    ///
    /// use multiflight::{DataLoader, batch_fn};
    ///
    /// #[derive(Debug)]
    /// struct Query {
    ///     table: &'static str,
    ///     id: u32,
    /// }
    ///
    /// let loader: DataLoader<Query, String, _, (&str, u32)> = DataLoader::builder_with_cache_key(
    ///     batch_fn(|queries: Vec<Query>| async move {
    ///         Ok::<_, Infallible>(queries.iter().map(|q| format!("{}/{}", q.table, q.id)).collect::<Vec<_>>())
    ///     }),
    ///     |query: &Query| (query.table, query.id),
    /// )
    /// .build();
    ///
    /// let first = loader.load(Query { table: "users", id: 1 });
    /// let again = loader.load(Query { table: "users", id: 1 });
    /// assert!(first.same_as(&again));
    /// ```
    #[must_use]
    pub fn builder_with_cache_key(
        batch_loader: B,
        cache_key: impl Fn(&K) -> C + Send + Sync + 'static,
    ) -> LoaderBuilder<K, V, B, C> {
        LoaderBuilder::new(batch_loader, Arc::new(cache_key))
    }

    pub(crate) fn from_inner(inner: LoaderInner<K, V, B, C>) -> Self {
        Self { inner: Arc::new(inner) }
    }

    /// Loads the value for `key`.
    ///
    /// With batching enabled the key is queued until the next
    /// [`dispatch`](Self::dispatch). With batching disabled the returned
    /// handle fetches the key on its own, but only once it is first polled:
    /// nothing is fetched at `load` time, and a handle that is never polled
    /// never reaches the batch loader.
    ///
    /// With caching enabled, a handle already cached for the key's identity
    /// is returned instead, and nothing is queued.
    pub fn load(&self, key: K) -> LoadFuture<V> {
        let inner = &self.inner;
        inner.statistics.record_load();
        let identity = (inner.cache_key)(&key);
        let caching = inner.options.caching_enabled;
        let batching = inner.options.batching_enabled;

        let mut state = inner.state.lock();

        let cached = if caching { state.promises.get(&identity) } else { None };
        if let Some(cached) = cached {
            drop(state);
            inner.statistics.record_cache_hit();
            inner.telemetry.record(inner.name, LoaderActivity::CacheHit, 1);
            return cached;
        }

        let future = if batching {
            let (promise, future) = LoadFuture::pending();
            state.queue.push(Queued {
                key,
                identity: identity.clone(),
                promise,
            });
            future
        } else {
            let loader = Arc::downgrade(inner);
            let identity = identity.clone();
            LoadFuture::deferred(move |promise| run_immediate(loader, Queued { key, identity, promise }))
        };

        if caching {
            state.promises.set(identity, future.clone());
        }
        drop(state);

        if batching {
            inner.telemetry.record(inner.name, LoaderActivity::Queued, 1);
        }
        future
    }

    /// Loads the values for many keys, preserving their order.
    ///
    /// The returned future fails with the first failure among the keys.
    pub fn load_many(&self, keys: impl IntoIterator<Item = K>) -> LoadManyFuture<V> {
        let futures: Vec<_> = keys.into_iter().map(|key| self.load(key)).collect();
        try_join_all(futures).boxed()
    }

    /// Drains the queue and fetches every drained key.
    ///
    /// The queue is emptied when this is called, not when the returned future
    /// is first polled: loads made afterwards go to the next dispatch. The
    /// future resolves to one result per drained key, in queue order, once
    /// every key has been answered by the value cache or the batch loader.
    ///
    /// Dropping the future before it completes fails every load it still
    /// owes with [`ErrorKind::Abandoned`](crate::ErrorKind::Abandoned).
    pub fn dispatch(&self) -> DispatchFuture<V> {
        let queued = mem::take(&mut self.inner.state.lock().queue);
        if queued.is_empty() {
            return futures::future::ready(Vec::new()).boxed();
        }

        let count = queued.len();
        self.inner.telemetry.record(self.inner.name, LoaderActivity::Dispatched, count);

        let batches: Vec<_> = chunks(queued, self.inner.options.max_batch_size)
            .into_iter()
            .map(|chunk| Batch::new(Arc::clone(&self.inner), chunk, true))
            .collect();

        async move {
            join_all(batches.into_iter().map(Batch::run))
                .await
                .into_iter()
                .flatten()
                .collect()
        }
        .boxed()
    }

    /// Dispatches on the current thread until the queue stays empty.
    ///
    /// Loads queued while a dispatch is running, for instance by the batch
    /// loader itself, are picked up by the following round. Returns every
    /// result in dispatch order.
    ///
    /// # Panics
    ///
    /// Panics if called from within another `futures::executor` executor.
    pub fn dispatch_and_join(&self) -> Vec<Result<V, Error>> {
        let mut results = Vec::new();
        while self.dispatch_depth() > 0 {
            results.extend(block_on(self.dispatch()));
        }
        results
    }

    /// Returns the number of queued keys.
    #[must_use]
    pub fn dispatch_depth(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Removes the promise cache entry for `key`.
    ///
    /// The next load of `key` is queued again. The value cache is left
    /// untouched; use [`purge`](Self::purge) to remove the key from both.
    pub fn clear(&self, key: &K) -> &Self {
        let identity = (self.inner.cache_key)(key);
        self.inner.state.lock().promises.delete(&identity);
        self.inner.telemetry.record(self.inner.name, LoaderActivity::Cleared, 1);
        self
    }

    /// Empties the promise cache.
    pub fn clear_all(&self) -> &Self {
        self.inner.state.lock().promises.clear();
        self.inner.telemetry.record(self.inner.name, LoaderActivity::Cleared, 0);
        self
    }

    /// Caches `value` for `key` unless the key already has an entry.
    ///
    /// Does nothing when caching is disabled.
    pub fn prime(&self, key: &K, value: V) -> &Self {
        self.prime_result(key, Ok(value))
    }

    /// Caches a failure for `key` unless the key already has an entry.
    ///
    /// Loads of `key` fail with [`ErrorKind::Primed`](crate::ErrorKind::Primed)
    /// carrying `cause`, until the key is cleared.
    pub fn prime_error(&self, key: &K, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> &Self {
        self.prime_result(key, Err(Error::primed(cause)))
    }

    fn prime_result(&self, key: &K, result: Result<V, Error>) -> &Self {
        if !self.inner.options.caching_enabled {
            return self;
        }

        let identity = (self.inner.cache_key)(key);
        let primed = {
            let mut state = self.inner.state.lock();
            if state.promises.contains_key(&identity) {
                false
            } else {
                state.promises.set(identity, LoadFuture::ready(result));
                true
            }
        };

        if primed {
            self.inner.telemetry.record(self.inner.name, LoaderActivity::Primed, 1);
        }
        self
    }

    /// Removes `key` from the promise cache and from the value cache.
    ///
    /// # Errors
    ///
    /// Returns the value cache's error if deleting from it fails. The promise
    /// cache entry is removed either way.
    pub async fn purge(&self, key: &K) -> Result<(), multiflight_tier::Error> {
        let identity = (self.inner.cache_key)(key);
        self.inner.state.lock().promises.delete(&identity);
        self.inner.telemetry.record(self.inner.name, LoaderActivity::Purged, 1);
        self.inner.value_cache.delete(&identity).await
    }

    /// Empties the promise cache and the value cache.
    ///
    /// # Errors
    ///
    /// Returns the value cache's error if clearing it fails. The promise cache
    /// is emptied either way.
    pub async fn purge_all(&self) -> Result<(), multiflight_tier::Error> {
        self.inner.state.lock().promises.clear();
        self.inner.telemetry.record(self.inner.name, LoaderActivity::Purged, 0);
        self.inner.value_cache.clear().await
    }

    /// Returns the cache identity of `key`.
    #[must_use]
    pub fn cache_key(&self, key: &K) -> C {
        (self.inner.cache_key)(key)
    }

    /// Returns a snapshot of the configured statistics collector.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        self.inner.statistics.statistics()
    }

    /// Returns the loader's name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Returns the loader's options.
    #[must_use]
    pub fn options(&self) -> &LoaderOptions {
        &self.inner.options
    }
}

impl<K, V, B, C> Clone for DataLoader<K, V, B, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, B, C> Debug for DataLoader<K, V, B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataLoader")
            .field("name", &self.inner.name)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

/// Fetches a single key for a loader with batching disabled.
async fn run_immediate<K, V, B, C>(loader: Weak<LoaderInner<K, V, B, C>>, queued: Queued<K, V, C>) -> Result<V, Error>
where
    K: Send + 'static,
    V: Clone + Send + Sync + 'static,
    B: BatchLoader<K, V> + 'static,
    C: Clone + Eq + Hash + Send + Sync + 'static,
{
    let Some(loader) = loader.upgrade() else {
        return Err(Error::abandoned());
    };

    // The handle owns this batch; if it is dropped nothing else refers to the
    // cache entry, so there is nothing to evict.
    Batch::new(loader, vec![queued], false)
        .run()
        .await
        .into_iter()
        .next()
        .unwrap_or_else(|| Err(Error::abandoned()))
}

/// Splits a drained queue into consecutive chunks of at most `max` entries.
fn chunks<T>(mut queued: Vec<T>, max: Option<NonZeroUsize>) -> Vec<Vec<T>> {
    let size = max.map_or(queued.len(), NonZeroUsize::get);
    let mut chunks = Vec::with_capacity(queued.len().div_ceil(size));
    while queued.len() > size {
        let rest = queued.split_off(size);
        chunks.push(mem::replace(&mut queued, rest));
    }
    chunks.push(queued);
    chunks
}

/// One call's worth of drained loads.
///
/// Every promise is completed exactly once: by `run`, or with
/// [`ErrorKind::Abandoned`](crate::ErrorKind::Abandoned) when the batch is
/// dropped first.
struct Batch<K, V, B, C> {
    loader: Arc<LoaderInner<K, V, B, C>>,
    keys: Vec<K>,
    identities: Vec<C>,
    ids: Vec<u64>,
    promises: Vec<Option<Promise<V>>>,
    results: Vec<Option<Result<V, Error>>>,
    evict_on_drop: bool,
}

impl<K, V, B, C> Batch<K, V, B, C>
where
    K: Send + 'static,
    V: Clone + Send + Sync + 'static,
    B: BatchLoader<K, V> + 'static,
    C: Clone + Eq + Hash + Send + Sync + 'static,
{
    fn new(loader: Arc<LoaderInner<K, V, B, C>>, queued: Vec<Queued<K, V, C>>, evict_on_drop: bool) -> Self {
        let len = queued.len();
        let mut batch = Self {
            loader,
            keys: Vec::with_capacity(len),
            identities: Vec::with_capacity(len),
            ids: Vec::with_capacity(len),
            promises: Vec::with_capacity(len),
            results: Vec::with_capacity(len),
            evict_on_drop,
        };

        for Queued { key, identity, promise } in queued {
            batch.keys.push(key);
            batch.identities.push(identity);
            batch.ids.push(promise.id());
            batch.promises.push(Some(promise));
            batch.results.push(None);
        }
        batch
    }

    async fn run(mut self) -> Vec<Result<V, Error>> {
        let caching = self.loader.options.caching_enabled;

        if caching {
            self.read_value_cache().await;
        }

        let misses: Vec<usize> = (0..self.results.len()).filter(|&i| self.results[i].is_none()).collect();
        if !misses.is_empty() {
            let keys: Vec<K> = mem::take(&mut self.keys)
                .into_iter()
                .zip(&self.results)
                .filter(|(_, result)| result.is_none())
                .map(|(key, _)| key)
                .collect();

            let loaded = self.fetch(keys, &misses).await;

            if caching && !loaded.is_empty() {
                self.write_value_cache(loaded).await;
            }
        }

        self.results
            .iter_mut()
            .map(|result| result.take().unwrap_or_else(|| Err(Error::abandoned())))
            .collect()
    }

    /// Completes every key the value cache holds.
    async fn read_value_cache(&mut self) {
        let lookups = self.loader.value_cache.get_many(&self.identities).await;
        if lookups.len() != self.identities.len() {
            self.record(LoaderActivity::ValueCacheError, self.identities.len());
            return;
        }

        let mut hits = 0;
        let mut faults = 0;
        for (index, lookup) in lookups.into_iter().enumerate() {
            match lookup {
                Ok(Some(value)) => {
                    hits += 1;
                    self.loader.statistics.record_value_cache_hit();
                    self.complete(index, Ok(value));
                }
                Ok(None) => {}
                Err(_) => faults += 1,
            }
        }

        if hits > 0 {
            self.record(LoaderActivity::ValueCacheHit, hits);
        }
        if faults > 0 {
            self.record(LoaderActivity::ValueCacheError, faults);
        }
    }

    /// Calls the batch loader for `keys`, found at positions `misses`, and
    /// returns the successfully loaded entries.
    async fn fetch(&mut self, keys: Vec<K>, misses: &[usize]) -> Vec<(C, V)> {
        let loader = Arc::clone(&self.loader);
        loader.statistics.record_batch(keys.len());

        let values = match loader.batch_loader.load(keys).await {
            Ok(values) if values.len() == misses.len() => values,
            Ok(values) => {
                self.record(LoaderActivity::LengthMismatch, misses.len());
                self.fail_all(misses, &Error::length_mismatch(misses.len(), values.len()));
                return Vec::new();
            }
            Err(error) => {
                self.record(LoaderActivity::BatchFailed, misses.len());
                self.fail_all(misses, &error);
                return Vec::new();
            }
        };

        self.record(LoaderActivity::BatchLoaded, misses.len());

        // Failed handles leave the promise cache before any waiter wakes.
        let failed: Vec<usize> = misses
            .iter()
            .zip(&values)
            .filter(|(_, value)| value.is_err())
            .map(|(&index, _)| index)
            .collect();
        if !failed.is_empty() {
            self.record(LoaderActivity::KeyFailed, failed.len());
            self.evict(&failed);
        }

        let mut loaded = Vec::with_capacity(misses.len() - failed.len());
        for (&index, value) in misses.iter().zip(values) {
            if let Ok(value) = &value {
                loaded.push((self.identities[index].clone(), value.clone()));
            }
            self.complete(index, value);
        }
        loaded
    }

    async fn write_value_cache(&mut self, loaded: Vec<(C, V)>) {
        let count = loaded.len();
        if self.loader.value_cache.set_many(loaded).await.is_err() {
            self.record(LoaderActivity::ValueCacheError, count);
        }
    }

    fn fail_all(&mut self, indices: &[usize], error: &Error) {
        self.loader.statistics.record_batch_error();
        self.evict(indices);
        for &index in indices {
            self.complete(index, Err(error.clone()));
        }
    }
}

impl<K, V, B, C> Batch<K, V, B, C>
where
    V: Clone,
{
    fn complete(&mut self, index: usize, result: Result<V, Error>) {
        if result.is_err() {
            self.loader.statistics.record_load_error();
        }
        if let Some(promise) = self.promises[index].take() {
            promise.complete(result.clone());
        }
        self.results[index] = Some(result);
    }
}

impl<K, V, B, C> Batch<K, V, B, C> {
    /// Removes failed handles from the promise cache, unless a newer handle
    /// has replaced them in the meantime. Called before the failures are
    /// completed.
    fn evict(&self, indices: &[usize]) {
        let mut state = self.loader.state.lock();
        for &index in indices {
            let identity = &self.identities[index];
            let current = state.promises.get(identity);
            if current.is_some_and(|future| future.id() == self.ids[index]) {
                state.promises.delete(identity);
            }
        }
    }

    fn record(&self, activity: LoaderActivity, count: usize) {
        self.loader.telemetry.record(self.loader.name, activity, count);
    }
}

impl<K, V, B, C> Drop for Batch<K, V, B, C> {
    fn drop(&mut self) {
        let abandoned: Vec<usize> = (0..self.promises.len()).filter(|&i| self.promises[i].is_some()).collect();
        if abandoned.is_empty() {
            return;
        }

        if self.evict_on_drop {
            self.evict(&abandoned);
        }

        for &index in &abandoned {
            if let Some(promise) = self.promises[index].take() {
                self.loader.statistics.record_load_error();
                promise.complete(Err(Error::abandoned()));
            }
        }
        self.record(LoaderActivity::Abandoned, abandoned.len());
    }
}
