// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Load statistics.

use std::{
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// Receives a loader's activity counts.
///
/// Every method has a no-op default, so a collector only overrides what it
/// needs. Methods are called synchronously on the loading path and must not
/// block.
pub trait StatisticsCollector: Send + Sync + Debug {
    /// A `load` call was made.
    fn record_load(&self) {}

    /// A load completed with an error.
    fn record_load_error(&self) {}

    /// A `load` call was answered from the promise cache.
    fn record_cache_hit(&self) {}

    /// A queued load was answered from the value cache.
    fn record_value_cache_hit(&self) {}

    /// The batch function was called with `keys` keys.
    fn record_batch(&self, keys: usize) {
        let _ = keys;
    }

    /// A batch function call failed as a whole.
    fn record_batch_error(&self) {}

    /// Returns a snapshot of the counts collected so far.
    fn statistics(&self) -> Statistics {
        Statistics::default()
    }
}

impl<T> StatisticsCollector for Arc<T>
where
    T: StatisticsCollector + ?Sized,
{
    fn record_load(&self) {
        (**self).record_load();
    }

    fn record_load_error(&self) {
        (**self).record_load_error();
    }

    fn record_cache_hit(&self) {
        (**self).record_cache_hit();
    }

    fn record_value_cache_hit(&self) {
        (**self).record_value_cache_hit();
    }

    fn record_batch(&self, keys: usize) {
        (**self).record_batch(keys);
    }

    fn record_batch_error(&self) {
        (**self).record_batch_error();
    }

    fn statistics(&self) -> Statistics {
        (**self).statistics()
    }
}

/// A point-in-time snapshot of a loader's counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[non_exhaustive]
pub struct Statistics {
    /// Number of `load` calls.
    pub load_count: u64,
    /// Number of loads that completed with an error.
    pub load_error_count: u64,
    /// Number of `load` calls answered from the promise cache.
    pub cache_hit_count: u64,
    /// Number of queued loads answered from the value cache.
    pub value_cache_hit_count: u64,
    /// Number of batch function calls.
    pub batch_invoke_count: u64,
    /// Number of keys passed to the batch function, across all calls.
    pub batch_load_count: u64,
    /// Number of batch function calls that failed as a whole.
    pub batch_error_count: u64,
}

impl Statistics {
    /// Fraction of `load` calls answered from the promise cache.
    #[must_use]
    pub fn cache_hit_ratio(&self) -> f64 {
        ratio(self.cache_hit_count, self.load_count)
    }

    /// Fraction of `load` calls answered from the value cache.
    #[must_use]
    pub fn value_cache_hit_ratio(&self) -> f64 {
        ratio(self.value_cache_hit_count, self.load_count)
    }

    /// Fraction of `load` calls that completed with an error.
    #[must_use]
    pub fn load_error_ratio(&self) -> f64 {
        ratio(self.load_error_count, self.load_count)
    }

    /// Average number of keys per batch function call.
    #[must_use]
    pub fn average_batch_size(&self) -> f64 {
        ratio(self.batch_load_count, self.batch_invoke_count)
    }
}

#[expect(clippy::cast_precision_loss, reason = "counts far below 2^52 in practice")]
fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// A collector that drops every count. The loader's default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStatisticsCollector;

impl StatisticsCollector for NoopStatisticsCollector {}

/// A collector that keeps every count in an atomic counter.
///
/// # Examples
///
/// ```
/// use multiflight::{SimpleStatisticsCollector, StatisticsCollector};
///
/// let collector = SimpleStatisticsCollector::new();
/// collector.record_load();
/// collector.record_cache_hit();
///
/// let stats = collector.statistics();
/// assert_eq!(stats.load_count, 1);
/// assert!((stats.cache_hit_ratio() - 1.0).abs() < f64::EPSILON);
/// ```
#[derive(Debug, Default)]
pub struct SimpleStatisticsCollector {
    load_count: AtomicU64,
    load_error_count: AtomicU64,
    cache_hit_count: AtomicU64,
    value_cache_hit_count: AtomicU64,
    batch_invoke_count: AtomicU64,
    batch_load_count: AtomicU64,
    batch_error_count: AtomicU64,
}

impl SimpleStatisticsCollector {
    /// Creates a collector with every count at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatisticsCollector for SimpleStatisticsCollector {
    fn record_load(&self) {
        self.load_count.fetch_add(1, Ordering::Relaxed);
    }

    fn record_load_error(&self) {
        self.load_error_count.fetch_add(1, Ordering::Relaxed);
    }

    fn record_cache_hit(&self) {
        self.cache_hit_count.fetch_add(1, Ordering::Relaxed);
    }

    fn record_value_cache_hit(&self) {
        self.value_cache_hit_count.fetch_add(1, Ordering::Relaxed);
    }

    fn record_batch(&self, keys: usize) {
        self.batch_invoke_count.fetch_add(1, Ordering::Relaxed);
        self.batch_load_count
            .fetch_add(u64::try_from(keys).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    fn record_batch_error(&self) {
        self.batch_error_count.fetch_add(1, Ordering::Relaxed);
    }

    fn statistics(&self) -> Statistics {
        Statistics {
            load_count: self.load_count.load(Ordering::Relaxed),
            load_error_count: self.load_error_count.load(Ordering::Relaxed),
            cache_hit_count: self.cache_hit_count.load(Ordering::Relaxed),
            value_cache_hit_count: self.value_cache_hit_count.load(Ordering::Relaxed),
            batch_invoke_count: self.batch_invoke_count.load(Ordering::Relaxed),
            batch_load_count: self.batch_load_count.load(Ordering::Relaxed),
            batch_error_count: self.batch_error_count.load(Ordering::Relaxed),
        }
    }
}
