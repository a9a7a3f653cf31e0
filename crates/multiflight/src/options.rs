// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Construction-time switches of a loader.

use std::num::NonZeroUsize;

/// Switches that change how a loader batches and caches.
///
/// The defaults batch every load until [`dispatch`](crate::DataLoader::dispatch),
/// memoize every load in the promise cache, place no limit on batch size and
/// emit logs.
///
/// With the `serde` feature the options can be read from configuration;
/// missing fields take their default.
///
/// # Examples
///
/// ```
/// use multiflight::LoaderOptions;
///
/// let options = LoaderOptions::default()
///     .with_caching(false)
///     .with_max_batch_size(100);
///
/// assert!(options.batching_enabled);
/// assert!(!options.caching_enabled);
/// assert_eq!(options.max_batch_size.map(|n| n.get()), Some(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
pub struct LoaderOptions {
    /// Queue loads until dispatch. When off, each load fetches its own key
    /// as soon as it is awaited.
    pub batching_enabled: bool,

    /// Memoize loads by cache identity, and consult the value cache.
    pub caching_enabled: bool,

    /// The most keys passed to a single batch function call. A larger queue
    /// is split into several concurrent calls.
    pub max_batch_size: Option<NonZeroUsize>,

    /// Emit a log event for each loader activity.
    pub logging_enabled: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            batching_enabled: true,
            caching_enabled: true,
            max_batch_size: None,
            logging_enabled: true,
        }
    }
}

impl LoaderOptions {
    /// Sets whether loads are queued until dispatch.
    #[must_use]
    pub fn with_batching(self, enabled: bool) -> Self {
        Self {
            batching_enabled: enabled,
            ..self
        }
    }

    /// Sets whether loads are memoized.
    #[must_use]
    pub fn with_caching(self, enabled: bool) -> Self {
        Self {
            caching_enabled: enabled,
            ..self
        }
    }

    /// Caps the keys per batch function call. Zero removes the cap.
    #[must_use]
    pub fn with_max_batch_size(self, max: usize) -> Self {
        Self {
            max_batch_size: NonZeroUsize::new(max),
            ..self
        }
    }

    /// Sets whether loader activity is logged.
    #[must_use]
    pub fn with_logging(self, enabled: bool) -> Self {
        Self {
            logging_enabled: enabled,
            ..self
        }
    }
}
