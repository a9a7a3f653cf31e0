// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Coalesces keyed async loads into batched fetches, with a two-tier cache.
//!
//! A [`DataLoader`] hands out a [`LoadFuture`] for every [`load`](DataLoader::load)
//! and queues the key. A later [`dispatch`](DataLoader::dispatch) passes
//! every queued key to a [`BatchLoader`] in one call and completes each
//! handle from the result at its position.
//!
//! - Loads of the same cache identity share one handle while caching is
//!   enabled, so every key is fetched at most once until it is cleared.
//! - Failed loads are evicted, so they are retried by the next load.
//! - An optional second-tier [`ValueCache`] answers queued keys before the
//!   batch loader is called and receives every loaded value.
//!
//! # Examples
//!
//! ```
//! use std::convert::Infallible;
//!
//! use multiflight::{DataLoader, batch_fn};
//! # futures::executor::block_on(async {
//!
//! let loader: DataLoader<String, String, _> = DataLoader::new(batch_fn(|keys: Vec<String>| async move {
//!     Ok::<_, Infallible>(keys.iter().map(|k| k.to_uppercase()).collect::<Vec<_>>())
//! }));
//!
//! let a = loader.load("a".to_string());
//! let b = loader.load("b".to_string());
//! let again = loader.load("a".to_string());
//! assert!(a.same_as(&again));
//!
//! loader.dispatch().await;
//! assert_eq!(a.await?, "A");
//! assert_eq!(b.await?, "B");
//! # Ok::<(), multiflight::Error>(())
//! # });
//! ```
//!
//! ## Value Cache
//!
//! ```
//! use std::convert::Infallible;
//!
//! use multiflight::{DataLoader, batch_fn};
//! use multiflight_memory::InMemoryValueCache;
//! use multiflight_tier::ValueCache;
//! # futures::executor::block_on(async {
//!
//! let shared = InMemoryValueCache::<u32, String>::with_capacity(1_000);
//! shared.set(&7, "cached".to_string()).await?;
//!
//! let loader: DataLoader<u32, String, _> = DataLoader::builder(batch_fn(|ids: Vec<u32>| async move {
//!     Ok::<_, Infallible>(ids.iter().map(|id| format!("loaded-{id}")).collect::<Vec<_>>())
//! }))
//! .value_cache(shared.clone())
//! .build();
//!
//! let cached = loader.load(7);
//! let loaded = loader.load(8);
//! loader.dispatch().await;
//!
//! assert_eq!(cached.await.unwrap(), "cached");
//! assert_eq!(loaded.await.unwrap(), "loaded-8");
//! assert_eq!(shared.get(&8).await?, Some("loaded-8".to_string()));
//! # Ok::<(), multiflight_tier::Error>(())
//! # });
//! ```
//!
//! # Features
//!
//! - `logs` (default): structured `loader.event` logs through `tracing`.
//! - `metrics`: an OpenTelemetry `loader.event.count` counter, enabled with
//!   [`LoaderBuilder::metrics`].
//! - `serde`: `Serialize`/`Deserialize` for [`LoaderOptions`] and `Serialize`
//!   for [`Statistics`].
//! - `test-util`: enables `multiflight_tier::testing`.

mod batch;
mod builder;
pub mod error;
mod future;
mod loader;
mod options;
mod stats;
mod telemetry;

#[doc(inline)]
pub use batch::{BatchFn, BatchLoader, MappedBatchFn, TryBatchFn, batch_fn, mapped_batch_fn, try_batch_fn};
#[doc(inline)]
pub use builder::LoaderBuilder;
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use future::{DispatchFuture, LoadFuture, LoadManyFuture};
#[doc(inline)]
pub use loader::DataLoader;
#[doc(inline)]
pub use multiflight_tier::{
    DynamicValueCache, Error as TierError, InProcessPromiseCache, NoopValueCache, PromiseCache, ValueCache,
};
#[doc(inline)]
pub use options::LoaderOptions;
#[doc(inline)]
pub use stats::{NoopStatisticsCollector, SimpleStatisticsCollector, Statistics, StatisticsCollector};
