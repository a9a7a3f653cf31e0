// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-memory cache tiers backed by moka.
//!
//! This crate provides [`InMemoryValueCache`], a concurrent value cache, and
//! [`BoundedPromiseCache`], a promise cache with eviction. Both use moka's
//! `TinyLFU` eviction and are configured through [`InMemoryCacheBuilder`]
//! without exposing moka types.
//!
//! # Quick Start
//!
//! ```
//! use multiflight_memory::InMemoryCacheBuilder;
//! use multiflight_tier::ValueCache;
//! use std::time::Duration;
//!
//! # futures::executor::block_on(async {
//! let cache = InMemoryCacheBuilder::<String, i32>::new()
//!     .max_capacity(1000)
//!     .time_to_live(Duration::from_secs(300))
//!     .build();
//!
//! cache.set(&"key".to_string(), 42).await?;
//! assert_eq!(cache.get(&"key".to_string()).await?, Some(42));
//! # Ok::<(), multiflight_tier::Error>(())
//! # });
//! ```

pub mod builder;
pub mod promise;
pub mod value;

#[doc(inline)]
pub use builder::InMemoryCacheBuilder;
#[doc(inline)]
pub use promise::BoundedPromiseCache;
#[doc(inline)]
pub use value::InMemoryValueCache;
