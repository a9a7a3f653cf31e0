// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Cache tier abstractions for the `multiflight` data loader.
//!
//! A loader keeps two cache tiers:
//!
//! - A [`PromiseCache`] maps a cache identity to the in-flight or completed
//!   load for it. It is synchronous and owned by a single loader.
//!   [`InProcessPromiseCache`] is the unbounded default.
//! - A [`ValueCache`] maps a cache identity to a raw value. It is
//!   asynchronous, may live outside the process and may outlive the loader.
//!   [`NoopValueCache`] is the default and stores nothing.
//!
//! # Implementing a Value Cache
//!
//! Only the single-key methods are required. A miss is `Ok(None)`, so an
//! "empty" value is still cacheable:
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//!
//! use multiflight_tier::{Error, ValueCache};
//!
//! struct SimpleCache(RwLock<HashMap<u64, Option<String>>>);
//!
//! impl ValueCache<u64, Option<String>> for SimpleCache {
//!     async fn get(&self, key: &u64) -> Result<Option<Option<String>>, Error> {
//!         Ok(self.0.read().map_err(|e| Error::from_message(e.to_string()))?.get(key).cloned())
//!     }
//!
//!     async fn set(&self, key: &u64, value: Option<String>) -> Result<(), Error> {
//!         self.0.write().map_err(|e| Error::from_message(e.to_string()))?.insert(*key, value);
//!         Ok(())
//!     }
//!
//!     async fn delete(&self, key: &u64) -> Result<(), Error> {
//!         self.0.write().map_err(|e| Error::from_message(e.to_string()))?.remove(key);
//!         Ok(())
//!     }
//!
//!     async fn clear(&self) -> Result<(), Error> {
//!         self.0.write().map_err(|e| Error::from_message(e.to_string()))?.clear();
//!         Ok(())
//!     }
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! [`DynamicValueCache`] wraps any `ValueCache` in a clonable, type-erased
//! container. Loaders store their value cache this way so the concrete tier
//! does not leak into the loader's type.

mod dynamic;
pub mod error;
mod noop;
mod promise;
#[cfg(any(feature = "test-util", test))]
pub mod testing;
mod value;

#[doc(inline)]
pub use dynamic::{DynamicValueCache, DynamicValueCacheExt};
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use noop::NoopValueCache;
#[doc(inline)]
pub use promise::{InProcessPromiseCache, PromiseCache};
#[doc(inline)]
pub use value::ValueCache;
