// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Store capability and shared vocabulary for building strata cache backends.
//!
//! This crate defines the [`Store`] trait that every key/value backend must satisfy,
//! the write-time [`Options`] and [`InvalidateOptions`] configuration bags, the
//! [`TagIndexKey`] naming helper for tag-based invalidation, and the [`Error`]
//! taxonomy shared by every layer of the cache.
//!
//! # Overview
//!
//! The store abstraction separates storage concerns from orchestration. Implement
//! [`Store`] for your backend, then use `strata` to add statistics, key
//! fingerprinting, multi-tier chaining, read-through loading and metrics on top.
//!
//! # Implementing a Store
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//! use std::time::Duration;
//!
//! use strata_store::{Error, InvalidateOptions, Options, Store};
//!
//! struct SimpleStore(RwLock<HashMap<String, String>>);
//!
//! impl Store<String> for SimpleStore {
//!     async fn get(&self, key: &str) -> Result<String, Error> {
//!         self.0.read().unwrap().get(key).cloned().ok_or_else(Error::not_found)
//!     }
//!
//!     async fn get_with_ttl(&self, key: &str) -> Result<(String, Duration), Error> {
//!         Ok((self.get(key).await?, Duration::ZERO))
//!     }
//!
//!     async fn set(&self, key: &str, value: String, _options: &Options) -> Result<(), Error> {
//!         self.0.write().unwrap().insert(key.to_owned(), value);
//!         Ok(())
//!     }
//!
//!     async fn delete(&self, key: &str) -> Result<(), Error> {
//!         self.0.write().unwrap().remove(key);
//!         Ok(())
//!     }
//!
//!     async fn invalidate(&self, _options: &InvalidateOptions) -> Result<(), Error> {
//!         Ok(())
//!     }
//!
//!     async fn clear(&self) -> Result<(), Error> {
//!         self.0.write().unwrap().clear();
//!         Ok(())
//!     }
//!
//!     fn identify(&self) -> &str {
//!         "simple"
//!     }
//! }
//! ```

pub mod error;
mod options;
pub(crate) mod store;
mod tag;
#[cfg(any(feature = "test-util", test))]
pub mod testing;

#[doc(inline)]
pub use error::{BoxError, Error, Result, TierError};
#[doc(inline)]
pub use options::{InvalidateOptions, Options};
#[doc(inline)]
pub use store::Store;
#[doc(inline)]
pub use tag::{TAG_KEY_EXPIRY, TagIndexKey};
