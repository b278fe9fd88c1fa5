// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-memory store backed by moka.
//!
//! This crate provides [`MemoryStore`], a concurrent in-memory [`Store`](strata_store::Store)
//! using moka's `TinyLFU` eviction. It honours every field of
//! [`Options`](strata_store::Options): per-entry expiration, cost as eviction
//! weight, and tags for group invalidation. Use [`MemoryStoreBuilder`] to
//! configure capacity and default options without exposing moka types.
//!
//! # Quick Start
//!
//! ```
//! use std::time::Duration;
//! use strata_memory::MemoryStore;
//! use strata_store::{InvalidateOptions, Options, Store};
//!
//! # futures::executor::block_on(async {
//! let store = MemoryStore::<String>::builder().max_capacity(1000).build();
//!
//! let options = Options::new().with_expiration(Duration::from_secs(300)).with_tags(["users"]);
//! store.set("user:1", "alice".to_string(), &options).await?;
//! assert_eq!(store.get("user:1").await?, "alice");
//!
//! store.invalidate(&InvalidateOptions::new().with_tags(["users"])).await?;
//! assert!(store.get("user:1").await.unwrap_err().is_not_found());
//! # Ok::<(), strata_store::Error>(())
//! # });
//! ```

pub mod builder;
pub mod store;

#[doc(inline)]
pub use builder::MemoryStoreBuilder;
#[doc(inline)]
pub use store::{MEMORY_LABEL, MemoryStore};
