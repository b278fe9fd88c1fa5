// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Multi-tier cache orchestration over pluggable stores.
//!
//! Every cache in this crate implements [`CacheInterface`], so caches compose
//! freely:
//!
//! - [`Cache`] wraps one [`Store`], converts keys with [`CacheKey`] and counts
//!   every operation in [`Stats`].
//! - [`ChainCache`] queries an ordered list of tiers and backfills the faster
//!   tiers in the background when a slower tier answers.
//! - [`LoadableCache`] loads missing values from a user function and writes them
//!   back, either inline or through a bounded queue.
//! - [`MetricCache`] walks the composition after every operation and hands each
//!   store's statistics to a [`MetricsSink`].
//!
//! # Examples
//!
//! ## Single Store
//!
//! ```
//! use strata::{Cache, CacheInterface, MemoryStore, Options};
//! # futures::executor::block_on(async {
//!
//! let cache = Cache::new(MemoryStore::<i32>::new());
//! cache.set("answer", 42, Options::new()).await?;
//! assert_eq!(cache.get("answer").await?, 42);
//! # Ok::<(), strata::Error>(())
//! # });
//! ```
//!
//! ## Read-Through Chain
//!
//! ```
//! use std::time::Duration;
//! use strata::{Cache, CacheInterface, ChainCache, LoadableCache, MemoryStore, Options};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> strata::Result<()> {
//! let chain = ChainCache::builder()
//!     .tier(Cache::new(MemoryStore::<String>::new()))
//!     .tier(Cache::new(MemoryStore::<String>::new()))
//!     .build();
//!
//! let users = LoadableCache::builder(chain, |id: &String| {
//!     let id = id.clone();
//!     async move { Ok(format!("user {id}")) }
//! })
//! .write_options(Options::new().with_expiration(Duration::from_secs(300)))
//! .synchronous_set(true)
//! .build();
//!
//! assert_eq!(users.get(&"7".to_string()).await?, "user 7");
//! users.close().await;
//! users.cache().close().await;
//! # Ok(())
//! # }
//! ```

mod cache;
mod chain;
mod codec;
mod key;
mod loadable;
mod metric;
mod propagation;
mod stats;
mod telemetry;
mod tier;

#[doc(inline)]
pub use cache::{Cache, CacheBuilder, CacheControl, CacheInterface};
#[doc(inline)]
pub use chain::{ChainCache, ChainCacheBuilder, TierId};
#[doc(inline)]
pub use codec::Codec;
#[doc(inline)]
pub use key::{CacheKey, CacheKeyGenerator, Fingerprint, fingerprint};
#[doc(inline)]
pub use loadable::{LoadFunction, LoadableCache, LoadableCacheBuilder};
#[doc(inline)]
pub use metric::{MetricCache, MetricsSink};
#[doc(inline)]
pub use propagation::{DEFAULT_QUEUE_CAPACITY, Propagator};
#[doc(inline)]
pub use stats::{Stats, StatsProvider};
#[cfg(any(feature = "metrics", test))]
#[doc(inline)]
pub use telemetry::OtelMetricsSink;
#[doc(inline)]
pub use tier::{Instrumented, Tier};

#[cfg(feature = "memory")]
#[doc(inline)]
pub use strata_memory::{MemoryStore, MemoryStoreBuilder};
#[doc(inline)]
pub use strata_store::{BoxError, Error, InvalidateOptions, Options, Result, Store, TAG_KEY_EXPIRY, TagIndexKey, TierError};

#[cfg(any(feature = "test-util", test))]
#[doc(inline)]
pub use strata_store::testing::{MockStore, StoreOp};
