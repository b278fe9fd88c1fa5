// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Statistics-tracking wrapper around a single store.

use std::marker::PhantomData;
use std::time::Duration;

use parking_lot::Mutex;
use strata_store::{InvalidateOptions, Options, Result, Store};

use crate::stats::{Stats, StatsProvider};

/// Wraps one [`Store`] and counts the outcome of every call.
///
/// Results pass through untouched. Reads count as hits when the store returns a
/// value and as misses otherwise, not-found and faults alike; every other family
/// counts success and error separately.
///
/// # Examples
///
/// ```
/// use strata::{Codec, MemoryStore, Options, StatsProvider};
/// # futures::executor::block_on(async {
///
/// let codec = Codec::new(MemoryStore::<i32>::new());
/// codec.set("key", 1, &Options::new()).await?;
/// codec.get("key").await?;
/// assert!(codec.get("missing").await.is_err());
///
/// let stats = codec.get_stats();
/// assert_eq!((stats.set_success, stats.hits, stats.miss), (1, 1, 1));
/// # Ok::<(), strata::Error>(())
/// # });
/// ```
pub struct Codec<V, S> {
    store: S,
    stats: Mutex<Stats>,
    _value: PhantomData<fn() -> V>,
}

impl<V, S: std::fmt::Debug> std::fmt::Debug for Codec<V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec")
            .field("store", &self.store)
            .field("stats", &*self.stats.lock())
            .finish()
    }
}

impl<V, S> Codec<V, S>
where
    S: Store<V>,
{
    /// Creates a codec with zeroed counters.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store,
            stats: Mutex::new(Stats::default()),
            _value: PhantomData,
        }
    }

    /// Reads a value, counting a hit or a miss.
    pub async fn get(&self, key: &str) -> Result<V> {
        let result = self.store.get(key).await;
        self.record(|stats| count(result.is_ok(), &mut stats.hits, &mut stats.miss));
        result
    }

    /// Reads a value and its remaining TTL, counting a hit or a miss.
    pub async fn get_with_ttl(&self, key: &str) -> Result<(V, Duration)> {
        let result = self.store.get_with_ttl(key).await;
        self.record(|stats| count(result.is_ok(), &mut stats.hits, &mut stats.miss));
        result
    }

    /// Writes a value.
    pub async fn set(&self, key: &str, value: V, options: &Options) -> Result<()> {
        let result = self.store.set(key, value, options).await;
        self.record(|stats| count(result.is_ok(), &mut stats.set_success, &mut stats.set_error));
        result
    }

    /// Removes a value.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let result = self.store.delete(key).await;
        self.record(|stats| count(result.is_ok(), &mut stats.delete_success, &mut stats.delete_error));
        result
    }

    /// Invalidates tagged values.
    pub async fn invalidate(&self, options: &InvalidateOptions) -> Result<()> {
        let result = self.store.invalidate(options).await;
        self.record(|stats| count(result.is_ok(), &mut stats.invalidate_success, &mut stats.invalidate_error));
        result
    }

    /// Removes every value.
    pub async fn clear(&self) -> Result<()> {
        let result = self.store.clear().await;
        self.record(|stats| count(result.is_ok(), &mut stats.clear_success, &mut stats.clear_error));
        result
    }

    /// Returns the wrapped store.
    #[must_use]
    pub fn get_store(&self) -> &S {
        &self.store
    }

    fn record(&self, update: impl FnOnce(&mut Stats)) {
        update(&mut *self.stats.lock());
    }
}

fn count(ok: bool, success: &mut u64, failure: &mut u64) {
    if ok {
        *success += 1;
    } else {
        *failure += 1;
    }
}

impl<V, S> StatsProvider for Codec<V, S>
where
    S: Store<V>,
{
    fn identify(&self) -> &str {
        self.store.identify()
    }

    fn get_stats(&self) -> Stats {
        *self.stats.lock()
    }
}
