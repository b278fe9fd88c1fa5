// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Metrics collection over a cache composition.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use strata_store::{InvalidateOptions, Options, Result};

use crate::cache::{CacheControl, CacheInterface};
use crate::propagation::{DEFAULT_QUEUE_CAPACITY, Propagator};
use crate::stats::{Stats, StatsProvider};
use crate::tier::Instrumented;

const METRIC_LABEL: &str = "metric";

/// Destination for per-store statistics.
///
/// [`MetricCache`] calls [`record_from_codec`](Self::record_from_codec) from a
/// background task, once for every terminal cache after each operation.
pub trait MetricsSink: Send + Sync {
    /// Records the current statistics of one store.
    fn record_from_codec(&self, codec: &dyn StatsProvider);
}

/// Statistics of one store captured at the end of an operation.
#[derive(Debug)]
struct Snapshot {
    label: String,
    stats: Stats,
}

impl StatsProvider for Snapshot {
    fn identify(&self) -> &str {
        &self.label
    }

    fn get_stats(&self) -> Stats {
        self.stats
    }
}

/// A cache that reports the statistics of every store it reaches.
///
/// After construction and after every operation the composition below this
/// cache is walked: composite caches are descended into, and each terminal
/// cache's statistics are copied. The copies are handed to the sink by a
/// background task, so a slow sink never delays the caller. When that task
/// falls behind by more than its queue capacity, newer snapshots are dropped
/// until it catches up. Results of the inner cache are returned unchanged.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use strata::{Cache, CacheInterface, MemoryStore, MetricCache, MetricsSink, Options, StatsProvider};
///
/// struct Printer;
///
/// impl MetricsSink for Printer {
///     fn record_from_codec(&self, codec: &dyn StatsProvider) {
///         println!("{}: {:?}", codec.identify(), codec.get_stats());
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), strata::Error> {
/// let cache = MetricCache::new(Cache::new(MemoryStore::<i32>::new()), Arc::new(Printer));
/// cache.set("k", 1, Options::new()).await?;
/// cache.close().await;
/// # Ok(())
/// # }
/// ```
pub struct MetricCache<C> {
    cache: C,
    reports: Propagator<Vec<Snapshot>>,
}

impl<C: fmt::Debug> fmt::Debug for MetricCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricCache")
            .field("cache", &self.cache)
            .field("reports", &self.reports)
            .finish()
    }
}

impl<C: Instrumented> MetricCache<C> {
    /// Wraps `cache` and records its statistics once right away.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn new(cache: C, sink: Arc<dyn MetricsSink>) -> Self {
        Self::with_queue_capacity(cache, sink, DEFAULT_QUEUE_CAPACITY)
    }

    /// Like [`new`](Self::new), with a custom number of pending reports.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn with_queue_capacity(cache: C, sink: Arc<dyn MetricsSink>, capacity: usize) -> Self {
        let reports = Propagator::start("metric.reports", capacity, move |batch: Vec<Snapshot>| {
            for snapshot in &batch {
                sink.record_from_codec(snapshot);
            }
            std::future::ready(Ok(()))
        });

        let this = Self { cache, reports };
        this.collect();
        this
    }

    /// Returns the wrapped cache.
    #[must_use]
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Walks the composition and schedules every terminal store's statistics
    /// for recording.
    pub fn collect(&self) {
        let mut batch = Vec::new();
        walk(&self.cache, &mut batch);
        if batch.is_empty() {
            return;
        }
        if let Err(error) = self.reports.try_enqueue(batch) {
            tracing::debug!(cache.name = self.reports.name(), error = %error, "metrics snapshot dropped");
        }
    }

    /// Stops reporting after every scheduled snapshot has reached the sink.
    pub async fn close(&self) {
        self.reports.stop(true).await;
    }
}

fn walk(node: &dyn Instrumented, batch: &mut Vec<Snapshot>) {
    let children = node.children();
    if children.is_empty() {
        if let Some(codec) = node.codec() {
            batch.push(Snapshot {
                label: codec.identify().to_owned(),
                stats: codec.get_stats(),
            });
        }
        return;
    }
    for child in children {
        walk(child, batch);
    }
}

impl<K, V, C> CacheInterface<K, V> for MetricCache<C>
where
    K: Sync + ?Sized,
    V: Send,
    C: CacheInterface<K, V> + Instrumented,
{
    async fn get(&self, key: &K) -> Result<V> {
        let result = self.cache.get(key).await;
        self.collect();
        result
    }

    async fn get_with_ttl(&self, key: &K) -> Result<(V, Duration)> {
        let result = self.cache.get_with_ttl(key).await;
        self.collect();
        result
    }

    async fn set(&self, key: &K, value: V, options: Options) -> Result<()> {
        let result = self.cache.set(key, value, options).await;
        self.collect();
        result
    }

    async fn delete(&self, key: &K) -> Result<()> {
        let result = self.cache.delete(key).await;
        self.collect();
        result
    }
}

impl<C> CacheControl for MetricCache<C>
where
    C: CacheControl + Instrumented,
{
    async fn invalidate(&self, options: InvalidateOptions) -> Result<()> {
        let result = self.cache.invalidate(options).await;
        self.collect();
        result
    }

    async fn clear(&self) -> Result<()> {
        let result = self.cache.clear().await;
        self.collect();
        result
    }

    fn get_type(&self) -> &'static str {
        METRIC_LABEL
    }
}

impl<C: Instrumented> Instrumented for MetricCache<C> {
    fn label(&self) -> &str {
        METRIC_LABEL
    }

    fn children(&self) -> Vec<&dyn Instrumented> {
        vec![&self.cache as &dyn Instrumented]
    }
}
