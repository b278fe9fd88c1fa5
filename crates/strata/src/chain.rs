// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Multi-tier cache with asynchronous backfill.
//!
//! A [`ChainCache`] reads its tiers in order and returns the first value found.
//! Tiers in front of the one that answered are refreshed in the background with
//! the value and its remaining TTL, so subsequent reads are served by the fastest
//! tier. Writes, deletes, invalidations and clears go to every tier.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use strata_store::{Error, InvalidateOptions, Options, Result, TierError};

use crate::cache::{CacheControl, CacheInterface};
use crate::key::CacheKey;
use crate::propagation::{DEFAULT_QUEUE_CAPACITY, Propagator};
use crate::tier::{Instrumented, Tier};

const CHAIN_LABEL: &str = "chain";

/// Position of a tier in its chain; tier 0 is read first.
pub type TierId = usize;

struct Backfill<V> {
    key: String,
    value: V,
    ttl: Duration,
    boundary: Option<TierId>,
}

/// An ordered list of tiers behaving as one cache.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use strata::{Cache, CacheInterface, ChainCache, MemoryStore, Options};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), strata::Error> {
/// let l1 = MemoryStore::<i32>::new();
/// let l2 = MemoryStore::<i32>::new();
///
/// let chain = ChainCache::builder()
///     .tier(Cache::new(l1.clone()))
///     .tier(Cache::new(l2.clone()))
///     .build();
///
/// chain.set("key", 7, Options::new().with_expiration(Duration::from_secs(60))).await?;
/// assert_eq!(chain.get("key").await?, 7);
///
/// chain.close().await;
/// # Ok(())
/// # }
/// ```
pub struct ChainCache<V> {
    tiers: Arc<[Arc<dyn Tier<V>>]>,
    backfill: Propagator<Backfill<V>>,
}

impl<V> fmt::Debug for ChainCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.tiers.iter().map(|tier| tier.label()).collect();
        f.debug_struct("ChainCache")
            .field("tiers", &labels)
            .field("backfill", &self.backfill)
            .finish()
    }
}

impl<V> ChainCache<V>
where
    V: Clone + Send + 'static,
{
    /// Creates a chain over `tiers`, read in the given order.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[must_use]
    pub fn new(tiers: Vec<Arc<dyn Tier<V>>>) -> Self {
        Self::builder().tiers(tiers).build()
    }

    /// Starts configuring a chain.
    #[must_use]
    pub fn builder() -> ChainCacheBuilder<V> {
        ChainCacheBuilder {
            tiers: Vec::new(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Returns the tiers in read order.
    #[must_use]
    pub fn get_caches(&self) -> &[Arc<dyn Tier<V>>] {
        &self.tiers
    }

    /// Schedules `value` to be written into every tier in the background.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] after [`close`](Self::close).
    pub async fn spread(&self, key: &str, value: V, ttl: Duration) -> Result<()> {
        self.backfill
            .enqueue(Backfill {
                key: key.to_owned(),
                value,
                ttl,
                boundary: None,
            })
            .await
    }

    /// Stops the backfill queue after every pending write has been applied.
    ///
    /// Reads keep working afterwards but no longer refresh faster tiers.
    pub async fn close(&self) {
        self.backfill.stop(true).await;
    }
}

impl<K, V> CacheInterface<K, V> for ChainCache<V>
where
    K: CacheKey + Sync + ?Sized,
    V: Clone + Send + 'static,
{
    async fn get(&self, key: &K) -> Result<V> {
        CacheInterface::<K, V>::get_with_ttl(self, key).await.map(|(value, _)| value)
    }

    async fn get_with_ttl(&self, key: &K) -> Result<(V, Duration)> {
        let key = key.cache_key();
        let mut last_error = None;

        for (index, tier) in self.tiers.iter().enumerate() {
            match tier.get_with_ttl(&key).await {
                Ok((value, ttl)) => {
                    // Tier 0 has nothing in front of it.
                    if index > 0 {
                        let job = Backfill {
                            key: key.into_owned(),
                            value: value.clone(),
                            ttl,
                            boundary: Some(index),
                        };
                        if let Err(error) = self.backfill.enqueue(job).await {
                            tracing::debug!(cache.tier = tier.label(), error = %error, "backfill skipped");
                        }
                    }
                    return Ok((value, ttl));
                }
                Err(error) => last_error = Some(error),
            }
        }

        Err(last_error.unwrap_or_else(Error::not_found))
    }

    async fn set(&self, key: &K, value: V, options: Options) -> Result<()> {
        let key = key.cache_key();
        let mut errors = Vec::new();
        for (index, tier) in self.tiers.iter().enumerate() {
            if let Err(error) = tier.set(&key, value.clone(), options.clone()).await {
                errors.push(TierError::new(index, tier.label(), error));
            }
        }
        aggregate(errors)
    }

    async fn delete(&self, key: &K) -> Result<()> {
        let key = key.cache_key();
        let mut errors = Vec::new();
        for (index, tier) in self.tiers.iter().enumerate() {
            if let Err(error) = tier.delete(&key).await {
                errors.push(TierError::new(index, tier.label(), error));
            }
        }
        aggregate(errors)
    }
}

impl<V> CacheControl for ChainCache<V>
where
    V: Clone + Send + 'static,
{
    async fn invalidate(&self, options: InvalidateOptions) -> Result<()> {
        let mut errors = Vec::new();
        for (index, tier) in self.tiers.iter().enumerate() {
            if let Err(error) = tier.invalidate(options.clone()).await {
                errors.push(TierError::new(index, tier.label(), error));
            }
        }
        aggregate(errors)
    }

    async fn clear(&self) -> Result<()> {
        let mut errors = Vec::new();
        for (index, tier) in self.tiers.iter().enumerate() {
            if let Err(error) = tier.clear().await {
                errors.push(TierError::new(index, tier.label(), error));
            }
        }
        aggregate(errors)
    }

    fn get_type(&self) -> &'static str {
        CHAIN_LABEL
    }
}

impl<V> Instrumented for ChainCache<V>
where
    V: Send + 'static,
{
    fn label(&self) -> &str {
        CHAIN_LABEL
    }

    fn children(&self) -> Vec<&dyn Instrumented> {
        self.tiers.iter().map(|tier| &**tier as &dyn Instrumented).collect()
    }
}

fn aggregate(errors: Vec<TierError>) -> Result<()> {
    if errors.is_empty() { Ok(()) } else { Err(Error::Aggregate(errors)) }
}

/// Writes a backfill job into every tier in front of its boundary.
async fn apply_backfill<V: Clone>(tiers: &[Arc<dyn Tier<V>>], job: Backfill<V>) -> Result<()> {
    let limit = job.boundary.unwrap_or(tiers.len());
    let options = Options::new().with_expiration(job.ttl);
    let mut errors = Vec::new();

    for (index, tier) in tiers.iter().enumerate().take(limit) {
        if let Err(error) = tier.set(&job.key, job.value.clone(), options.clone()).await {
            tracing::warn!(
                cache.tier = tier.label(),
                cache.key = %job.key,
                error = %error,
                "backfill write failed"
            );
            errors.push(TierError::new(index, tier.label(), error));
        }
    }
    aggregate(errors)
}

/// Builder for [`ChainCache`].
pub struct ChainCacheBuilder<V> {
    tiers: Vec<Arc<dyn Tier<V>>>,
    queue_capacity: usize,
}

impl<V> fmt::Debug for ChainCacheBuilder<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainCacheBuilder")
            .field("tiers", &self.tiers.len())
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}

impl<V> ChainCacheBuilder<V>
where
    V: Clone + Send + 'static,
{
    /// Appends a tier; tiers are read in the order they are added.
    #[must_use]
    pub fn tier(mut self, tier: impl Tier<V> + 'static) -> Self {
        self.tiers.push(Arc::new(tier));
        self
    }

    /// Appends an already shared tier.
    #[must_use]
    pub fn shared_tier(mut self, tier: Arc<dyn Tier<V>>) -> Self {
        self.tiers.push(tier);
        self
    }

    /// Appends several shared tiers.
    #[must_use]
    pub fn tiers(mut self, tiers: impl IntoIterator<Item = Arc<dyn Tier<V>>>) -> Self {
        self.tiers.extend(tiers);
        self
    }

    /// Sets how many backfill jobs may be pending before readers wait.
    ///
    /// Defaults to [`DEFAULT_QUEUE_CAPACITY`].
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Builds the chain and starts its backfill queue.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[must_use]
    pub fn build(self) -> ChainCache<V> {
        let tiers: Arc<[Arc<dyn Tier<V>>]> = self.tiers.into();
        let handler_tiers = Arc::clone(&tiers);
        let backfill = Propagator::start("chain.backfill", self.queue_capacity, move |job: Backfill<V>| {
            let tiers = Arc::clone(&handler_tiers);
            async move { apply_backfill(&tiers, job).await }
        });

        ChainCache { tiers, backfill }
    }
}

#[cfg(test)]
mod tests {
    use strata_store::testing::{MockStore, StoreOp};

    use super::*;
    use crate::Cache;
    use crate::telemetry::testing::LogCapture;

    fn chain_of(stores: &[&MockStore<i32>]) -> ChainCache<i32> {
        stores
            .iter()
            .fold(ChainCache::builder(), |builder, store| builder.tier(Cache::new((*store).clone())))
            .build()
    }

    #[tokio::test]
    async fn hit_in_second_tier_backfills_first_with_ttl() {
        let l1 = MockStore::<i32>::with_label("l1");
        let l2 = MockStore::<i32>::with_label("l2");
        l2.seed("k", 5, Duration::from_secs(30));
        let chain = chain_of(&[&l1, &l2]);

        assert_eq!(CacheInterface::<str, i32>::get(&chain, "k").await.expect("get failed"), 5);
        chain.close().await;

        assert_eq!(l1.value_of("k"), Some(5));
        assert_eq!(l1.options_of("k").map(|o| o.expiration()), Some(Duration::from_secs(30)));
        assert_eq!(l2.count_operations(|op| matches!(op, StoreOp::Set { .. })), 0);
    }

    #[tokio::test]
    async fn hit_in_first_tier_leaves_later_tiers_alone() {
        let l1 = MockStore::<i32>::with_label("l1");
        let l2 = MockStore::<i32>::with_label("l2");
        l1.seed("k", 1, Duration::ZERO);
        let chain = chain_of(&[&l1, &l2]);

        CacheInterface::<str, i32>::get(&chain, "k").await.expect("get failed");
        chain.close().await;

        assert!(l2.operations().is_empty());
    }

    #[tokio::test]
    async fn backfill_stops_at_the_answering_tier() {
        let stores: Vec<_> = ["l1", "l2", "l3", "l4"].iter().map(|l| MockStore::<i32>::with_label(l)).collect();
        stores[2].seed("k", 9, Duration::ZERO);
        let chain = chain_of(&stores.iter().collect::<Vec<_>>());

        CacheInterface::<str, i32>::get(&chain, "k").await.expect("get failed");
        chain.close().await;

        assert!(stores[0].contains_key("k"));
        assert!(stores[1].contains_key("k"));
        assert!(!stores[3].contains_key("k"));
    }

    #[tokio::test]
    async fn full_miss_returns_last_tier_error() {
        let l1 = MockStore::<i32>::with_label("l1");
        let l2 = MockStore::<i32>::with_label("l2");
        l1.fail_when(|op| matches!(op, StoreOp::GetWithTtl(_)));
        let chain = chain_of(&[&l1, &l2]);

        let error = CacheInterface::<str, i32>::get(&chain, "k").await.expect_err("must miss");
        assert!(error.is_not_found());

        l2.fail_when(|op| matches!(op, StoreOp::GetWithTtl(_)));
        let error = CacheInterface::<str, i32>::get(&chain, "k").await.expect_err("must fail");
        assert!(error.to_string().contains("mock: get_with_ttl failed"));
    }

    #[tokio::test]
    async fn empty_chain_reports_not_found() {
        let chain = ChainCache::<i32>::new(Vec::new());
        let error = CacheInterface::<str, i32>::get(&chain, "k").await.expect_err("must miss");
        assert!(error.is_not_found());
        CacheInterface::<str, i32>::set(&chain, "k", 1, Options::new()).await.expect("empty set succeeds");
    }

    #[tokio::test]
    async fn set_reports_only_failing_tiers() {
        let l1 = MockStore::<i32>::with_label("l1");
        let l2 = MockStore::<i32>::with_label("l2");
        l1.fail_when(|op| matches!(op, StoreOp::Set { .. }));
        let chain = chain_of(&[&l1, &l2]);

        let error = CacheInterface::<str, i32>::set(&chain, "k", 1, Options::new())
            .await
            .expect_err("set must fail");

        let failures = error.tier_errors();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].label(), "l1");
        assert_eq!(failures[0].index(), 0);
        assert!(error.to_string().contains("l1"));
        assert!(!error.to_string().contains("l2"));
        assert_eq!(l2.value_of("k"), Some(1));
    }

    #[tokio::test]
    async fn delete_invalidate_and_clear_reach_every_tier() {
        let l1 = MockStore::<i32>::with_label("l1");
        let l2 = MockStore::<i32>::with_label("l2");
        let chain = chain_of(&[&l1, &l2]);
        CacheInterface::<str, i32>::set(&chain, "k", 1, Options::new().with_tags(["t"]))
            .await
            .expect("set failed");

        CacheControl::invalidate(&chain, InvalidateOptions::new().with_tags(["t"]))
            .await
            .expect("invalidate failed");
        CacheInterface::<str, i32>::delete(&chain, "k").await.expect("delete failed");
        CacheControl::clear(&chain).await.expect("clear failed");
        CacheControl::clear(&chain).await.expect("second clear failed");

        for store in [&l1, &l2] {
            assert_eq!(store.count_operations(|op| matches!(op, StoreOp::Invalidate(_))), 1);
            assert_eq!(store.count_operations(|op| matches!(op, StoreOp::Delete(_))), 1);
            assert_eq!(store.count_operations(|op| matches!(op, StoreOp::Clear)), 2);
        }
    }

    #[tokio::test]
    async fn delete_aggregates_failures() {
        let l1 = MockStore::<i32>::with_label("l1");
        let l2 = MockStore::<i32>::with_label("l2");
        l2.fail_when(|op| matches!(op, StoreOp::Delete(_)));
        let chain = chain_of(&[&l1, &l2]);

        let error = CacheInterface::<str, i32>::delete(&chain, "k").await.expect_err("delete must fail");
        assert_eq!(error.tier_errors().len(), 1);
        assert_eq!(error.tier_errors()[0].index(), 1);
        assert_eq!(l1.count_operations(|op| matches!(op, StoreOp::Delete(_))), 1);
    }

    #[tokio::test]
    async fn spread_writes_every_tier() {
        let l1 = MockStore::<i32>::with_label("l1");
        let l2 = MockStore::<i32>::with_label("l2");
        let chain = chain_of(&[&l1, &l2]);

        chain.spread("k", 4, Duration::from_secs(2)).await.expect("spread failed");
        chain.close().await;

        assert_eq!(l1.value_of("k"), Some(4));
        assert_eq!(l2.value_of("k"), Some(4));
        assert!(matches!(chain.spread("k", 4, Duration::ZERO).await, Err(Error::Closed)));
    }

    #[tokio::test]
    async fn reads_after_close_still_answer() {
        let l1 = MockStore::<i32>::with_label("l1");
        let l2 = MockStore::<i32>::with_label("l2");
        l2.seed("k", 3, Duration::ZERO);
        let chain = chain_of(&[&l1, &l2]);
        chain.close().await;

        assert_eq!(CacheInterface::<str, i32>::get(&chain, "k").await.expect("get failed"), 3);
        assert!(!l1.contains_key("k"));
    }

    #[tokio::test]
    async fn nested_chain_is_a_tier() {
        let l1 = MockStore::<i32>::with_label("l1");
        let l2 = MockStore::<i32>::with_label("l2");
        let inner = chain_of(&[&l2]);
        let outer = ChainCache::builder().tier(Cache::new(l1.clone())).tier(inner).build();

        CacheInterface::<str, i32>::set(&outer, "k", 8, Options::new()).await.expect("set failed");
        assert_eq!(l2.value_of("k"), Some(8));
        assert_eq!(outer.get_caches()[1].label(), "chain");
        assert_eq!(outer.children().len(), 2);
        assert_eq!(CacheControl::get_type(&outer), "chain");
    }

    #[test]
    fn backfill_failures_are_logged() {
        let capture = LogCapture::new();
        let _guard = tracing::subscriber::set_default(capture.subscriber());
        let runtime = tokio::runtime::Builder::new_current_thread().build().expect("runtime");

        runtime.block_on(async {
            let l1 = MockStore::<i32>::with_label("l1");
            let l2 = MockStore::<i32>::with_label("l2");
            l1.fail_when(|op| matches!(op, StoreOp::Set { .. }));
            l2.seed("k", 1, Duration::ZERO);
            let chain = chain_of(&[&l1, &l2]);

            assert_eq!(CacheInterface::<str, i32>::get(&chain, "k").await.expect("get failed"), 1);
            chain.close().await;
        });

        capture.assert_contains("backfill write failed");
        capture.assert_contains("l1");
    }
}
