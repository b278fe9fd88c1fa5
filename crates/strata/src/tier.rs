// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Object-safe view of a cache used as one tier of a chain.

use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use strata_store::{InvalidateOptions, Options, Result};

use crate::cache::{CacheControl, CacheInterface};
use crate::stats::StatsProvider;

/// A node of a cache composition that metrics can be collected from.
///
/// Composite caches report the caches they wrap through [`children`](Self::children);
/// terminal caches expose the statistics of their store through [`codec`](Self::codec).
/// [`MetricCache`](crate::MetricCache) walks this tree and records every terminal codec.
pub trait Instrumented: Send + Sync {
    /// Label used in error messages and metrics.
    fn label(&self) -> &str;

    /// Caches wrapped by this one, in order.
    fn children(&self) -> Vec<&dyn Instrumented> {
        Vec::new()
    }

    /// Statistics of the store behind a terminal cache.
    fn codec(&self) -> Option<&dyn StatsProvider> {
        None
    }
}

/// A cache addressed by string keys, usable as a trait object.
///
/// Every `'static` cache that implements [`CacheInterface<str, V>`] and
/// [`Instrumented`] is a tier, so single-store caches and whole chains can be
/// stacked freely. Build chains from `Arc<dyn Tier<V>>` values.
pub trait Tier<V>: Instrumented {
    /// Gets a value together with its remaining TTL.
    fn get_with_ttl<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(V, Duration)>>;

    /// Stores a value.
    fn set<'a>(&'a self, key: &'a str, value: V, options: Options) -> BoxFuture<'a, Result<()>>;

    /// Removes a value.
    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Removes every value tagged with one of the given tags.
    fn invalidate(&self, options: InvalidateOptions) -> BoxFuture<'_, Result<()>>;

    /// Removes every value.
    fn clear(&self) -> BoxFuture<'_, Result<()>>;
}

impl<V, T> Tier<V> for T
where
    T: CacheInterface<str, V> + Instrumented + 'static,
    V: Send + 'static,
{
    fn get_with_ttl<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(V, Duration)>> {
        CacheInterface::<str, V>::get_with_ttl(self, key).boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: V, options: Options) -> BoxFuture<'a, Result<()>> {
        CacheInterface::<str, V>::set(self, key, value, options).boxed()
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<()>> {
        CacheInterface::<str, V>::delete(self, key).boxed()
    }

    fn invalidate(&self, options: InvalidateOptions) -> BoxFuture<'_, Result<()>> {
        CacheControl::invalidate(self, options).boxed()
    }

    fn clear(&self) -> BoxFuture<'_, Result<()>> {
        CacheControl::clear(self).boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use strata_store::testing::MockStore;

    use super::*;
    use crate::Cache;

    #[tokio::test]
    async fn cache_is_usable_as_tier() {
        let store = MockStore::<i32>::with_label("l1");
        let tier: Arc<dyn Tier<i32>> = Arc::new(Cache::new(store.clone()));

        tier.set("k", 3, Options::new().with_expiration(Duration::from_secs(9)))
            .await
            .expect("set failed");
        let (value, ttl) = tier.get_with_ttl("k").await.expect("get failed");

        assert_eq!(value, 3);
        assert_eq!(ttl, Duration::from_secs(9));
        assert_eq!(tier.label(), "l1");

        tier.delete("k").await.expect("delete failed");
        tier.invalidate(InvalidateOptions::new()).await.expect("invalidate failed");
        tier.clear().await.expect("clear failed");
        assert!(!store.contains_key("k"));
    }

    #[test]
    fn terminal_tier_exposes_codec() {
        let tier: Arc<dyn Tier<i32>> = Arc::new(Cache::new(MockStore::<i32>::with_label("l2")));
        let node: &dyn Instrumented = &*tier;
        assert!(node.children().is_empty());
        assert_eq!(node.codec().map(StatsProvider::identify), Some("l2"));
    }
}
