// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! End-to-end tests composing every cache kind over real and mock stores.

#![cfg(feature = "memory")]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use strata::{
    Cache, CacheControl, CacheInterface, ChainCache, Instrumented, InvalidateOptions, LoadableCache, MemoryStore, MetricCache, MetricsSink, Options,
    Stats, StatsProvider,
};
use strata_store::testing::MockStore;

#[derive(Default)]
struct Snapshots {
    latest: Mutex<Vec<(String, Stats)>>,
}

impl MetricsSink for Snapshots {
    fn record_from_codec(&self, codec: &dyn StatsProvider) {
        let mut latest = self.latest.lock();
        latest.retain(|(label, _)| label != codec.identify());
        latest.push((codec.identify().to_owned(), codec.get_stats()));
    }
}

impl Snapshots {
    fn of(&self, label: &str) -> Stats {
        self.latest
            .lock()
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, stats)| *stats)
            .unwrap_or_default()
    }
}

fn snapshots() -> (Arc<Snapshots>, Arc<dyn MetricsSink>) {
    let sink = Arc::new(Snapshots::default());
    let shared = Arc::clone(&sink);
    (sink, shared)
}

#[tokio::test]
async fn metric_over_loadable_over_chain() {
    let (sink, shared) = snapshots();
    let remote = MockStore::<String>::with_label("remote");
    let chain = ChainCache::builder()
        .tier(Cache::new(MemoryStore::<String>::new()))
        .tier(Cache::new(remote.clone()))
        .build();
    let loadable = LoadableCache::builder(chain, |key: &String| {
        let value = format!("loaded:{key}");
        async move { Ok(value) }
    })
    .synchronous_set(true)
    .build();
    let cache = MetricCache::new(loadable, shared);

    let key = "user-1".to_string();
    assert_eq!(cache.get(&key).await.expect("first get failed"), "loaded:user-1");
    assert_eq!(remote.value_of("user-1").as_deref(), Some("loaded:user-1"));

    assert_eq!(cache.get(&key).await.expect("second get failed"), "loaded:user-1");
    cache.close().await;

    let memory = sink.of("memory");
    assert_eq!(memory.miss, 1);
    assert_eq!(memory.hits, 1);
    assert_eq!(memory.set_success, 1);
    let remote_stats = sink.of("remote");
    assert_eq!(remote_stats.miss, 1);
    assert_eq!(remote_stats.hits, 0);

    cache.cache().close().await;
    cache.cache().cache().close().await;
}

#[tokio::test]
async fn remote_hit_refreshes_memory_tier() {
    let remote = MockStore::<i32>::with_label("remote");
    remote.seed("k", 11, Duration::from_secs(60));
    let memory = MemoryStore::<i32>::new();
    let chain = ChainCache::builder()
        .tier(Cache::new(memory.clone()))
        .tier(Cache::new(remote.clone()))
        .build();

    assert_eq!(chain.get("k").await.expect("get failed"), 11);
    chain.close().await;

    let (value, ttl) = Cache::new(memory).get_with_ttl("k").await.expect("memory tier not filled");
    assert_eq!(value, 11);
    assert!(ttl > Duration::ZERO && ttl <= Duration::from_secs(60));
}

#[tokio::test]
async fn tag_invalidation_spans_the_chain() {
    let memory = MemoryStore::<i32>::new();
    let chain = ChainCache::builder()
        .tier(Cache::new(memory.clone()))
        .tier(Cache::new(MockStore::<i32>::with_label("remote")))
        .build();

    chain.set("a", 1, Options::new().with_tags(["orders"])).await.expect("set failed");
    chain.set("b", 2, Options::new().with_tags(["users"])).await.expect("set failed");
    chain.invalidate(InvalidateOptions::new().with_tags(["orders"])).await.expect("invalidate failed");

    assert!(chain.get("a").await.expect_err("a must be gone").is_not_found());
    assert_eq!(chain.get("b").await.expect("b must remain"), 2);
    chain.close().await;
}

#[test]
fn instrumentation_tree_mirrors_composition() {
    let (_, shared) = snapshots();
    let runtime = tokio::runtime::Builder::new_current_thread().build().expect("runtime");
    let _entered = runtime.enter();

    let chain = ChainCache::builder()
        .tier(Cache::new(MemoryStore::<i32>::new()))
        .tier(Cache::new(MockStore::<i32>::with_label("remote")))
        .build();
    let cache = MetricCache::new(chain, shared);

    let chain_node = cache.children();
    assert_eq!(chain_node.len(), 1);
    assert_eq!(chain_node[0].label(), "chain");
    let labels: Vec<_> = chain_node[0].children().iter().map(|tier| tier.label().to_owned()).collect();
    assert_eq!(labels, ["memory", "remote"]);
}
