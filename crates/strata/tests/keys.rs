// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for cache key derivation and statistics.

use strata::{Cache, CacheInterface, CacheKeyGenerator, Fingerprint, Options, StatsProvider, fingerprint};
use strata_store::testing::MockStore;

#[derive(Hash)]
struct Query {
    table: &'static str,
    id: u64,
}

#[derive(Hash)]
struct OtherQuery {
    table: &'static str,
    id: u64,
}

struct Tenant(&'static str);

impl CacheKeyGenerator for Tenant {
    fn get_cache_key(&self) -> String {
        format!("tenant:{}", self.0)
    }
}

#[test]
fn fingerprint_is_deterministic_and_type_sensitive() {
    let a = fingerprint(&Query { table: "orders", id: 1 });
    let b = fingerprint(&Query { table: "orders", id: 1 });
    let other = fingerprint(&OtherQuery { table: "orders", id: 1 });

    assert_eq!(a, b);
    assert_ne!(a, other);
    assert_ne!(a, fingerprint(&Query { table: "orders", id: 2 }));
    assert_eq!(a.len(), 32);
}

#[tokio::test]
async fn every_key_kind_reaches_the_store() {
    let store = MockStore::<i32>::new();
    let cache = Cache::new(store.clone());

    cache.set("plain", 1, Options::new()).await.expect("set failed");
    cache.set(&Tenant("acme"), 2, Options::new()).await.expect("set failed");
    cache
        .set(&Fingerprint(("orders", 7_u64)), 3, Options::new())
        .await
        .expect("set failed");

    assert_eq!(store.value_of("plain"), Some(1));
    assert_eq!(store.value_of("tenant:acme"), Some(2));
    assert_eq!(store.value_of(&fingerprint(&("orders", 7_u64))), Some(3));
}

#[tokio::test]
async fn stats_count_hits_and_misses() {
    let store = MockStore::<i32>::new();
    store.seed("present", 1, std::time::Duration::ZERO);
    let cache = Cache::new(store);

    for _ in 0..3 {
        cache.get("present").await.expect("hit expected");
    }
    for _ in 0..2 {
        cache.get("absent").await.expect_err("miss expected");
    }

    let stats = cache.get_codec().get_stats();
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.miss, 2);
    assert_eq!(stats.set_success + stats.set_error, 0);
}
