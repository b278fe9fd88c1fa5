// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! A two-tier read-through cache reporting OpenTelemetry metrics.
//!
//! Run with `cargo run --example layered --features metrics`.

use std::sync::Arc;
use std::time::Duration;

use opentelemetry_sdk::metrics::{InMemoryMetricExporter, SdkMeterProvider};
use strata::{Cache, CacheInterface, ChainCache, LoadableCache, MemoryStore, MetricCache, OtelMetricsSink, Options};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing::subscriber::set_global_default(tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).finish())?;

    let exporter = InMemoryMetricExporter::default();
    let provider = SdkMeterProvider::builder().with_periodic_exporter(exporter.clone()).build();

    let near = MemoryStore::<String>::builder().max_capacity(1_000).build();
    let far = MemoryStore::<String>::builder().max_capacity(100_000).build();
    let chain = ChainCache::builder()
        .tier(Cache::builder(near).default_options(Options::new().with_expiration(Duration::from_secs(30))).build())
        .tier(Cache::new(far))
        .build();

    let profiles = LoadableCache::builder(chain, |user: &String| {
        let user = user.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(format!("profile of {user}"))
        }
    })
    .write_options(Options::new().with_expiration(Duration::from_secs(300)))
    .build();

    let cache = MetricCache::new(profiles, Arc::new(OtelMetricsSink::new("profiles", &provider)));

    for user in ["ada", "grace", "ada", "ada", "linus", "grace"] {
        let profile = cache.get(&user.to_string()).await?;
        println!("{user}: {profile}");
    }

    cache.close().await;
    cache.cache().close().await;
    cache.cache().cache().close().await;

    provider.force_flush()?;
    let exported = exporter.get_finished_metrics()?;
    println!("exported {} metric batches", exported.len());
    provider.shutdown()?;
    Ok(())
}
