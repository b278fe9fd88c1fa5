// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Single-store cache with default expiration and tag invalidation.

use std::time::Duration;

use strata::{Cache, CacheControl, CacheInterface, Fingerprint, InvalidateOptions, MemoryStore, Options, StatsProvider};

#[derive(Hash)]
struct ProductQuery {
    category: &'static str,
    page: u32,
}

#[tokio::main]
async fn main() -> Result<(), strata::Error> {
    let cache = Cache::builder(MemoryStore::<Vec<String>>::new())
        .default_options(Options::new().with_expiration(Duration::from_secs(60)))
        .build();

    let query = Fingerprint(ProductQuery { category: "books", page: 1 });
    cache
        .set(&query, vec!["Dune".to_string(), "Emma".to_string()], Options::new().with_tags(["books"]))
        .await?;

    let (products, ttl) = cache.get_with_ttl(&query).await?;
    println!("{products:?} expires in {ttl:?}");

    cache.invalidate(InvalidateOptions::new().with_tags(["books"])).await?;
    match cache.get(&query).await {
        Err(error) if error.is_not_found() => println!("invalidated"),
        other => println!("unexpected: {other:?}"),
    }

    println!("{:?}", cache.get_codec().get_stats());
    Ok(())
}
