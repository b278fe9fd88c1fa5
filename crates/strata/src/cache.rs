// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The cache interface and the single-store cache.

use std::marker::PhantomData;
use std::time::Duration;

use strata_store::{InvalidateOptions, Options, Result, Store};

use crate::codec::Codec;
use crate::key::CacheKey;
use crate::stats::StatsProvider;
use crate::tier::Instrumented;

/// Key-independent operations shared by every cache in a composition.
///
/// These live outside [`CacheInterface`] so that `cache.clear()` resolves without
/// naming a key type.
pub trait CacheControl: Send + Sync {
    /// Removes every value tagged with one of the given tags.
    fn invalidate(&self, options: InvalidateOptions) -> impl Future<Output = Result<()>> + Send;

    /// Removes every value.
    fn clear(&self) -> impl Future<Output = Result<()>> + Send;

    /// Returns the kind of this cache: `"cache"`, `"chain"`, `"loadable"` or `"metric"`.
    fn get_type(&self) -> &'static str;
}

/// Keyed operations shared by every cache in a composition.
///
/// `K` is the caller's key type. [`Cache`] and [`ChainCache`](crate::ChainCache)
/// accept any [`CacheKey`]; [`LoadableCache`](crate::LoadableCache) fixes the key
/// type of its loader; [`MetricCache`](crate::MetricCache) accepts whatever its
/// inner cache does.
///
/// Missing keys are reported as [`Error::NotFound`](crate::Error::NotFound).
pub trait CacheInterface<K: ?Sized, V>: CacheControl {
    /// Gets a value.
    fn get(&self, key: &K) -> impl Future<Output = Result<V>> + Send;

    /// Gets a value together with its remaining TTL ([`Duration::ZERO`] when it never expires).
    fn get_with_ttl(&self, key: &K) -> impl Future<Output = Result<(V, Duration)>> + Send;

    /// Stores a value.
    fn set(&self, key: &K, value: V, options: Options) -> impl Future<Output = Result<()>> + Send;

    /// Removes a value.
    fn delete(&self, key: &K) -> impl Future<Output = Result<()>> + Send;
}

/// A cache over one store.
///
/// Keys are converted with [`CacheKey`] before they reach the store, and writes
/// inherit any field they leave unset from the cache's default options.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use strata::{Cache, CacheInterface, MemoryStore, Options};
/// # futures::executor::block_on(async {
///
/// let cache = Cache::builder(MemoryStore::<String>::new())
///     .default_options(Options::new().with_expiration(Duration::from_secs(60)))
///     .build();
///
/// cache.set("greeting", "hello".to_string(), Options::new()).await?;
/// let (value, ttl) = cache.get_with_ttl("greeting").await?;
/// assert_eq!(value, "hello");
/// assert!(ttl > Duration::ZERO);
/// # Ok::<(), strata::Error>(())
/// # });
/// ```
pub struct Cache<V, S> {
    codec: Codec<V, S>,
    default_options: Options,
}

impl<V, S: std::fmt::Debug> std::fmt::Debug for Cache<V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("codec", &self.codec)
            .field("default_options", &self.default_options)
            .finish()
    }
}

impl<V, S> Cache<V, S>
where
    S: Store<V>,
{
    /// Creates a cache over `store` without default options.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::builder(store).build()
    }

    /// Starts configuring a cache over `store`.
    #[must_use]
    pub fn builder(store: S) -> CacheBuilder<V, S> {
        CacheBuilder {
            store,
            default_options: Options::default(),
            _value: PhantomData,
        }
    }

    /// Returns the statistics-tracking codec wrapping the store.
    #[must_use]
    pub fn get_codec(&self) -> &Codec<V, S> {
        &self.codec
    }

    /// Returns the label of the store.
    #[must_use]
    pub fn identify(&self) -> &str {
        self.codec.identify()
    }

    /// Returns the options that fill in unset fields on every write.
    #[must_use]
    pub fn default_options(&self) -> &Options {
        &self.default_options
    }
}

impl<K, V, S> CacheInterface<K, V> for Cache<V, S>
where
    K: CacheKey + Sync + ?Sized,
    V: Send,
    S: Store<V>,
{
    async fn get(&self, key: &K) -> Result<V> {
        self.codec.get(&key.cache_key()).await
    }

    async fn get_with_ttl(&self, key: &K) -> Result<(V, Duration)> {
        self.codec.get_with_ttl(&key.cache_key()).await
    }

    async fn set(&self, key: &K, value: V, options: Options) -> Result<()> {
        let options = options.or(&self.default_options);
        self.codec.set(&key.cache_key(), value, &options).await
    }

    async fn delete(&self, key: &K) -> Result<()> {
        self.codec.delete(&key.cache_key()).await
    }
}

impl<V, S> CacheControl for Cache<V, S>
where
    V: Send,
    S: Store<V>,
{
    async fn invalidate(&self, options: InvalidateOptions) -> Result<()> {
        self.codec.invalidate(&options).await
    }

    async fn clear(&self) -> Result<()> {
        self.codec.clear().await
    }

    fn get_type(&self) -> &'static str {
        "cache"
    }
}

impl<V, S> Instrumented for Cache<V, S>
where
    S: Store<V>,
{
    fn label(&self) -> &str {
        self.identify()
    }

    fn codec(&self) -> Option<&dyn StatsProvider> {
        Some(&self.codec)
    }
}

/// Builder for [`Cache`].
#[derive(Debug)]
pub struct CacheBuilder<V, S> {
    store: S,
    default_options: Options,
    _value: PhantomData<fn() -> V>,
}

impl<V, S> CacheBuilder<V, S>
where
    S: Store<V>,
{
    /// Sets the options that fill in unset fields on every write.
    #[must_use]
    pub fn default_options(mut self, options: Options) -> Self {
        self.default_options = options;
        self
    }

    /// Builds the cache.
    #[must_use]
    pub fn build(self) -> Cache<V, S> {
        Cache {
            codec: Codec::new(self.store),
            default_options: self.default_options,
        }
    }
}
