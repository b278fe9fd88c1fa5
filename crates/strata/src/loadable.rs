// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Read-through cache backed by a load function.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use strata_store::{InvalidateOptions, Options, Result};

use crate::cache::{CacheControl, CacheInterface};
use crate::propagation::{DEFAULT_QUEUE_CAPACITY, Propagator};
use crate::tier::Instrumented;

const LOADABLE_LABEL: &str = "loadable";

/// Function producing the authoritative value for a key.
pub type LoadFunction<K, V> = Arc<dyn Fn(&K) -> BoxFuture<'static, Result<V>> + Send + Sync>;

/// A cache that loads missing values from an authoritative source.
///
/// On a miss the load function is called and its value returned to the caller;
/// the value is then written into the inner cache, in the background by default
/// or inline when [`synchronous_set`](LoadableCacheBuilder::synchronous_set) is
/// enabled. Load failures are returned unchanged.
///
/// # Examples
///
/// ```
/// use strata::{Cache, CacheInterface, LoadableCache, MemoryStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), strata::Error> {
/// let loadable = LoadableCache::builder(Cache::new(MemoryStore::<String>::new()), |key: &String| {
///     let key = key.clone();
///     async move { Ok(format!("value of {key}")) }
/// })
/// .build();
///
/// assert_eq!(loadable.get(&"a".to_string()).await?, "value of a");
/// loadable.close().await;
/// # Ok(())
/// # }
/// ```
pub struct LoadableCache<K, V, C> {
    cache: Arc<C>,
    load: LoadFunction<K, V>,
    write_options: Options,
    write_back: Option<Propagator<(K, V)>>,
}

impl<K, V, C: fmt::Debug> fmt::Debug for LoadableCache<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadableCache")
            .field("cache", &self.cache)
            .field("write_options", &self.write_options)
            .field("write_back", &self.write_back)
            .finish_non_exhaustive()
    }
}

impl<K, V, C> LoadableCache<K, V, C>
where
    K: Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
    C: CacheInterface<K, V> + 'static,
{
    /// Starts configuring a read-through cache over `cache`.
    pub fn builder<F, Fut>(cache: C, load: F) -> LoadableCacheBuilder<K, V, C>
    where
        F: Fn(&K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        LoadableCacheBuilder {
            cache,
            load: Arc::new(move |key: &K| load(key).boxed()),
            write_options: Options::default(),
            synchronous_set: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Returns the inner cache.
    #[must_use]
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Stops the write-back queue after every pending write has been applied.
    pub async fn close(&self) {
        if let Some(write_back) = &self.write_back {
            write_back.stop(true).await;
        }
    }

    async fn load_and_store(&self, key: &K) -> Result<V> {
        let value = (self.load)(key).await?;

        match &self.write_back {
            None => self.cache.set(key, value.clone(), self.write_options.clone()).await?,
            Some(write_back) => {
                if let Err(error) = write_back.enqueue((key.clone(), value.clone())).await {
                    tracing::debug!(cache.name = write_back.name(), error = %error, "write-back skipped");
                }
            }
        }

        Ok(value)
    }
}

impl<K, V, C> CacheInterface<K, V> for LoadableCache<K, V, C>
where
    K: Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
    C: CacheInterface<K, V> + 'static,
{
    async fn get(&self, key: &K) -> Result<V> {
        match self.cache.get(key).await {
            Ok(value) => Ok(value),
            Err(error) => {
                tracing::debug!(cache.operation = "get", error = %error, "loading missing value");
                self.load_and_store(key).await
            }
        }
    }

    async fn get_with_ttl(&self, key: &K) -> Result<(V, Duration)> {
        match self.cache.get_with_ttl(key).await {
            Ok(found) => Ok(found),
            Err(error) => {
                tracing::debug!(cache.operation = "get_with_ttl", error = %error, "loading missing value");
                let value = self.load_and_store(key).await?;
                Ok((value, self.write_options.expiration()))
            }
        }
    }

    async fn set(&self, key: &K, value: V, options: Options) -> Result<()> {
        self.cache.set(key, value, options).await
    }

    async fn delete(&self, key: &K) -> Result<()> {
        self.cache.delete(key).await
    }
}

impl<K, V, C> CacheControl for LoadableCache<K, V, C>
where
    K: Send + Sync,
    V: Send,
    C: CacheControl,
{
    async fn invalidate(&self, options: InvalidateOptions) -> Result<()> {
        self.cache.invalidate(options).await
    }

    async fn clear(&self) -> Result<()> {
        self.cache.clear().await
    }

    fn get_type(&self) -> &'static str {
        LOADABLE_LABEL
    }
}

impl<K, V, C> Instrumented for LoadableCache<K, V, C>
where
    K: Send + Sync,
    V: Send,
    C: Instrumented,
{
    fn label(&self) -> &str {
        LOADABLE_LABEL
    }

    fn children(&self) -> Vec<&dyn Instrumented> {
        vec![&*self.cache as &dyn Instrumented]
    }
}

/// Builder for [`LoadableCache`].
pub struct LoadableCacheBuilder<K, V, C> {
    cache: C,
    load: LoadFunction<K, V>,
    write_options: Options,
    synchronous_set: bool,
    queue_capacity: usize,
}

impl<K, V, C: fmt::Debug> fmt::Debug for LoadableCacheBuilder<K, V, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadableCacheBuilder")
            .field("cache", &self.cache)
            .field("write_options", &self.write_options)
            .field("synchronous_set", &self.synchronous_set)
            .field("queue_capacity", &self.queue_capacity)
            .finish_non_exhaustive()
    }
}

impl<K, V, C> LoadableCacheBuilder<K, V, C>
where
    K: Clone + Send + Sync + 'static,
    V: Clone + Send + 'static,
    C: CacheInterface<K, V> + 'static,
{
    /// Writes loaded values inline instead of in the background.
    ///
    /// Inline write failures are returned to the caller of `get`.
    #[must_use]
    pub fn synchronous_set(mut self, enabled: bool) -> Self {
        self.synchronous_set = enabled;
        self
    }

    /// Sets how many write-backs may be pending before readers wait.
    ///
    /// Defaults to [`DEFAULT_QUEUE_CAPACITY`].
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Sets the options loaded values are written with.
    #[must_use]
    pub fn write_options(mut self, options: Options) -> Self {
        self.write_options = options;
        self
    }

    /// Builds the cache, starting its write-back queue unless writes are synchronous.
    ///
    /// # Panics
    ///
    /// Panics if background writes are enabled and this is called outside of a
    /// tokio runtime.
    #[must_use]
    pub fn build(self) -> LoadableCache<K, V, C> {
        let cache = Arc::new(self.cache);

        let write_back = (!self.synchronous_set).then(|| {
            let cache = Arc::clone(&cache);
            let options = self.write_options.clone();
            Propagator::start("loadable.write_back", self.queue_capacity, move |(key, value): (K, V)| {
                let cache = Arc::clone(&cache);
                let options = options.clone();
                async move { cache.set(&key, value, options).await }
            })
        });

        LoadableCache {
            cache,
            load: self.load,
            write_options: self.write_options,
            write_back,
        }
    }
}
