// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory store implementation using moka.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use moka::ops::compute::Op;
use parking_lot::Mutex;
use strata_store::{Error, InvalidateOptions, Options, Store, TAG_KEY_EXPIRY, TagIndexKey};

use crate::builder::MemoryStoreBuilder;

/// Identity label reported by [`MemoryStore::identify`].
pub const MEMORY_LABEL: &str = "memory";

#[derive(Clone, Debug)]
struct Entry<V> {
    value: V,
    written_at: Instant,
    expiration: Option<Duration>,
    weight: u32,
    tags: Vec<String>,
}

impl<V> Entry<V> {
    fn remaining_ttl(&self) -> Duration {
        // A live entry never reports zero, which would read as "no expiry".
        self.expiration.map_or(Duration::ZERO, |ttl| {
            ttl.saturating_sub(self.written_at.elapsed()).max(Duration::from_nanos(1))
        })
    }
}

struct EntryExpiry;

impl<V> Expiry<String, Entry<V>> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, entry: &Entry<V>, _created_at: Instant) -> Option<Duration> {
        entry.expiration
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.expiration
    }
}

type TagIndex = Arc<Mutex<HashSet<String>>>;

/// An in-memory store backed by moka.
///
/// This store provides:
/// - Concurrent access with `TinyLFU` eviction
/// - Per-entry expiration taken from [`Options::expiration`]
/// - [`Options::cost`] as the eviction weight
/// - Tag indexes stored under [`TagIndexKey`] and kept for [`TAG_KEY_EXPIRY`]
///
/// Clones share the same underlying data.
///
/// # Examples
///
/// ```
/// use strata_memory::MemoryStore;
/// use strata_store::{Options, Store};
/// # futures::executor::block_on(async {
///
/// let store = MemoryStore::<i32>::new();
///
/// store.set("key", 42, &Options::new()).await?;
/// assert_eq!(store.get("key").await?, 42);
/// # Ok::<(), strata_store::Error>(())
/// # });
/// ```
pub struct MemoryStore<V> {
    values: Cache<String, Entry<V>>,
    tags: Cache<String, TagIndex>,
    default_options: Options,
}

impl<V> std::fmt::Debug for MemoryStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.values.entry_count())
            .field("tags", &self.tags.entry_count())
            .field("default_options", &self.default_options)
            .finish()
    }
}

impl<V> Clone for MemoryStore<V> {
    fn clone(&self) -> Self {
        Self {
            values: self.values.clone(),
            tags: self.tags.clone(),
            default_options: self.default_options.clone(),
        }
    }
}

impl<V> Default for MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new unbounded in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new builder for configuring an in-memory store.
    #[must_use]
    pub fn builder() -> MemoryStoreBuilder<V> {
        MemoryStoreBuilder::new()
    }

    pub(crate) fn from_builder(builder: MemoryStoreBuilder<V>) -> Self {
        let mut values = Cache::builder()
            .expire_after(EntryExpiry)
            .weigher(|_key: &String, entry: &Entry<V>| entry.weight);

        if let Some(capacity) = builder.max_capacity {
            values = values.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            values = values.initial_capacity(capacity);
        }

        if let Some(name) = builder.name.as_deref() {
            values = values.name(name);
        }

        Self {
            values: values.build(),
            tags: Cache::builder().time_to_live(TAG_KEY_EXPIRY).build(),
            default_options: builder.default_options,
        }
    }

    /// Returns the number of stored values.
    ///
    /// The count is eventually consistent; call
    /// [`run_pending_tasks`](Self::run_pending_tasks) first for an exact figure.
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.values.entry_count()
    }

    /// Applies pending evictions, expirations and invalidations.
    pub async fn run_pending_tasks(&self) {
        self.values.run_pending_tasks().await;
        self.tags.run_pending_tasks().await;
    }

    /// Adds `key` to the index of every tag.
    ///
    /// Index updates and tag invalidation both run under moka's per-key
    /// compute lock, so a key is never added to an index that an invalidation
    /// has already taken.
    async fn index_tags(&self, key: &str, tags: &[String]) {
        for tag in tags {
            let index_key = String::from(TagIndexKey::new(MEMORY_LABEL, tag));
            // Putting restarts the index expiry on every write.
            self.tags
                .entry(index_key)
                .and_compute_with(|existing| {
                    let index = existing.map_or_else(TagIndex::default, moka::Entry::into_value);
                    index.lock().insert(key.to_owned());
                    std::future::ready(Op::Put(index))
                })
                .await;
        }
    }

    /// Removes `key` from the index of every tag, dropping indexes left empty.
    async fn unindex_tags(&self, key: &str, tags: &[String]) {
        for tag in tags {
            let index_key = String::from(TagIndexKey::new(MEMORY_LABEL, tag));
            self.tags
                .entry(index_key)
                .and_compute_with(|existing| {
                    let op = match existing {
                        None => Op::Nop,
                        Some(entry) => {
                            let index = entry.into_value();
                            let mut members = index.lock();
                            members.remove(key);
                            if members.is_empty() { Op::Remove } else { Op::Nop }
                        }
                    };
                    std::future::ready(op)
                })
                .await;
        }
    }

    /// Takes the index of `tag`, returning its members.
    async fn take_tag_members(&self, tag: &str) -> Vec<String> {
        let mut members = Vec::new();
        self.tags
            .entry(String::from(TagIndexKey::new(MEMORY_LABEL, tag)))
            .and_compute_with(|existing| {
                if let Some(entry) = existing {
                    members = entry.into_value().lock().drain().collect();
                }
                std::future::ready(Op::Remove)
            })
            .await;
        members
    }
}

impl<V> Store<V> for MemoryStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<V, Error> {
        self.values.get(key).await.map(|entry| entry.value).ok_or_else(Error::not_found)
    }

    async fn get_with_ttl(&self, key: &str) -> Result<(V, Duration), Error> {
        let entry = self.values.get(key).await.ok_or_else(Error::not_found)?;
        let ttl = entry.remaining_ttl();
        Ok((entry.value, ttl))
    }

    async fn set(&self, key: &str, value: V, options: &Options) -> Result<(), Error> {
        let options = options.clone().or(&self.default_options);
        let expiration = Some(options.expiration()).filter(|ttl| !ttl.is_zero());
        let tags = options.tags().to_vec();

        if let Some(previous) = self.values.get(key).await {
            let dropped: Vec<String> = previous.tags.into_iter().filter(|tag| !tags.contains(tag)).collect();
            self.unindex_tags(key, &dropped).await;
        }

        // Index before storing: an invalidation that misses the index entry
        // also ran before the value became visible.
        self.index_tags(key, &tags).await;

        let entry = Entry {
            value,
            written_at: Instant::now(),
            expiration,
            weight: u32::try_from(options.cost()).unwrap_or(u32::MAX).max(1),
            tags,
        };
        self.values.insert(key.to_owned(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        if let Some(entry) = self.values.remove(key).await {
            self.unindex_tags(key, &entry.tags).await;
        }
        Ok(())
    }

    async fn invalidate(&self, options: &InvalidateOptions) -> Result<(), Error> {
        for tag in options.tags() {
            for member in self.take_tag_members(tag).await {
                self.values.invalidate(&member).await;
            }
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.values.invalidate_all();
        self.tags.invalidate_all();
        Ok(())
    }

    fn identify(&self) -> &str {
        MEMORY_LABEL
    }
}
