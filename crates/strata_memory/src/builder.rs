// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring in-memory stores.
//!
//! This module provides a builder API for `MemoryStore` that abstracts
//! the underlying moka configuration, providing a stable API surface
//! without exposing moka's types.

use std::marker::PhantomData;

use strata_store::Options;

use crate::store::MemoryStore;

/// Builder for configuring a `MemoryStore`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use strata_memory::MemoryStore;
/// use strata_store::Options;
///
/// let store = MemoryStore::<i32>::builder()
///     .max_capacity(1000)
///     .initial_capacity(100)
///     .default_options(Options::new().with_expiration(Duration::from_secs(60)))
///     .name("sessions")
///     .build();
/// ```
#[derive(Debug)]
pub struct MemoryStoreBuilder<V> {
    pub(crate) max_capacity: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) default_options: Options,
    pub(crate) name: Option<String>,
    _phantom: PhantomData<V>,
}

impl<V> Default for MemoryStoreBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MemoryStoreBuilder<V> {
    /// Creates a new builder with default settings.
    ///
    /// The default configuration creates an unbounded store with `TinyLFU`
    /// eviction and no default expiration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_capacity: None,
            initial_capacity: None,
            default_options: Options::default(),
            name: None,
            _phantom: PhantomData,
        }
    }

    /// Sets the maximum total weight of the store.
    ///
    /// Each entry weighs its [`Options::cost`], or `1` when no cost was given,
    /// so without costs this is an entry count. If not set, the store is unbounded.
    #[must_use]
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets the initial capacity (pre-allocation hint) for the store.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Sets the options whose fields apply when a write leaves them unset.
    #[must_use]
    pub fn default_options(mut self, options: Options) -> Self {
        self.default_options = options;
        self
    }

    /// Sets a name for the store, used in moka's debugging output.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured `MemoryStore`.
    #[must_use]
    pub fn build(self) -> MemoryStore<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        MemoryStore::from_builder(self)
    }
}
