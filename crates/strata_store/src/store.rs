// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for key/value store backends.
//!
//! [`Store`] defines the interface that all backends must implement. Stores are
//! leaves of the cache composition tree: they own the data, their eviction policy
//! and their tag index, while everything above them only coordinates.

use std::time::Duration;

use crate::{Error, InvalidateOptions, Options};

/// Trait for key/value store backends.
///
/// Keys reaching a store are already-derived cache keys. A missing key must be
/// reported as [`Error::not_found`] (optionally wrapping the backend's own cause)
/// so that callers above can tell "try the next source" apart from a fault.
///
/// A TTL of [`Duration::ZERO`] means "no expiry" everywhere in this trait.
pub trait Store<V>: Send + Sync {
    /// Gets a value.
    fn get(&self, key: &str) -> impl Future<Output = Result<V, Error>> + Send;

    /// Gets a value together with its remaining time to live.
    fn get_with_ttl(&self, key: &str) -> impl Future<Output = Result<(V, Duration), Error>> + Send;

    /// Stores a value.
    ///
    /// Stores that support tags must index `key` under every tag in `options`
    /// using [`TagIndexKey`](crate::TagIndexKey).
    fn set(&self, key: &str, value: V, options: &Options) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes a value.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes every value indexed under the given tags, plus the tag indexes themselves.
    fn invalidate(&self, options: &InvalidateOptions) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes every value.
    fn clear(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Returns the stable backend label, e.g. `"memory"` or `"redis"`.
    fn identify(&self) -> &str;
}
