// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock store implementation for testing.
//!
//! This module provides `MockStore`, a configurable in-memory store that
//! records all operations and supports failure injection for testing error paths.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::{Error, InvalidateOptions, Options, Store};

/// Recorded store operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp<V> {
    /// A get operation was performed with the given key.
    Get(String),
    /// A get-with-ttl operation was performed with the given key.
    GetWithTtl(String),
    /// A set operation was performed.
    Set {
        /// The key that was written.
        key: String,
        /// The value that was written.
        value: V,
        /// The options the value was written with.
        options: Options,
    },
    /// A delete operation was performed with the given key.
    Delete(String),
    /// An invalidate operation was performed with the given options.
    Invalidate(InvalidateOptions),
    /// A clear operation was performed.
    Clear,
}

impl<V> StoreOp<V> {
    /// Returns the key this operation targeted, if it targeted one.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Get(key) | Self::GetWithTtl(key) | Self::Delete(key) | Self::Set { key, .. } => Some(key),
            Self::Invalidate(_) | Self::Clear => None,
        }
    }
}

type FailPredicate<V> = Box<dyn Fn(&StoreOp<V>) -> bool + Send + Sync>;

struct Stored<V> {
    value: V,
    options: Options,
}

/// A configurable mock store for testing.
///
/// Values are kept in memory together with the options they were written with;
/// the TTL reported by `get_with_ttl` is the stored expiration verbatim. All
/// operations are recorded for later verification and any of them can be made
/// to fail through [`fail_when`](Self::fail_when).
///
/// Clones share state, so a clone can be handed to a cache while the test keeps
/// one for inspection.
///
/// # Examples
///
/// ```ignore
/// use strata_store::testing::{MockStore, StoreOp};
/// use strata_store::{Options, Store};
///
/// # futures::executor::block_on(async {
/// let store = MockStore::<i32>::new();
///
/// store.set("key", 42, &Options::new()).await.unwrap();
/// assert_eq!(store.get("key").await.unwrap(), 42);
///
/// store.fail_when(|op| matches!(op, StoreOp::Get(_)));
/// assert!(store.get("key").await.is_err());
/// # });
/// ```
pub struct MockStore<V> {
    label: Arc<str>,
    data: Arc<Mutex<HashMap<String, Stored<V>>>>,
    operations: Arc<Mutex<Vec<StoreOp<V>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<V>>>>,
}

impl<V> std::fmt::Debug for MockStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockStore")
            .field("label", &self.label)
            .field("entries", &self.data.lock().len())
            .field("operations", &self.operations.lock().len())
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl<V> Clone for MockStore<V> {
    fn clone(&self) -> Self {
        Self {
            label: Arc::clone(&self.label),
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl<V> Default for MockStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MockStore<V> {
    /// Creates a new empty mock store labelled `"mock"`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_label("mock")
    }

    /// Creates a new empty mock store with the given identity label.
    #[must_use]
    pub fn with_label(label: &str) -> Self {
        Self {
            label: Arc::from(label),
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Writes a value directly, without recording an operation.
    pub fn seed(&self, key: &str, value: V, ttl: Duration) {
        let stored = Stored {
            value,
            options: Options::new().with_expiration(ttl),
        };
        self.data.lock().insert(key.to_owned(), stored);
    }

    /// Returns the number of stored values.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if the store holds a value for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.lock().contains_key(key)
    }

    /// Returns the options the value under `key` was written with.
    #[must_use]
    pub fn options_of(&self, key: &str) -> Option<Options> {
        self.data.lock().get(key).map(|stored| stored.options.clone())
    }

    /// Sets a predicate that determines which operations fail.
    ///
    /// Failing operations are still recorded but leave the data untouched.
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&StoreOp<V>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    /// Returns how many recorded operations match `predicate`.
    pub fn count_operations(&self, predicate: impl Fn(&StoreOp<V>) -> bool) -> usize {
        self.operations.lock().iter().filter(|op| predicate(op)).count()
    }

    fn should_fail(&self, op: &StoreOp<V>) -> bool {
        self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(op))
    }
}

impl<V: Clone> MockStore<V> {
    /// Returns the value stored under `key`, without recording an operation.
    #[must_use]
    pub fn value_of(&self, key: &str) -> Option<V> {
        self.data.lock().get(key).map(|stored| stored.value.clone())
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<StoreOp<V>> {
        self.operations.lock().clone()
    }

    /// Records `op` and reports whether it should fail.
    fn check(&self, op: StoreOp<V>) -> Result<(), Error> {
        let fail = self.should_fail(&op);
        let name = match &op {
            StoreOp::Get(_) => "get",
            StoreOp::GetWithTtl(_) => "get_with_ttl",
            StoreOp::Set { .. } => "set",
            StoreOp::Delete(_) => "delete",
            StoreOp::Invalidate(_) => "invalidate",
            StoreOp::Clear => "clear",
        };
        self.operations.lock().push(op);
        if fail {
            Err(Error::from_message(format!("mock: {name} failed")))
        } else {
            Ok(())
        }
    }
}

impl<V> Store<V> for MockStore<V>
where
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &str) -> Result<V, Error> {
        self.check(StoreOp::Get(key.to_owned()))?;
        self.value_of(key).ok_or_else(Error::not_found)
    }

    async fn get_with_ttl(&self, key: &str) -> Result<(V, Duration), Error> {
        self.check(StoreOp::GetWithTtl(key.to_owned()))?;
        self.data
            .lock()
            .get(key)
            .map(|stored| (stored.value.clone(), stored.options.expiration()))
            .ok_or_else(Error::not_found)
    }

    async fn set(&self, key: &str, value: V, options: &Options) -> Result<(), Error> {
        self.check(StoreOp::Set {
            key: key.to_owned(),
            value: value.clone(),
            options: options.clone(),
        })?;
        let stored = Stored {
            value,
            options: options.clone(),
        };
        self.data.lock().insert(key.to_owned(), stored);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        self.check(StoreOp::Delete(key.to_owned()))?;
        self.data.lock().remove(key);
        Ok(())
    }

    async fn invalidate(&self, options: &InvalidateOptions) -> Result<(), Error> {
        self.check(StoreOp::Invalidate(options.clone()))?;
        self.data
            .lock()
            .retain(|_, stored| !stored.options.tags().iter().any(|tag| options.tags().contains(tag)));
        Ok(())
    }

    async fn clear(&self) -> Result<(), Error> {
        self.check(StoreOp::Clear)?;
        self.data.lock().clear();
        Ok(())
    }

    fn identify(&self) -> &str {
        &self.label
    }
}
