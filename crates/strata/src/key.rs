// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Derivation of store keys from caller keys.
//!
//! A [`Cache`](crate::Cache) accepts any key implementing [`CacheKey`]:
//!
//! - `str` and `String` are used verbatim;
//! - types implementing [`CacheKeyGenerator`] supply their own key;
//! - any [`Hash`] value wrapped in [`Fingerprint`] is hashed with XXH3-128.
//!
//! # Examples
//!
//! ```
//! use strata::{CacheKey, CacheKeyGenerator, Fingerprint};
//!
//! struct UserId(u64);
//!
//! impl CacheKeyGenerator for UserId {
//!     fn get_cache_key(&self) -> String {
//!         format!("user:{}", self.0)
//!     }
//! }
//!
//! assert_eq!("plain".cache_key(), "plain");
//! assert_eq!(UserId(7).cache_key(), "user:7");
//! assert_eq!(Fingerprint((1, "a")).cache_key().len(), 32);
//! ```

use std::any::type_name;
use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use xxhash_rust::xxh3::Xxh3;

/// Conversion of a caller key into the string a store is addressed with.
pub trait CacheKey {
    /// Returns the store key.
    fn cache_key(&self) -> Cow<'_, str>;
}

/// Capability of a type to name its own cache key.
pub trait CacheKeyGenerator {
    /// Returns the cache key for this value.
    fn get_cache_key(&self) -> String;
}

impl CacheKey for str {
    fn cache_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl CacheKey for String {
    fn cache_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl<T: CacheKeyGenerator + ?Sized> CacheKey for T {
    fn cache_key(&self) -> Cow<'_, str> {
        Cow::Owned(self.get_cache_key())
    }
}

/// Uses the structural fingerprint of the wrapped value as its cache key.
///
/// See [`fingerprint`] for how the key is computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fingerprint<T>(pub T);

impl<T: Hash> CacheKey for Fingerprint<T> {
    fn cache_key(&self) -> Cow<'_, str> {
        Cow::Owned(fingerprint(&self.0))
    }
}

/// Computes the structural fingerprint of `value`.
///
/// The fingerprint is the XXH3-128 digest of the type name followed by the
/// value's [`Hash`] stream, rendered as 32 lowercase hex characters. Equal values
/// of the same type always produce the same fingerprint within one build; values
/// of different types differ even when their hash streams coincide.
///
/// # Examples
///
/// ```
/// use strata::fingerprint;
///
/// #[derive(Hash)]
/// struct Query {
///     table: &'static str,
///     id: u32,
/// }
///
/// let a = fingerprint(&Query { table: "users", id: 1 });
/// let b = fingerprint(&Query { table: "users", id: 1 });
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 32);
/// assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
/// ```
#[must_use]
pub fn fingerprint<T: Hash + ?Sized>(value: &T) -> String {
    let mut hasher = FingerprintHasher(Xxh3::new());
    hasher.0.update(type_name::<T>().as_bytes());
    value.hash(&mut hasher);
    format!("{:032x}", hasher.0.digest128())
}

struct FingerprintHasher(Xxh3);

impl Hasher for FingerprintHasher {
    fn finish(&self) -> u64 {
        self.0.digest()
    }

    fn write(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }
}
