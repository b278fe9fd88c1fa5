// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Naming of tag index entries.

use std::fmt;
use std::time::Duration;

/// How long a store keeps a tag index entry alive after its last update.
pub const TAG_KEY_EXPIRY: Duration = Duration::from_secs(720 * 60 * 60);

/// Key under which a store indexes the members of one tag.
///
/// Every store derives the name the same way, `<backend>_tag_<tag>`, so that
/// tag indexes written by one process can be found by another.
///
/// # Examples
///
/// ```
/// use strata_store::TagIndexKey;
///
/// let key = TagIndexKey::new("redis", "users");
/// assert_eq!(key.as_str(), "redis_tag_users");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagIndexKey(String);

impl TagIndexKey {
    /// Creates the index key of `tag` for the backend labelled `backend`.
    #[must_use]
    pub fn new(backend: &str, tag: &str) -> Self {
        Self(format!("{backend}_tag_{tag}"))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagIndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TagIndexKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<TagIndexKey> for String {
    fn from(key: TagIndexKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_differ_per_backend_and_tag() {
        assert_ne!(TagIndexKey::new("memory", "a"), TagIndexKey::new("redis", "a"));
        assert_ne!(TagIndexKey::new("memory", "a"), TagIndexKey::new("memory", "b"));
    }

    #[test]
    fn display_matches_as_str() {
        let key = TagIndexKey::new("memcache", "orders");
        assert_eq!(key.to_string(), key.as_str());
        assert_eq!(String::from(key), "memcache_tag_orders");
    }

    #[test]
    fn expiry_is_thirty_days() {
        assert_eq!(TAG_KEY_EXPIRY, Duration::from_secs(30 * 24 * 3600));
    }
}
