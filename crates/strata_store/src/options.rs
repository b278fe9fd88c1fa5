// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Write and invalidation options.

use std::time::Duration;

/// Options applied when storing a value.
///
/// Options are built by chaining `with_*` calls on [`Options::new`]. Every field
/// is optional: fields left unset fall back to a cache's default options via
/// [`Options::or`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use strata_store::Options;
///
/// let options = Options::new()
///     .with_expiration(Duration::from_secs(60))
///     .with_tags(["users", "profiles"])
///     .with_cost(4);
///
/// assert_eq!(options.expiration(), Duration::from_secs(60));
/// assert_eq!(options.tags(), ["users", "profiles"]);
/// assert_eq!(options.cost(), 4);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Options {
    cost: Option<u64>,
    expiration: Option<Duration>,
    tags: Vec<String>,
    client_side_cache_expiration: Option<Duration>,
}

impl Options {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the eviction weight hint.
    #[must_use]
    pub fn with_cost(mut self, cost: u64) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Sets the expiration; [`Duration::ZERO`] means the value never expires.
    #[must_use]
    pub fn with_expiration(mut self, expiration: Duration) -> Self {
        self.expiration = Some(expiration);
        self
    }

    /// Adds group-invalidation tags, keeping first-seen order and dropping duplicates.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        push_unique(&mut self.tags, tags);
        self
    }

    /// Sets the expiration of local read caches, for stores that keep one.
    #[must_use]
    pub fn with_client_side_cache_expiration(mut self, expiration: Duration) -> Self {
        self.client_side_cache_expiration = Some(expiration);
        self
    }

    /// Eviction weight hint, `0` when unset.
    #[must_use]
    pub fn cost(&self) -> u64 {
        self.cost.unwrap_or_default()
    }

    /// Expiration, [`Duration::ZERO`] (no expiry) when unset.
    #[must_use]
    pub fn expiration(&self) -> Duration {
        self.expiration.unwrap_or_default()
    }

    /// Tags attached to the value.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Client-side cache expiration, [`Duration::ZERO`] when unset.
    #[must_use]
    pub fn client_side_cache_expiration(&self) -> Duration {
        self.client_side_cache_expiration.unwrap_or_default()
    }

    /// Returns `true` if no field has been set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fills every unset field from `defaults`.
    ///
    /// Tags are taken from `defaults` only when none were set here.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use strata_store::Options;
    ///
    /// let defaults = Options::new().with_expiration(Duration::from_secs(300)).with_cost(1);
    /// let merged = Options::new().with_cost(8).or(&defaults);
    ///
    /// assert_eq!(merged.cost(), 8);
    /// assert_eq!(merged.expiration(), Duration::from_secs(300));
    /// ```
    #[must_use]
    pub fn or(self, defaults: &Self) -> Self {
        Self {
            cost: self.cost.or(defaults.cost),
            expiration: self.expiration.or(defaults.expiration),
            tags: if self.tags.is_empty() { defaults.tags.clone() } else { self.tags },
            client_side_cache_expiration: self.client_side_cache_expiration.or(defaults.client_side_cache_expiration),
        }
    }
}

/// Options for tag-based invalidation.
///
/// # Examples
///
/// ```
/// use strata_store::InvalidateOptions;
///
/// let options = InvalidateOptions::new().with_tags(["users"]);
/// assert_eq!(options.tags(), ["users"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvalidateOptions {
    tags: Vec<String>,
}

impl InvalidateOptions {
    /// Creates empty invalidation options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds tags naming the groups to invalidate.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        push_unique(&mut self.tags, tags);
        self
    }

    /// Tags naming the groups to invalidate.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

fn push_unique<I, S>(target: &mut Vec<String>, tags: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    for tag in tags {
        let tag = tag.into();
        if !target.contains(&tag) {
            target.push(tag);
        }
    }
}
