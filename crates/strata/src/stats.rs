// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-store usage counters.

/// Usage counters of one store.
///
/// Each field counts completed calls of one family and outcome. Counters only
/// grow; a snapshot obtained through [`StatsProvider::get_stats`] is a plain copy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Stats {
    /// Successful reads.
    pub hits: u64,
    /// Failed reads, not-found included.
    pub miss: u64,
    /// Successful writes.
    pub set_success: u64,
    /// Failed writes.
    pub set_error: u64,
    /// Successful deletes.
    pub delete_success: u64,
    /// Failed deletes.
    pub delete_error: u64,
    /// Successful tag invalidations.
    pub invalidate_success: u64,
    /// Failed tag invalidations.
    pub invalidate_error: u64,
    /// Successful clears.
    pub clear_success: u64,
    /// Failed clears.
    pub clear_error: u64,
}

impl Stats {
    /// Returns every counter paired with its metric name.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata::Stats;
    ///
    /// let stats = Stats { hits: 3, ..Stats::default() };
    /// let (name, value) = stats.counters()[0];
    /// assert_eq!((name, value), ("hit_count", 3));
    /// ```
    #[must_use]
    pub fn counters(&self) -> [(&'static str, u64); 10] {
        [
            ("hit_count", self.hits),
            ("miss_count", self.miss),
            ("set_success", self.set_success),
            ("set_error", self.set_error),
            ("delete_success", self.delete_success),
            ("delete_error", self.delete_error),
            ("invalidate_success", self.invalidate_success),
            ("invalidate_error", self.invalidate_error),
            ("clear_success", self.clear_success),
            ("clear_error", self.clear_error),
        ]
    }
}

/// Source of a [`Stats`] snapshot for one store.
///
/// This is the view a [`MetricsSink`](crate::MetricsSink) gets of a terminal cache.
pub trait StatsProvider: Send + Sync {
    /// Label of the underlying store.
    fn identify(&self) -> &str;

    /// Returns a copy of the current counters.
    fn get_stats(&self) -> Stats;
}
