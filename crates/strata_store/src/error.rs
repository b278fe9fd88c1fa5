// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache operations.

use std::fmt;

/// Boxed, thread-safe error used as the cause of cache errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An error from a cache operation.
///
/// Not-found is a separate category: chain and loadable caches treat
/// it as "try the next source", while every other variant is a fault that is
/// propagated unchanged to the immediate caller.
///
/// # Examples
///
/// ```
/// use strata_store::Error;
///
/// let missing = Error::not_found();
/// assert!(missing.is_not_found());
///
/// let fault = Error::from_message("connection refused");
/// assert!(!fault.is_not_found());
/// ```
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The key is not present, optionally wrapping the backend-specific cause.
    #[error("value not found in store")]
    NotFound {
        /// Backend-specific cause, if the store reported one.
        #[source]
        cause: Option<BoxError>,
    },

    /// Any other store-level failure (serialization, connectivity, ...).
    #[error("store operation failed: {0}")]
    Store(#[source] BoxError),

    /// One or more tiers of a chain failed; successful tiers are not listed.
    #[error("{}", AggregateMessage(.0))]
    Aggregate(Vec<TierError>),

    /// A job was submitted to a propagation queue that no longer accepts work.
    #[error("propagation queue is closed")]
    Closed,
}

impl Error {
    /// Creates a not-found error without a cause.
    #[must_use]
    pub fn not_found() -> Self {
        Self::NotFound { cause: None }
    }

    /// Creates a not-found error wrapping a backend-specific cause.
    pub fn not_found_caused_by(cause: impl Into<BoxError>) -> Self {
        Self::NotFound { cause: Some(cause.into()) }
    }

    /// Creates a store fault from any error type.
    pub fn from_source(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Store(Box::new(source))
    }

    /// Creates a store fault from a message or boxed error.
    ///
    /// # Examples
    ///
    /// ```
    /// use strata_store::Error;
    ///
    /// let error = Error::from_message("operation failed");
    /// assert!(error.to_string().contains("operation failed"));
    /// ```
    pub fn from_message(cause: impl Into<BoxError>) -> Self {
        Self::Store(cause.into())
    }

    /// Returns `true` if this error means "absent" rather than "failed".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns the per-tier failures of an aggregate error, or an empty slice.
    #[must_use]
    pub fn tier_errors(&self) -> &[TierError] {
        match self {
            Self::Aggregate(errors) => errors,
            _ => &[],
        }
    }
}

/// A failure of a single tier inside a multi-tier operation.
#[derive(Debug, thiserror::Error)]
#[error("{label} (tier {index}): {source}")]
pub struct TierError {
    index: usize,
    label: String,
    #[source]
    source: Error,
}

impl TierError {
    /// Creates a tier error for the tier at `index` identified by `label`.
    pub fn new(index: usize, label: impl Into<String>, source: Error) -> Self {
        Self {
            index,
            label: label.into(),
            source,
        }
    }

    /// Position of the failing tier in its chain.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Identity label of the failing tier.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The tier's own error.
    #[must_use]
    pub fn error(&self) -> &Error {
        &self.source
    }
}

struct AggregateMessage<'a>(&'a [TierError]);

impl fmt::Display for AggregateMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "operation failed on {} tier(s)", self.0.len())?;
        for (i, error) in self.0.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{error}")?;
        }
        Ok(())
    }
}

/// A specialized [`Result`] type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;
