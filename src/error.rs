//! Error type shared by every map backend.

use thiserror::Error;

/// Failures reported by table construction and insertion.
///
/// A missing key is not an error: lookups return `None` and removals
/// return `false`.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// The bucket array could not be allocated.
    #[error("out of memory: could not allocate {buckets} buckets")]
    OutOfMemory {
        /// Number of buckets requested.
        buckets: usize,
    },

    /// The size hint cannot be rounded to a supported bucket count.
    #[error("size hint {size_hint} exceeds the largest supported bucket count")]
    CapacityOverflow {
        /// The hint passed to the builder.
        size_hint: usize,
    },

    /// Entry storage is exhausted; nothing was inserted.
    #[error("entry limit of {limit} reached")]
    EntryLimit {
        /// The configured entry budget.
        limit: usize,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = core::result::Result<T, MapError>;
