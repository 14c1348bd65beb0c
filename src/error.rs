//! Error and status types.
//!
//! Fallible, rare operations (segment creation, attach) return a
//! `thiserror`-derived [`SegmentError`] so callers get a real error chain.
//! The hot path (`try_enqueue`/`try_dequeue`) never allocates or formats an
//! error: it returns a plain `Copy` enum instead.

use std::io;

use crate::Spsc::Lease;

/// Failure modes for creating or attaching a shared-memory ring segment.
#[derive(Debug, thiserror::Error)]
pub enum SegmentError {
    #[error("shm_open failed for key {key:?}: {source}")]
    Open {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("ftruncate to {size} bytes failed: {source}")]
    Truncate {
        size: u64,
        #[source]
        source: io::Error,
    },

    #[error("mmap failed: {source}")]
    Map {
        #[source]
        source: io::Error,
    },

    #[error("shm_unlink failed for key {key:?}: {source}")]
    Unlink {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("segment {name:?} does not carry the expected header: found magic mismatch")]
    NotInitialized { name: String },

    #[error("requested capacity {requested} is below the minimum of {minimum} bytes (room for one slot header); the reserved sentinel slot is added on top automatically")]
    CapacityTooSmall { requested: u64, minimum: u64 },

    #[error("segment name {name:?} exceeds the {max} byte limit")]
    NameTooLong { name: String, max: usize },
}

/// Outcome of a single [`crate::Spsc::Producer::try_enqueue`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueStatus {
    /// The payload was published; the consumer will observe it.
    Ok,
    /// The ring has no room; the caller should retry later.
    Full,
    /// Lost a compare-and-swap race on `tail`.
    ///
    /// Under the single-producer contract this indicates a misuse (two
    /// writers) rather than ordinary contention; callers still treat it as
    /// transient and retry, matching the non-blocking, poll-based design.
    CasRetry,
}

/// Outcome of a single [`crate::Spsc::Consumer::try_dequeue`] call.
#[derive(Debug)]
pub enum DequeueStatus<'a> {
    /// A payload was dequeued; read it via [`Lease::as_slice`] and call
    /// [`Lease::release`] when done.
    Ok(Lease<'a>),
    /// The ring has nothing unread.
    Empty,
    /// Lost a compare-and-swap race on `head`, or consumed a wraparound
    /// sentinel; the caller should retry immediately.
    CasRetry,
}

impl<'a> PartialEq for DequeueStatus<'a> {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (DequeueStatus::Empty, DequeueStatus::Empty)
                | (DequeueStatus::CasRetry, DequeueStatus::CasRetry)
        )
    }
}
