use std::sync::Arc;

use crate::error::EnqueueStatus;
use crate::Core::Segment;
use crate::Stats::{NullStatsSink, SharedStatsSink, StatsSink};

use super::Ring::Ring;

/// The single writer side of a ring segment.
///
/// Holding a `Producer` is itself the contract: the protocol is only sound
/// with exactly one producer and one consumer live against a segment at a
/// time. Nothing in this type enforces that at runtime.
pub struct Producer {
    segment: Arc<Segment>,
    ring: Ring,
    record_stats: bool,
}

// SAFETY: `Ring` is `Send + Sync`; `Producer` adds no further shared state
// beyond the `Arc<Segment>` it holds to keep the mapping alive.
unsafe impl Send for Producer {}

impl Producer {
    pub(crate) fn new(segment: Arc<Segment>, record_stats: bool) -> Self {
        let ring = unsafe { segment.ring() };
        Self {
            segment,
            ring,
            record_stats,
        }
    }

    /// Attempts to publish `payload`. Never blocks.
    ///
    /// `Ring::try_enqueue` is generic over the sink type, so each branch
    /// below monomorphizes to its own call with the sink's `record`/
    /// `record_value` calls inlined directly - `without_stats()` costs a
    /// `bool` check, not a vtable call through a disabled sink.
    pub fn try_enqueue(&self, payload: &[u8]) -> EnqueueStatus {
        if self.record_stats {
            self.ring
                .try_enqueue(payload, &SharedStatsSink::new(self.segment.stats_block()))
        } else {
            self.ring.try_enqueue(payload, &NullStatsSink)
        }
    }

    /// The name this producer's segment was created or attached under.
    pub fn name(&self) -> &str {
        self.segment.name()
    }

    /// Usable capacity of the ring, in bytes.
    pub fn capacity(&self) -> u64 {
        self.ring.capacity()
    }

    /// A point-in-time snapshot of this segment's counters.
    pub fn stats(&self) -> crate::Stats::StatsSnapshot {
        self.segment.stats()
    }

    /// Atomically loads the marker word at `offset`, for diagnostics only.
    pub fn inspect(&self, offset: u64) -> u64 {
        self.segment.inspect(offset)
    }
}
