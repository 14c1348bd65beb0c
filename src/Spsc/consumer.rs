use std::sync::Arc;

use crate::error::DequeueStatus;
use crate::Core::Segment;
use crate::Stats::{NullStatsSink, SharedStatsSink, StatsSink};

use super::Ring::Ring;

/// The single reader side of a ring segment.
pub struct Consumer {
    segment: Arc<Segment>,
    ring: Ring,
    record_stats: bool,
}

unsafe impl Send for Consumer {}

impl Consumer {
    pub(crate) fn new(segment: Arc<Segment>, record_stats: bool) -> Self {
        let ring = unsafe { segment.ring() };
        Self {
            segment,
            ring,
            record_stats,
        }
    }

    /// Attempts to dequeue the next unread payload. Never blocks.
    ///
    /// A `CasRetry` result (lost race, or a wraparound sentinel was just
    /// consumed) should be retried immediately rather than treated as
    /// `Empty`.
    ///
    /// See [`Producer::try_enqueue`](super::Producer::try_enqueue) for why
    /// `record_stats` is a plain `bool` branch between two monomorphized
    /// calls rather than a runtime dispatch through a trait object.
    pub fn try_dequeue(&self) -> DequeueStatus<'_> {
        if self.record_stats {
            self.ring
                .try_dequeue(&SharedStatsSink::new(self.segment.stats_block()))
        } else {
            self.ring.try_dequeue(&NullStatsSink)
        }
    }

    pub fn name(&self) -> &str {
        self.segment.name()
    }

    pub fn capacity(&self) -> u64 {
        self.ring.capacity()
    }

    pub fn stats(&self) -> crate::Stats::StatsSnapshot {
        self.segment.stats()
    }

    /// Atomically loads the marker word at `offset`, for diagnostics only.
    pub fn inspect(&self, offset: u64) -> u64 {
        self.segment.inspect(offset)
    }
}
