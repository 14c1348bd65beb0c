use std::sync::Arc;

use crate::error::SegmentError;
use crate::Core::Segment;
use crate::Core::SharedMemory::DEFAULT_MODE;

use super::consumer::Consumer;
use super::producer::Producer;

/// Default ring capacity when the caller doesn't specify one: generous
/// enough for a few thousand small control messages, small enough not to
/// surprise anyone who forgot to call `with_capacity`.
const DEFAULT_CAPACITY: u64 = 64 * 1024;

/// Builds a [`Producer`] or [`Consumer`] over a named shared-memory ring.
///
/// Mirrors the create-vs-attach split at the `Segment` level: a `Producer`
/// is only ever built by creating a brand-new segment, a `Consumer` by
/// attaching to one a producer already created.
pub struct QueueBuilder {
    name: String,
    capacity: u64,
    mode: libc::mode_t,
    record_stats: bool,
}

impl QueueBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: DEFAULT_CAPACITY,
            mode: DEFAULT_MODE,
            record_stats: true,
        }
    }

    /// Sets the usable ring capacity in bytes. Only meaningful for
    /// [`QueueBuilder::create_producer`]; an attaching consumer inherits
    /// whatever capacity the creator chose.
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the POSIX permission bits the segment is created with.
    pub fn with_mode(mut self, mode: libc::mode_t) -> Self {
        self.mode = mode;
        self
    }

    /// Disables stats recording on the fast path, for callers that have
    /// measured the overhead is unacceptable for their workload.
    pub fn without_stats(mut self) -> Self {
        self.record_stats = false;
        self
    }

    /// Creates a brand-new segment and returns the producer side.
    ///
    /// Fails if a segment under this name already exists.
    pub fn create_producer(self) -> Result<Producer, SegmentError> {
        let segment = Segment::create_with_mode(&self.name, self.capacity, self.mode)?;
        Ok(Producer::new(Arc::new(segment), self.record_stats))
    }

    /// Attaches to an existing segment and returns the consumer side.
    pub fn attach_consumer(self) -> Result<Consumer, SegmentError> {
        let segment = Segment::attach(&self.name)?;
        Ok(Consumer::new(Arc::new(segment), self.record_stats))
    }
}
