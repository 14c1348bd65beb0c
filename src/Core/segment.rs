// Segment lifecycle: one named shared-memory mapping holds exactly one ring
// (unlike the multi-channel table some shared-memory allocators use), since
// the spec this backs is a single producer/consumer pair per name.

use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::Mutex;

use super::getters::{buffer_ptr, header_ptr, mapping_size};
use super::SharedMemory::{
    attach_shared_memory, create_shared_memory, unlink_shared_memory, PosixSharedMemory, RawHandle,
    SharedMemoryBackend, DEFAULT_MODE,
};
use crate::error::SegmentError;
use crate::Spsc::Ring::{RingHeader, NAME_LEN};
use crate::Spsc::Ring as RingView;

/// Minimum requested capacity: room for one zero-length payload slot. The
/// sentinel slot `create_with_mode` reserves for wraparound is added on top
/// of whatever the caller requests, not carved out of it.
pub const MIN_CAPACITY: u64 = RingView::HEADER_SIZE as u64;

/// A live shared-memory mapping backing a single ring.
///
/// Creation and attach both funnel through a process-wide mutex purely to
/// serialize the create-then-init sequence against a second `create` racing
/// on the same name; it has no bearing on the lock-free producer/consumer
/// fast path once a `Segment` exists.
pub struct Segment {
    handle: RawHandle,
    name: String,
    owns_resource: bool,
}

static CREATE_LOCK: Mutex<()> = Mutex::new(());

// SAFETY: `RawHandle` is `Send + Sync`; `Segment` adds no additional
// unsynchronized state.
unsafe impl Send for Segment {}
unsafe impl Sync for Segment {}

impl Segment {
    /// Creates a brand-new segment named `name` with `capacity` usable bytes.
    ///
    /// Fails if a segment with this name already exists. The creator is the
    /// one process that initializes the header; every subsequent `attach`
    /// just maps the existing region.
    pub fn create(name: &str, capacity: u64) -> Result<Self, SegmentError> {
        Self::create_with_mode(name, capacity, DEFAULT_MODE)
    }

    pub fn create_with_mode(name: &str, capacity: u64, mode: libc::mode_t) -> Result<Self, SegmentError> {
        if name.len() > NAME_LEN {
            return Err(SegmentError::NameTooLong {
                name: name.to_owned(),
                max: NAME_LEN,
            });
        }
        if capacity < MIN_CAPACITY {
            return Err(SegmentError::CapacityTooSmall {
                requested: capacity,
                minimum: MIN_CAPACITY,
            });
        }

        let _guard = CREATE_LOCK.lock();
        // The caller's `capacity` is the usable space they asked for; the
        // reserved sentinel slot (see `Ring::try_enqueue`'s wraparound check)
        // is carved out of extra room added on top, not out of what they
        // requested.
        let effective_capacity = capacity + RingView::HEADER_SIZE as u64;
        let size = mapping_size(effective_capacity);
        let handle = create_shared_memory(name, size, mode)?;

        unsafe {
            RingHeader::init(header_ptr(handle.addr), effective_capacity, name);
        }
        info!("created ring segment {name:?} ({effective_capacity} bytes, {capacity} requested)");

        Ok(Self {
            handle,
            name: name.to_owned(),
            owns_resource: true,
        })
    }

    /// Attaches to an existing segment created by another process.
    pub fn attach(name: &str) -> Result<Self, SegmentError> {
        let handle = attach_shared_memory(name)?;
        let header = unsafe { &*header_ptr(handle.addr) };
        if !header.is_initialized() {
            warn!("attached to {name:?} before the creator finished initializing it");
            return Err(SegmentError::NotInitialized {
                name: name.to_owned(),
            });
        }
        debug!("attached to ring segment {name:?} ({} bytes)", header.capacity());

        Ok(Self {
            handle,
            name: name.to_owned(),
            owns_resource: false,
        })
    }

    /// Builds the `Ring` view over this segment's header and buffer.
    ///
    /// # Safety
    /// The returned `Ring` borrows raw pointers into this segment's mapping;
    /// it must not outlive `self`.
    pub unsafe fn ring(&self) -> RingView::Ring {
        RingView::Ring::new(header_ptr(self.handle.addr), buffer_ptr(self.handle.addr))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u64 {
        unsafe { (*header_ptr(self.handle.addr)).capacity() }
    }

    fn header(&self) -> &RingHeader {
        unsafe { &*header_ptr(self.handle.addr) }
    }

    /// A point-in-time snapshot of the segment's counters.
    pub fn stats(&self) -> crate::Stats::StatsSnapshot {
        self.header().stats().snapshot()
    }

    /// Atomically loads the marker word at `offset`, for diagnostics only.
    ///
    /// Does not advance `head`/`tail` and is safe to call from a process
    /// that is neither the producer nor the consumer.
    pub fn inspect(&self, offset: u64) -> u64 {
        unsafe { self.ring().inspect(offset) }
    }

    /// The shared counters block, for building a [`crate::Stats::SharedStatsSink`].
    pub(crate) fn stats_block(&self) -> &crate::Stats::StatsBlock {
        self.header().stats()
    }

    /// Removes the OS-level name, preventing further attaches.
    ///
    /// Only meaningful for the creator; calling it on an attached-only
    /// segment still works (POSIX doesn't distinguish), but by convention
    /// destruction is the creator's responsibility.
    pub fn destroy(self) -> Result<(), SegmentError> {
        unlink_shared_memory(&self.name)
    }
}

impl Drop for Segment {
    fn drop(&mut self) {
        PosixSharedMemory.unmap(&self.handle);
        if self.owns_resource {
            debug!("unmapped owned segment {:?}", self.name);
        }
    }
}

/// A shareable handle to a segment, for producer/consumer pairs that want
/// to hand out cloneable references without duplicating the mapping.
pub type SegmentHandle = Arc<Segment>;
