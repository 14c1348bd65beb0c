// The control-plane header placed at the very start of the shared segment.
// Everything after it, for `effective_capacity` bytes, is the raw ring buffer.

use crossbeam_utils::CachePadded;
use std::sync::atomic::AtomicU64;

use crate::Stats::StatsBlock;

/// Bytes reserved for the caller-given name, stored verbatim for diagnostics
/// (the OS resource key is a hash of this, not the name itself - see
/// `Core::SharedMemory`).
pub const NAME_LEN: usize = 32;

const MAGIC: u64 = 0x52_49_4e_47_53_48_4d_00; // "RINGSHM\0"

/// Header occupying the front of the shared segment, ahead of the ring buffer.
#[repr(C)]
pub struct RingHeader {
    magic: AtomicU64,
    /// Usable byte length of the buffer that follows this header, including
    /// the one reserved header-sized tail slot (see `Ring::try_enqueue`).
    capacity: AtomicU64,
    name_len: AtomicU64,
    name: [std::cell::UnsafeCell<u8>; NAME_LEN],
    /// Byte offset the consumer will read next.
    pub(crate) head: CachePadded<AtomicU64>,
    /// Byte offset the producer will write next.
    pub(crate) tail: CachePadded<AtomicU64>,
    pub(crate) stats: StatsBlock,
}

// SAFETY: `name` is written once by the creator before any other process
// attaches, and treated as read-only thereafter; `UnsafeCell` is only needed
// because the header lives in memory the compiler can't prove is exclusively
// ours.
unsafe impl Sync for RingHeader {}

impl RingHeader {
    /// Initializes a freshly-mapped (zeroed) region as a new ring segment.
    ///
    /// # Safety
    /// `header` must point at a `size_of::<RingHeader>()`-byte region that is
    /// writable and not concurrently accessed by another process yet.
    pub unsafe fn init(header: *mut RingHeader, capacity: u64, name: &str) {
        let header = &*header;
        header.head.store(0, std::sync::atomic::Ordering::Relaxed);
        header.tail.store(0, std::sync::atomic::Ordering::Relaxed);
        header.stats.reset();

        let bytes = name.as_bytes();
        let len = bytes.len().min(NAME_LEN);
        for (i, b) in bytes[..len].iter().enumerate() {
            *header.name[i].get() = *b;
        }
        header
            .name_len
            .store(len as u64, std::sync::atomic::Ordering::Relaxed);
        header
            .capacity
            .store(capacity, std::sync::atomic::Ordering::Relaxed);
        header
            .magic
            .store(MAGIC, std::sync::atomic::Ordering::Release);
    }

    /// True iff the region was initialized by [`RingHeader::init`].
    pub fn is_initialized(&self) -> bool {
        self.magic.load(std::sync::atomic::Ordering::Acquire) == MAGIC
    }

    /// The effective capacity stored at creation time (includes the reserved
    /// sentinel slot).
    pub fn capacity(&self) -> u64 {
        self.capacity.load(std::sync::atomic::Ordering::Relaxed)
    }

    /// The name the creator passed to `create`, as stored verbatim.
    pub fn name(&self) -> String {
        let len = self.name_len.load(std::sync::atomic::Ordering::Relaxed) as usize;
        let len = len.min(NAME_LEN);
        let bytes: Vec<u8> = (0..len).map(|i| unsafe { *self.name[i].get() }).collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn stats(&self) -> &StatsBlock {
        &self.stats
    }
}
