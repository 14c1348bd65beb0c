// The ring discipline itself: wraparound sentinel, full/empty disambiguation
// via offset-bound markers, and the publish/consume ordering that lets a
// concurrent reader never observe a half-written payload.

use std::ptr;
use std::sync::atomic::Ordering;
use std::time::Instant;

use super::header::{is_read, is_unread, is_valid, set_read, set_unread, valid_mask, SlotHeader, HEADER_SIZE};
use super::layout::RingHeader;
use crate::error::{DequeueStatus, EnqueueStatus};
use crate::Stats::{Counter, Gauge, StatsSink};

/// The exact on-ring footprint of a payload of `payload_size` bytes.
#[inline]
pub const fn byte_size(payload_size: usize) -> usize {
    HEADER_SIZE + payload_size
}

/// A view over a ring segment's control header and raw buffer.
///
/// `Ring` does not own the memory it points into; it is a thin handle
/// constructed over a mapping owned by `Core::segment::Segment`. Every
/// method takes `&self` - the single-writer-of-`tail` / single-writer-of-`head`
/// discipline is a caller contract (exactly one `Producer`, one `Consumer`),
/// not something the type system enforces.
#[derive(Debug)]
pub struct Ring {
    header: *const RingHeader,
    buffer: *mut u8,
    capacity: u64,
}

// SAFETY: the ring is only ever used under the single-producer/single-consumer
// discipline documented on the type; the pointers refer to shared memory that
// outlives every `Ring` built over it (owned by the segment mapping).
unsafe impl Send for Ring {}
unsafe impl Sync for Ring {}

impl Ring {
    /// Builds a view over an already-initialized ring segment.
    ///
    /// # Safety
    /// `header` must point at a valid, initialized `RingHeader` and `buffer`
    /// must point at exactly `header.capacity()` writable bytes that outlive
    /// this `Ring`.
    pub unsafe fn new(header: *const RingHeader, buffer: *mut u8) -> Self {
        let capacity = (*header).capacity();
        Self {
            header,
            buffer,
            capacity,
        }
    }

    #[inline]
    fn header(&self) -> &RingHeader {
        unsafe { &*self.header }
    }

    #[inline]
    unsafe fn slot(&self, offset: u64) -> *const SlotHeader {
        self.buffer.add(offset as usize).cast::<SlotHeader>()
    }

    #[inline]
    unsafe fn payload_ptr(&self, offset: u64) -> *mut u8 {
        self.buffer.add(offset as usize + HEADER_SIZE)
    }

    /// Total usable capacity, including the reserved sentinel slot.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Atomically loads the marker at `offset`, without side effects.
    ///
    /// For diagnostics only - not part of the producer/consumer protocol.
    pub fn inspect(&self, offset: u64) -> u64 {
        let slot = unsafe { &*self.slot(offset) };
        slot.marker.load(Ordering::Acquire)
    }

    /// Attempts to enqueue `payload`, recording protocol-point stats on `sink`.
    ///
    /// Generic over `S: StatsSink` rather than `&dyn StatsSink` so a
    /// disabled sink ([`crate::Stats::NullStatsSink`]) monomorphizes to a
    /// call with no vtable indirection and nothing left for the optimizer to
    /// remove - not a runtime branch through a trait object.
    ///
    /// Iterates (does not recurse) across at most one wraparound sentinel
    /// publication per call, since a single enqueue can cross the end of the
    /// ring at most once.
    pub fn try_enqueue<S: StatsSink>(&self, payload: &[u8], sink: &S) -> EnqueueStatus {
        sink.record(Counter::QueueTry);
        let start = Instant::now();

        loop {
            let tail = self.header().tail.load(Ordering::Relaxed);
            let mut next_tail = tail + HEADER_SIZE as u64 + payload.len() as u64;
            let wraparound = next_tail + HEADER_SIZE as u64 > self.capacity;
            if wraparound {
                next_tail = 0;
            }

            if self
                .header()
                .tail
                .compare_exchange(tail, next_tail, Ordering::AcqRel, Ordering::Relaxed)
                .is_err()
            {
                log::debug!("enqueue lost the tail CAS at offset {tail}, caller should retry");
                return EnqueueStatus::CasRetry;
            }

            if wraparound {
                sink.record(Counter::Overflow);
                log::warn!("ring wrapped: publishing end-of-ring sentinel at offset {tail}");
                let slot = unsafe { &*self.slot(tail) };
                slot.size.store(self.capacity, Ordering::Relaxed);
                slot.marker
                    .store(set_unread(valid_mask(tail)), Ordering::Release);
                continue;
            }

            let slot = unsafe { &*self.slot(tail) };
            let marker = slot.marker.load(Ordering::Acquire);
            if is_valid(marker, tail) && is_unread(marker) {
                // Single-producer discipline makes restoring `tail` safe: no
                // other writer could have advanced it since our CAS landed.
                self.header().tail.store(tail, Ordering::Relaxed);
                return EnqueueStatus::Full;
            }

            unsafe {
                ptr::copy_nonoverlapping(payload.as_ptr(), self.payload_ptr(tail), payload.len());
            }
            slot.size.store(payload.len() as u64, Ordering::Relaxed);
            slot.marker
                .store(set_unread(valid_mask(tail)), Ordering::Release);

            let micros = start.elapsed().as_micros() as u64;
            sink.record_value(Gauge::EnqueueMicros, micros);
            sink.record(Counter::Queue);
            return EnqueueStatus::Ok;
        }
    }

    /// Attempts to dequeue the slot at `head`, recording protocol-point stats.
    ///
    /// Generic over `S: StatsSink`, same reasoning as [`Ring::try_enqueue`].
    ///
    /// A wraparound sentinel is consumed by marking it read and returning
    /// `CasRetry` so the caller's poll loop re-enters at the new `head == 0`;
    /// this call never loops internally past one sentinel.
    pub fn try_dequeue<'a, S: StatsSink>(&'a self, sink: &S) -> DequeueStatus<'a> {
        sink.record(Counter::DequeueTry);
        let start = Instant::now();

        let head = self.header().head.load(Ordering::Relaxed);
        let tail = self.header().tail.load(Ordering::Relaxed);
        let slot = unsafe { &*self.slot(head) };
        let marker = slot.marker.load(Ordering::Acquire);

        if head == tail && (!is_valid(marker, head) || is_read(marker)) {
            return DequeueStatus::Empty;
        }
        if !is_valid(marker, head) || is_read(marker) {
            return DequeueStatus::Empty;
        }

        let size = slot.size.load(Ordering::Relaxed);
        let mut next_head = head + HEADER_SIZE as u64 + size;
        let wraparound = next_head > self.capacity;
        if wraparound {
            next_head = 0;
        }

        if self
            .header()
            .head
            .compare_exchange(head, next_head, Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            log::debug!("dequeue lost the head CAS at offset {head}, caller should retry");
            return DequeueStatus::CasRetry;
        }

        if wraparound {
            sink.record(Counter::Overflow);
            log::warn!("consumer crossed end-of-ring sentinel at offset {head}, wrapping to 0");
            slot.marker
                .store(set_read(valid_mask(head)), Ordering::Release);
            return DequeueStatus::CasRetry;
        }

        // Reset the header now; `release` (below) only needs to scrub the
        // payload bytes once the caller is done reading them.
        slot.size.store(0, Ordering::Relaxed);
        slot.marker.store(0, Ordering::Release);

        let micros = start.elapsed().as_micros() as u64;
        sink.record_value(Gauge::DequeueMicros, micros);
        sink.record(Counter::Dequeue);

        let payload = unsafe { std::slice::from_raw_parts(self.payload_ptr(head), size as usize) };
        DequeueStatus::Ok(Lease {
            ring: self,
            payload,
        })
    }
}

/// A borrowed view of a dequeued payload.
///
/// Ownership of the referenced bytes lasts only until [`Lease::release`] is
/// called; the caller must not hold it across a subsequent `try_dequeue`
/// (impossible under SPSC anyway, since there is exactly one consumer).
#[derive(Debug)]
pub struct Lease<'a> {
    ring: &'a Ring,
    payload: &'a [u8],
}

impl<'a> Lease<'a> {
    /// The dequeued payload bytes.
    pub fn as_slice(&self) -> &[u8] {
        self.payload
    }

    /// Zeros the payload bytes this lease pointed at.
    ///
    /// Mandatory after every successful dequeue: the full/empty
    /// disambiguation on the producer side depends on a consumed slot
    /// reading back as all-zero.
    pub fn release(self) {
        let _ = &self.ring;
        unsafe {
            ptr::write_bytes(self.payload.as_ptr() as *mut u8, 0, self.payload.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Stats::StatsBlock;
    use std::alloc::{alloc_zeroed, dealloc, Layout};

    struct TestRing {
        ptr: *mut u8,
        layout: Layout,
    }

    impl Drop for TestRing {
        fn drop(&mut self) {
            unsafe { dealloc(self.ptr, self.layout) };
        }
    }

    fn make_ring(capacity: u64) -> (TestRing, Ring) {
        let header_size = std::mem::size_of::<RingHeader>();
        let total = header_size + capacity as usize;
        let layout = Layout::from_size_align(total, 64).unwrap();
        let ptr = unsafe { alloc_zeroed(layout) };
        assert!(!ptr.is_null());

        let header_ptr = ptr.cast::<RingHeader>();
        unsafe { RingHeader::init(header_ptr, capacity, "test") };

        let buffer = unsafe { ptr.add(header_size) };
        let ring = unsafe { Ring::new(header_ptr, buffer) };
        (TestRing { ptr, layout }, ring)
    }

    #[test]
    fn enqueue_then_dequeue_roundtrip() {
        let (_backing, ring) = make_ring(256);
        let sink = crate::Stats::NullStatsSink;

        assert_eq!(ring.try_enqueue(b"AB", &sink), EnqueueStatus::Ok);
        match ring.try_dequeue(&sink) {
            DequeueStatus::Ok(lease) => {
                assert_eq!(lease.as_slice(), b"AB");
                lease.release();
            }
            other => panic!("expected Ok, got {other:?}"),
        }
        assert_eq!(ring.try_dequeue(&sink), DequeueStatus::Empty);
    }

    #[test]
    fn full_then_drain_then_enqueue_succeeds() {
        let header_size = HEADER_SIZE as u64;
        let (_backing, ring) = make_ring(header_size * 4);
        let sink = crate::Stats::NullStatsSink;

        // Each empty payload occupies exactly one header's worth of bytes.
        loop {
            match ring.try_enqueue(&[], &sink) {
                EnqueueStatus::Ok => continue,
                EnqueueStatus::Full => break,
                EnqueueStatus::CasRetry => unreachable!("single producer, no contention"),
            }
        }

        match ring.try_dequeue(&sink) {
            DequeueStatus::Ok(lease) => lease.release(),
            other => panic!("expected Ok, got {other:?}"),
        }

        assert_eq!(ring.try_enqueue(&[], &sink), EnqueueStatus::Ok);
    }

    #[test]
    fn wraparound_publishes_sentinel_and_continues() {
        let (_backing, ring) = make_ring(64);
        let sink = crate::Stats::NullStatsSink;

        // header size is 16 bytes; three 16-byte payloads force a wrap.
        let payload = [0xABu8; 16];
        assert_eq!(ring.try_enqueue(&payload, &sink), EnqueueStatus::Ok);
        assert_eq!(ring.try_enqueue(&payload, &sink), EnqueueStatus::Ok);
        // This one wraps: tail was at 32, next_tail would be 64, leaving no
        // room for a trailing sentinel header, so it resets to 0.
        assert_eq!(ring.try_enqueue(&payload, &sink), EnqueueStatus::Ok);

        for _ in 0..3 {
            loop {
                match ring.try_dequeue(&sink) {
                    DequeueStatus::Ok(lease) => {
                        assert_eq!(lease.as_slice(), &payload[..]);
                        lease.release();
                        break;
                    }
                    DequeueStatus::CasRetry => continue, // consumed the sentinel
                    DequeueStatus::Empty => panic!("ring should not be empty yet"),
                }
            }
        }
    }

    #[test]
    fn release_scrubs_payload_bytes() {
        let (_backing, ring) = make_ring(256);
        let sink = crate::Stats::NullStatsSink;

        assert_eq!(ring.try_enqueue(b"hello", &sink), EnqueueStatus::Ok);
        let ptr = match ring.try_dequeue(&sink) {
            DequeueStatus::Ok(lease) => {
                let ptr = lease.as_slice().as_ptr();
                lease.release();
                ptr
            }
            other => panic!("expected Ok, got {other:?}"),
        };
        let scrubbed = unsafe { std::slice::from_raw_parts(ptr, 5) };
        assert_eq!(scrubbed, &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn full_does_not_mutate_tail_or_slot() {
        let header_size = HEADER_SIZE as u64;
        let (_backing, ring) = make_ring(header_size * 2);
        let sink = crate::Stats::NullStatsSink;

        assert_eq!(ring.try_enqueue(&[], &sink), EnqueueStatus::Ok);
        let tail_before = ring.header().tail.load(Ordering::Relaxed);
        assert_eq!(ring.try_enqueue(&[], &sink), EnqueueStatus::Full);
        let tail_after = ring.header().tail.load(Ordering::Relaxed);
        assert_eq!(tail_before, tail_after);
    }

    #[test]
    fn byte_size_matches_header_plus_payload() {
        for n in [0usize, 1, 8, 4096] {
            assert_eq!(byte_size(n), HEADER_SIZE + n);
        }
    }
}
