// The stats block lives inline in the shared segment so any attached process
// observes the same counters the creator does, not just the one that happens
// to hold the `Producer`/`Consumer` handle.

use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU64, Ordering};

use super::sink::{Counter, Gauge};

/// Cache-padded counters and gauges embedded in the shared segment.
///
/// Every field is padded independently so a hot counter (e.g. `queue`, bumped
/// on every successful enqueue) does not false-share a cache line with a cold
/// one (e.g. `overflow`, bumped once per lap of the ring).
#[repr(C)]
pub struct StatsBlock {
    queue_try: CachePadded<AtomicU64>,
    queue: CachePadded<AtomicU64>,
    dequeue_try: CachePadded<AtomicU64>,
    dequeue: CachePadded<AtomicU64>,
    overflow: CachePadded<AtomicU64>,
    max_enqueue_micros: CachePadded<AtomicU64>,
    enqueue_micros: CachePadded<AtomicU64>,
    max_dequeue_micros: CachePadded<AtomicU64>,
    dequeue_micros: CachePadded<AtomicU64>,
}

impl StatsBlock {
    /// Zeroes every counter and gauge. Called once by the segment creator.
    pub fn reset(&self) {
        self.queue_try.store(0, Ordering::Relaxed);
        self.queue.store(0, Ordering::Relaxed);
        self.dequeue_try.store(0, Ordering::Relaxed);
        self.dequeue.store(0, Ordering::Relaxed);
        self.overflow.store(0, Ordering::Relaxed);
        self.max_enqueue_micros.store(0, Ordering::Relaxed);
        self.enqueue_micros.store(0, Ordering::Relaxed);
        self.max_dequeue_micros.store(0, Ordering::Relaxed);
        self.dequeue_micros.store(0, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn counter(&self, counter: Counter) -> &AtomicU64 {
        match counter {
            Counter::QueueTry => &self.queue_try,
            Counter::Queue => &self.queue,
            Counter::DequeueTry => &self.dequeue_try,
            Counter::Dequeue => &self.dequeue,
            Counter::Overflow => &self.overflow,
        }
    }

    #[inline]
    pub(crate) fn gauge(&self, gauge: Gauge) -> &AtomicU64 {
        match gauge {
            Gauge::MaxEnqueueMicros => &self.max_enqueue_micros,
            Gauge::EnqueueMicros => &self.enqueue_micros,
            Gauge::MaxDequeueMicros => &self.max_dequeue_micros,
            Gauge::DequeueMicros => &self.dequeue_micros,
        }
    }

    /// Snapshot of every counter, for diagnostics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            queue_try: self.queue_try.load(Ordering::Relaxed),
            queue: self.queue.load(Ordering::Relaxed),
            dequeue_try: self.dequeue_try.load(Ordering::Relaxed),
            dequeue: self.dequeue.load(Ordering::Relaxed),
            overflow: self.overflow.load(Ordering::Relaxed),
            max_enqueue_micros: self.max_enqueue_micros.load(Ordering::Relaxed),
            enqueue_micros: self.enqueue_micros.load(Ordering::Relaxed),
            max_dequeue_micros: self.max_dequeue_micros.load(Ordering::Relaxed),
            dequeue_micros: self.dequeue_micros.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of a [`StatsBlock`], safe to hold across process boundaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub queue_try: u64,
    pub queue: u64,
    pub dequeue_try: u64,
    pub dequeue: u64,
    pub overflow: u64,
    pub max_enqueue_micros: u64,
    pub enqueue_micros: u64,
    pub max_dequeue_micros: u64,
    pub dequeue_micros: u64,
}
