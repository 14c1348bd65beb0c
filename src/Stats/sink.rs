use std::sync::atomic::Ordering;

use super::block::StatsBlock;

/// Protocol points the core ring records a counter at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// An enqueue was attempted (before the full/CAS-retry check).
    QueueTry,
    /// An enqueue completed with `EnqueueStatus::Ok`.
    Queue,
    /// A dequeue was attempted.
    DequeueTry,
    /// A dequeue completed with `DequeueStatus::Ok`.
    Dequeue,
    /// A wraparound sentinel was published or consumed.
    Overflow,
}

/// Timing gauges the core ring updates at protocol points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gauge {
    MaxEnqueueMicros,
    EnqueueMicros,
    MaxDequeueMicros,
    DequeueMicros,
}

/// A side-effect sink for protocol-point counters and timing gauges.
///
/// `record`/`record_value` are the only two operations; there is no way to
/// read a sink back out through this trait; readers use [`StatsBlock::snapshot`]
/// directly since the block lives in shared memory visible to every attachment.
pub trait StatsSink {
    fn record(&self, counter: Counter);
    fn record_value(&self, gauge: Gauge, value: u64);
}

/// A sink backed by a [`StatsBlock`] embedded in the shared segment.
///
/// `record_value` updates both the "current" gauge and, if the new value is
/// larger, the paired "max" gauge (e.g. `EnqueueMicros` also feeds
/// `MaxEnqueueMicros`).
pub struct SharedStatsSink<'a> {
    block: &'a StatsBlock,
}

impl<'a> SharedStatsSink<'a> {
    pub fn new(block: &'a StatsBlock) -> Self {
        Self { block }
    }
}

impl StatsSink for SharedStatsSink<'_> {
    #[inline]
    fn record(&self, counter: Counter) {
        self.block.counter(counter).fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn record_value(&self, gauge: Gauge, value: u64) {
        let max_gauge = match gauge {
            Gauge::EnqueueMicros => Some(Gauge::MaxEnqueueMicros),
            Gauge::DequeueMicros => Some(Gauge::MaxDequeueMicros),
            Gauge::MaxEnqueueMicros | Gauge::MaxDequeueMicros => None,
        };
        self.block.gauge(gauge).store(value, Ordering::Relaxed);
        if let Some(max_gauge) = max_gauge {
            let max = self.block.gauge(max_gauge);
            let mut current = max.load(Ordering::Relaxed);
            while value > current {
                match max.compare_exchange_weak(
                    current,
                    value,
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break,
                    Err(observed) => current = observed,
                }
            }
        }
    }
}

/// A sink that discards everything. Used when the caller disabled stats at
/// segment creation; every call becomes a no-op the optimizer can remove.
pub struct NullStatsSink;

impl StatsSink for NullStatsSink {
    #[inline(always)]
    fn record(&self, _counter: Counter) {}
    #[inline(always)]
    fn record_value(&self, _gauge: Gauge, _value: u64) {}
}
