//! `Debug` impls kept apart from the core types themselves, so the hot-path
//! modules stay free of formatting code.

use std::fmt;

use crate::Core::Segment;
use crate::Spsc::Ring::Ring;
use crate::Spsc::{Consumer, Producer};

impl fmt::Debug for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Segment")
            .field("name", &self.name())
            .field("capacity", &self.capacity())
            .field("stats", &self.stats())
            .finish()
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("name", &self.name())
            .field("capacity", &self.capacity())
            .finish()
    }
}

impl fmt::Debug for Consumer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("name", &self.name())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Dumps the marker and size words for the first `count` header-sized
/// offsets. Intended for interactive debugging, not the protocol itself.
pub fn dump_headers(ring: &Ring, count: u64) -> Vec<(u64, u64)> {
    let header_size = crate::Spsc::Ring::HEADER_SIZE as u64;
    (0..count)
        .map(|i| i * header_size)
        .filter(|&offset| offset < ring.capacity())
        .map(|offset| (offset, ring.inspect(offset)))
        .collect()
}
