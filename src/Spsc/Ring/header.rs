// Per-slot header codec: offset-bound validity markers.
//
// A marker encodes two things in one atomic word: a validity tag derived
// from the slot's own byte offset, and a single read/unread bit. A single
// atomic load therefore answers both "is this my slot's header?" and "has
// the producer published it?".
//
// Encoding: marker = ((offset + 1) << 1) | unread_bit
//
// Shifting the offset left by one and reserving bit 0 for the read/unread
// flag means `marker >> 1` recovers `offset + 1` regardless of the flag.
// The `+ 1` is what keeps the all-zero word (the state of freshly-mapped,
// freshly-zeroed shared memory) from ever satisfying `is_valid(0, 0)`.

use std::sync::atomic::AtomicU64;

/// Size in bytes of one [`SlotHeader`] as laid out in the shared segment.
pub const HEADER_SIZE: usize = std::mem::size_of::<SlotHeader>();

/// The fixed-size header that precedes every slot's payload bytes.
#[repr(C)]
pub struct SlotHeader {
    /// Payload length in bytes, or (for a sentinel) the ring's remaining capacity.
    pub size: AtomicU64,
    /// Validity-for-offset tag combined with the read/unread bit.
    pub marker: AtomicU64,
}

/// Builds the validity tag for a slot at `offset`, with the read/unread bit unset.
#[inline]
pub const fn valid_mask(offset: u64) -> u64 {
    (offset + 1) << 1
}

/// Sets the unread bit on top of a validity mask (or any marker).
#[inline]
pub const fn set_unread(marker: u64) -> u64 {
    marker | 1
}

/// Clears the unread bit, marking the slot as read.
#[inline]
pub const fn set_read(marker: u64) -> u64 {
    marker & !1
}

/// True iff `marker` carries the validity tag for `offset`.
#[inline]
pub const fn is_valid(marker: u64, offset: u64) -> bool {
    (marker >> 1) == offset + 1
}

/// True iff the unread bit is set, independent of validity.
#[inline]
pub const fn is_unread(marker: u64) -> bool {
    marker & 1 == 1
}

/// True iff the unread bit is clear, independent of validity.
#[inline]
pub const fn is_read(marker: u64) -> bool {
    marker & 1 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroed_marker_is_never_valid() {
        for offset in [0u64, 1, 2, 1024, u32::MAX as u64] {
            assert!(!is_valid(0, offset));
        }
    }

    #[test]
    fn publish_roundtrip_is_valid_and_unread() {
        for offset in [0u64, 1, 63, 4095] {
            let m = set_unread(valid_mask(offset));
            assert!(is_valid(m, offset));
            assert!(is_unread(m));
            assert!(!is_read(m));
        }
    }

    #[test]
    fn marker_does_not_cross_offsets() {
        let m = set_unread(valid_mask(128));
        for other in [0u64, 1, 127, 129, 4096] {
            assert!(!is_valid(m, other));
        }
    }

    #[test]
    fn set_read_keeps_offset_binding() {
        let m = set_read(valid_mask(7));
        assert!(is_valid(m, 7));
        assert!(is_read(m));
        assert!(!is_unread(m));
    }
}
