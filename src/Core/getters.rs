// Small pointer-arithmetic helpers shared by `segment`. Kept apart from
// `segment.rs` itself so the unsafe pointer math has a single, narrow home.

use crate::Spsc::Ring::RingHeader;

/// Byte offset of the ring buffer proper, immediately after the header.
pub(crate) const fn buffer_offset() -> usize {
    std::mem::size_of::<RingHeader>()
}

/// Total mapping size for a ring buffer of `capacity` bytes.
pub(crate) const fn mapping_size(capacity: u64) -> u64 {
    buffer_offset() as u64 + capacity
}

/// Reinterprets the front of a mapping as the control header.
///
/// # Safety
/// `addr` must point at a mapping at least `mapping_size(capacity)` bytes long.
pub(crate) unsafe fn header_ptr(addr: *mut u8) -> *mut RingHeader {
    addr.cast::<RingHeader>()
}

/// Reinterprets the remainder of a mapping (past the header) as the buffer.
///
/// # Safety
/// Same contract as [`header_ptr`].
pub(crate) unsafe fn buffer_ptr(addr: *mut u8) -> *mut u8 {
    addr.add(buffer_offset())
}
