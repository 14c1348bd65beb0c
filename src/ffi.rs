//! C ABI surface.
//!
//! Each function takes and returns plain integers or opaque pointers so the
//! library can be linked from C without a Rust runtime on the other side.
//! Every fallible call returns a status code instead of panicking across the
//! FFI boundary; Rust panics unwinding into C is undefined behavior.

use std::ffi::CStr;
use std::os::raw::c_char;

use crate::error::{DequeueStatus, EnqueueStatus};
use crate::Core::Segment;
use crate::Spsc::{Consumer, Producer, QueueBuilder};

#[repr(C)]
pub enum RingShmStatus {
    Ok = 0,
    Full = 1,
    Empty = 2,
    CasRetry = 3,
    InvalidArgument = 4,
    SegmentError = 5,
}

/// Opaque producer handle. Always created via [`ringshm_create_producer`]
/// and detached (unmapped, not removed from the OS) via
/// [`ringshm_detach_producer`]. Use [`ringshm_destroy_segment`] to remove
/// the underlying OS resource.
pub struct RingShmProducer(Producer);

/// Opaque consumer handle. Always created via [`ringshm_attach_consumer`]
/// and detached (unmapped, not removed from the OS) via
/// [`ringshm_detach_consumer`].
pub struct RingShmConsumer(Consumer);

unsafe fn name_from_c(name: *const c_char) -> Option<String> {
    if name.is_null() {
        return None;
    }
    CStr::from_ptr(name).to_str().ok().map(str::to_owned)
}

/// Creates a new segment and returns a producer handle through `out`.
///
/// # Safety
/// `name` must be a valid, NUL-terminated C string. `out` must be a valid,
/// writable pointer.
#[no_mangle]
pub unsafe extern "C" fn ringshm_create_producer(
    name: *const c_char,
    capacity: u64,
    out: *mut *mut RingShmProducer,
) -> RingShmStatus {
    if out.is_null() {
        return RingShmStatus::InvalidArgument;
    }
    let Some(name) = name_from_c(name) else {
        return RingShmStatus::InvalidArgument;
    };

    match QueueBuilder::new(name).with_capacity(capacity).create_producer() {
        Ok(producer) => {
            *out = Box::into_raw(Box::new(RingShmProducer(producer)));
            RingShmStatus::Ok
        }
        Err(err) => {
            log::warn!("ringshm_create_producer failed: {err}");
            RingShmStatus::SegmentError
        }
    }
}

/// Attaches to an existing segment and returns a consumer handle through `out`.
///
/// # Safety
/// Same contract as [`ringshm_create_producer`].
#[no_mangle]
pub unsafe extern "C" fn ringshm_attach_consumer(
    name: *const c_char,
    out: *mut *mut RingShmConsumer,
) -> RingShmStatus {
    if out.is_null() {
        return RingShmStatus::InvalidArgument;
    }
    let Some(name) = name_from_c(name) else {
        return RingShmStatus::InvalidArgument;
    };

    match QueueBuilder::new(name).attach_consumer() {
        Ok(consumer) => {
            *out = Box::into_raw(Box::new(RingShmConsumer(consumer)));
            RingShmStatus::Ok
        }
        Err(err) => {
            log::warn!("ringshm_attach_consumer failed: {err}");
            RingShmStatus::SegmentError
        }
    }
}

/// Attempts to enqueue `len` bytes starting at `data`.
///
/// # Safety
/// `producer` must be a live pointer from [`ringshm_create_producer`].
/// `data` must point at `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn ringshm_try_enqueue(
    producer: *mut RingShmProducer,
    data: *const u8,
    len: usize,
) -> RingShmStatus {
    if producer.is_null() || (data.is_null() && len != 0) {
        return RingShmStatus::InvalidArgument;
    }
    let producer = &*producer;
    let payload = std::slice::from_raw_parts(data, len);
    match producer.0.try_enqueue(payload) {
        EnqueueStatus::Ok => RingShmStatus::Ok,
        EnqueueStatus::Full => RingShmStatus::Full,
        EnqueueStatus::CasRetry => RingShmStatus::CasRetry,
    }
}

/// Attempts to dequeue the next payload into the caller-provided buffer.
///
/// On entry `*len` is the capacity of `data`; on a successful dequeue it is
/// set to the payload's actual length. If the buffer is too small the
/// payload is released unread and `InvalidArgument` is returned - the
/// spec's FFI surface has no way to hand back a borrowed slice across the
/// boundary, so a copy into caller memory is mandatory.
///
/// # Safety
/// `consumer` must be a live pointer from [`ringshm_attach_consumer`].
/// `data` must point at `*len` writable bytes; `len` must be non-null.
#[no_mangle]
pub unsafe extern "C" fn ringshm_try_dequeue(
    consumer: *mut RingShmConsumer,
    data: *mut u8,
    len: *mut usize,
) -> RingShmStatus {
    if consumer.is_null() || data.is_null() || len.is_null() {
        return RingShmStatus::InvalidArgument;
    }
    let consumer = &*consumer;
    let capacity = *len;

    match consumer.0.try_dequeue() {
        DequeueStatus::Ok(lease) => {
            let payload = lease.as_slice();
            if payload.len() > capacity {
                *len = payload.len();
                lease.release();
                return RingShmStatus::InvalidArgument;
            }
            std::ptr::copy_nonoverlapping(payload.as_ptr(), data, payload.len());
            *len = payload.len();
            lease.release();
            RingShmStatus::Ok
        }
        DequeueStatus::Empty => RingShmStatus::Empty,
        DequeueStatus::CasRetry => RingShmStatus::CasRetry,
    }
}

/// Computes the on-ring footprint of a `payload_len`-byte payload.
#[no_mangle]
pub extern "C" fn ringshm_byte_size(payload_len: usize) -> usize {
    crate::Spsc::byte_size(payload_len)
}

/// Atomically loads the marker word at `offset` in the producer's segment,
/// for diagnostics only.
///
/// # Safety
/// `producer` must be a live pointer from [`ringshm_create_producer`].
#[no_mangle]
pub unsafe extern "C" fn ringshm_inspect(producer: *const RingShmProducer, offset: u64) -> u64 {
    if producer.is_null() {
        return 0;
    }
    (*producer).0.inspect(offset)
}

/// Unmaps this process's view of the segment. Does **not** remove the OS
/// resource - other attachments, including a later `ringshm_attach_consumer`
/// under the same name, remain valid. Call [`ringshm_destroy_segment`] to
/// remove the named `/dev/shm` object once no process needs it anymore.
///
/// # Safety
/// `producer` must be a live pointer from [`ringshm_create_producer`], or null.
#[no_mangle]
pub unsafe extern "C" fn ringshm_detach_producer(producer: *mut RingShmProducer) {
    if !producer.is_null() {
        drop(Box::from_raw(producer));
    }
}

/// Unmaps this process's view of the segment. Does **not** remove the OS
/// resource - see [`ringshm_detach_producer`].
///
/// # Safety
/// `consumer` must be a live pointer from [`ringshm_attach_consumer`], or null.
#[no_mangle]
pub unsafe extern "C" fn ringshm_detach_consumer(consumer: *mut RingShmConsumer) {
    if !consumer.is_null() {
        drop(Box::from_raw(consumer));
    }
}

/// Removes the named OS-level shared-memory object, preventing any further
/// `ringshm_attach_consumer`/`ringshm_create_producer` call from finding it.
///
/// Mirrors [`crate::Core::Segment::destroy`]: this briefly attaches to
/// `name` to reach the resource, then unlinks it. It is undefined behavior
/// to call this while another process still expects to attach under `name`
/// afterward - the caller coordinates shutdown order, exactly as the Rust
/// `Segment::destroy` contract requires.
///
/// # Safety
/// `name` must be a valid, NUL-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn ringshm_destroy_segment(name: *const c_char) -> RingShmStatus {
    let Some(name) = name_from_c(name) else {
        return RingShmStatus::InvalidArgument;
    };

    match Segment::attach(&name).and_then(Segment::destroy) {
        Ok(()) => RingShmStatus::Ok,
        Err(err) => {
            log::warn!("ringshm_destroy_segment failed: {err}");
            RingShmStatus::SegmentError
        }
    }
}
