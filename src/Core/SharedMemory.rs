// POSIX shared-memory backend: shm_open + ftruncate + mmap, reachable by
// name from any process on the host (unlike the anonymous, single-host-process
// memfd_create approach, a named POSIX object is what lets a second process
// `attach` at all).

use std::ffi::CString;
use std::io;
use std::os::raw::c_int;
use std::ptr;

use sha2::{Digest, Sha256};

use crate::error::SegmentError;

/// Prefix every derived resource key carries, so `ringshm`-created segments
/// never collide with unrelated `/dev/shm` entries from other software.
const KEY_PREFIX: &str = "/ringshm.";

/// Default permission bits for a newly created segment: read/write for
/// owner, group and other, since producer and consumer are typically
/// separate processes/users cooperating deliberately.
pub const DEFAULT_MODE: libc::mode_t = 0o666;

/// A raw OS handle backing a mapped region.
///
/// Kept distinct from `SharedMemoryBackend` so call sites that only need to
/// `close`/`munmap` don't have to know which backend produced the handle.
#[derive(Debug)]
pub struct RawHandle {
    pub fd: c_int,
    pub addr: *mut u8,
    pub len: usize,
}

// SAFETY: the mapped region is shared memory; the SPSC discipline documented
// on `Ring` is what makes concurrent access from two processes sound, not
// anything this handle type itself guarantees.
unsafe impl Send for RawHandle {}
unsafe impl Sync for RawHandle {}

/// Derives the OS-visible shared-memory object name from a caller-given
/// logical name.
///
/// The caller's name is never used verbatim as the `shm_open` path: hashing
/// it keeps arbitrary caller input (spaces, slashes, length) from leaking
/// into a POSIX IPC namespace that has its own naming restrictions, and
/// keeps the mapping from the logical name to the OS object from being
/// guessable by anything not holding the logical name.
pub fn derive_resource_key(name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    let digest = hasher.finalize();
    let mut key = String::with_capacity(KEY_PREFIX.len() + digest.len() * 2);
    key.push_str(KEY_PREFIX);
    for byte in digest {
        key.push_str(&format!("{byte:02x}"));
    }
    key
}

fn last_os_error() -> io::Error {
    io::Error::last_os_error()
}

/// A backend capable of creating or attaching a named shared-memory mapping.
///
/// There is one production implementation ([`PosixSharedMemory`]); the trait
/// exists so tests can substitute an in-process fake without touching
/// `/dev/shm`.
pub trait SharedMemoryBackend {
    fn create(&self, key: &str, size: u64, mode: libc::mode_t) -> Result<RawHandle, SegmentError>;
    fn attach(&self, key: &str) -> Result<RawHandle, SegmentError>;
    fn unmap(&self, handle: &RawHandle);
    fn unlink(&self, key: &str) -> Result<(), SegmentError>;
}

/// The production backend: `shm_open`/`ftruncate`/`mmap` against `/dev/shm`.
pub struct PosixSharedMemory;

impl SharedMemoryBackend for PosixSharedMemory {
    fn create(&self, key: &str, size: u64, mode: libc::mode_t) -> Result<RawHandle, SegmentError> {
        let c_key = CString::new(key).expect("resource keys never contain NUL");
        let fd = unsafe {
            libc::shm_open(
                c_key.as_ptr(),
                libc::O_CREAT | libc::O_EXCL | libc::O_RDWR,
                mode as c_int,
            )
        };
        if fd < 0 {
            return Err(SegmentError::Open {
                key: key.to_owned(),
                source: last_os_error(),
            });
        }

        if unsafe { libc::ftruncate(fd, size as libc::off_t) } != 0 {
            let err = last_os_error();
            unsafe { libc::close(fd) };
            let _ = self.unlink(key);
            return Err(SegmentError::Truncate { size, source: err });
        }

        map(fd, size).map_err(|source| {
            unsafe { libc::close(fd) };
            let _ = self.unlink(key);
            SegmentError::Map { source }
        })
    }

    fn attach(&self, key: &str) -> Result<RawHandle, SegmentError> {
        let c_key = CString::new(key).expect("resource keys never contain NUL");
        let fd = unsafe { libc::shm_open(c_key.as_ptr(), libc::O_RDWR, 0) };
        if fd < 0 {
            return Err(SegmentError::Open {
                key: key.to_owned(),
                source: last_os_error(),
            });
        }

        let size = unsafe {
            let mut stat: libc::stat = std::mem::zeroed();
            if libc::fstat(fd, &mut stat) != 0 {
                let err = last_os_error();
                libc::close(fd);
                return Err(SegmentError::Map { source: err });
            }
            stat.st_size as u64
        };

        map(fd, size).map_err(|source| {
            unsafe { libc::close(fd) };
            SegmentError::Map { source }
        })
    }

    fn unmap(&self, handle: &RawHandle) {
        unsafe {
            libc::munmap(handle.addr.cast(), handle.len);
            libc::close(handle.fd);
        }
    }

    fn unlink(&self, key: &str) -> Result<(), SegmentError> {
        let c_key = CString::new(key).expect("resource keys never contain NUL");
        if unsafe { libc::shm_unlink(c_key.as_ptr()) } != 0 {
            return Err(SegmentError::Unlink {
                key: key.to_owned(),
                source: last_os_error(),
            });
        }
        Ok(())
    }
}

fn map(fd: c_int, size: u64) -> io::Result<RawHandle> {
    let len = size as usize;
    let addr = unsafe {
        libc::mmap(
            ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED,
            fd,
            0,
        )
    };
    if addr == libc::MAP_FAILED {
        return Err(last_os_error());
    }
    Ok(RawHandle {
        fd,
        addr: addr.cast(),
        len,
    })
}

/// Creates a new named shared-memory mapping of `size` bytes, failing if one
/// already exists under the derived key.
pub fn create_shared_memory(name: &str, size: u64, mode: libc::mode_t) -> Result<RawHandle, SegmentError> {
    let key = derive_resource_key(name);
    PosixSharedMemory.create(&key, size, mode)
}

/// Attaches to an existing named shared-memory mapping.
pub fn attach_shared_memory(name: &str) -> Result<RawHandle, SegmentError> {
    let key = derive_resource_key(name);
    PosixSharedMemory.attach(&key)
}

/// Removes the named object from the OS namespace.
///
/// Existing mappings (via already-opened fds) remain valid until every
/// process unmaps them; this only stops new attaches from finding it.
pub fn unlink_shared_memory(name: &str) -> Result<(), SegmentError> {
    let key = derive_resource_key(name);
    PosixSharedMemory.unlink(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_key_carries_prefix_and_is_deterministic() {
        let a = derive_resource_key("my-queue");
        let b = derive_resource_key("my-queue");
        assert_eq!(a, b);
        assert!(a.starts_with(KEY_PREFIX));
        // sha256 hex digest: 64 chars after the prefix.
        assert_eq!(a.len(), KEY_PREFIX.len() + 64);
    }

    #[test]
    fn resource_key_distinguishes_names() {
        assert_ne!(derive_resource_key("a"), derive_resource_key("b"));
    }
}
