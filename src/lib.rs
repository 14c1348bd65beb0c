//! ringshm - a lock-free SPSC byte-ring queue over POSIX shared memory.
//!
//! A producer and a consumer in two separate processes exchange variable-sized
//! opaque payloads through a named shared-memory segment. There are no
//! mutexes and no syscalls on the fast path: correctness comes entirely from
//! atomic header publication and atomic cursor updates.
//!
//! # Example
//!
//! ```no_run
//! use ring_shm::Spsc::{QueueBuilder, EnqueueStatus, DequeueStatus};
//!
//! let producer = QueueBuilder::new("demo").with_capacity(4096).create_producer().unwrap();
//! match producer.try_enqueue(b"hello") {
//!     EnqueueStatus::Ok => {}
//!     EnqueueStatus::Full | EnqueueStatus::CasRetry => {}
//! }
//!
//! let consumer = QueueBuilder::new("demo").attach_consumer().unwrap();
//! if let DequeueStatus::Ok(lease) = consumer.try_dequeue() {
//!     assert_eq!(lease.as_slice(), b"hello");
//!     lease.release();
//! }
//! ```

#[allow(non_snake_case)]
pub mod Core {
    pub mod SharedMemory;
    pub mod segment;
    mod getters;

    pub use SharedMemory::{
        attach_shared_memory, create_shared_memory, RawHandle, SharedMemoryBackend,
    };
    pub use segment::{Segment, SegmentHandle};
}

#[allow(non_snake_case)]
pub mod Spsc {
    pub mod builder;
    pub mod consumer;
    pub mod producer;

    pub mod Ring {
        pub mod header;
        pub mod layout;
        pub mod ring;

        pub use header::{is_read, is_unread, is_valid, set_read, set_unread, valid_mask, SlotHeader, HEADER_SIZE};
        pub use layout::{RingHeader, NAME_LEN};
        pub use ring::{byte_size, Lease, Ring};
    }

    pub use builder::QueueBuilder;
    pub use consumer::Consumer;
    pub use producer::Producer;
    pub use Ring::{byte_size, Lease};
    pub use crate::error::{DequeueStatus, EnqueueStatus};
}

#[allow(non_snake_case)]
pub mod Stats {
    mod block;
    mod sink;

    pub use block::{StatsBlock, StatsSnapshot};
    pub use sink::{Counter, Gauge, NullStatsSink, SharedStatsSink, StatsSink};
}

#[allow(non_snake_case)]
pub mod Debug {
    pub mod StructDebug;
}

pub mod error;
pub mod ffi;

pub use error::{DequeueStatus, EnqueueStatus, SegmentError};
