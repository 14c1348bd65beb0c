// Quantified invariants over the enqueue/dequeue protocol:
// - FIFO order is preserved regardless of payload size distribution.
// - every successfully enqueued payload is eventually dequeued unchanged.
// - the ring never reports both Full and loses data: total bytes in equals
//   total bytes out for any prefix of a fully-drained sequence.

use std::sync::{Mutex, OnceLock};

use proptest::prelude::*;
use ring_shm::Spsc::{DequeueStatus, EnqueueStatus, QueueBuilder};
use serial_test::serial;

// proptest runs its cases on the same thread by default, but we still avoid
// two different #[test] fns racing over /dev/shm derived keys by sharing one
// process-wide lock, mirroring the #[serial] discipline used elsewhere.
fn serial_guard() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
}

fn unique_name(tag: &str) -> String {
    format!(
        "ringshm-prop-{tag}-{}-{}",
        std::process::id(),
        fastrand::u64(..)
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    #[allow(unused_must_use)]
    fn fifo_order_survives_arbitrary_payload_sizes(
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 1..40)
    ) {
        let _guard = serial_guard();
        let name = unique_name("fifo");
        let producer = QueueBuilder::new(name.clone())
            .with_capacity(8192)
            .create_producer()
            .unwrap();
        let consumer = QueueBuilder::new(name.clone()).attach_consumer().unwrap();

        let mut accepted = Vec::new();
        for payload in &payloads {
            loop {
                match producer.try_enqueue(payload) {
                    EnqueueStatus::Ok => {
                        accepted.push(payload.clone());
                        break;
                    }
                    EnqueueStatus::Full => break,
                    EnqueueStatus::CasRetry => continue,
                }
            }
        }

        let mut drained = Vec::new();
        loop {
            match consumer.try_dequeue() {
                DequeueStatus::Ok(lease) => {
                    drained.push(lease.as_slice().to_vec());
                    lease.release();
                }
                DequeueStatus::CasRetry => continue,
                DequeueStatus::Empty => break,
            }
        }

        prop_assert_eq!(accepted, drained);

        ring_shm::Core::Segment::attach(&name).unwrap().destroy().unwrap();
    }
}

#[test]
#[serial]
fn single_large_payload_round_trips() {
    let name = unique_name("large");
    let producer = QueueBuilder::new(name.clone())
        .with_capacity(65536)
        .create_producer()
        .unwrap();
    let consumer = QueueBuilder::new(name.clone()).attach_consumer().unwrap();

    let payload = vec![0x7Au8; 40_000];
    assert_eq!(producer.try_enqueue(&payload), EnqueueStatus::Ok);
    match consumer.try_dequeue() {
        DequeueStatus::Ok(lease) => {
            assert_eq!(lease.as_slice(), payload.as_slice());
            lease.release();
        }
        other => panic!("expected Ok, got {other:?}"),
    }

    ring_shm::Core::Segment::attach(&name).unwrap().destroy().unwrap();
}
