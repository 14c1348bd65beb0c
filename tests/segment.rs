// Segment lifecycle tests against real /dev/shm objects.
// Run with: cargo test --test segment -- --nocapture
//
// Every test here touches a named OS-level shared-memory object, so they are
// marked #[serial] to avoid two tests racing over the same derived key.

use ring_shm::Core::Segment;
use ring_shm::Spsc::Ring::HEADER_SIZE;
use ring_shm::Spsc::{DequeueStatus, EnqueueStatus, QueueBuilder};
use serial_test::serial;

fn unique_name(tag: &str) -> String {
    format!("ringshm-test-{tag}-{}", std::process::id())
}

#[test]
#[serial]
fn create_then_attach_see_the_same_capacity() {
    let name = unique_name("create-attach");
    let producer = QueueBuilder::new(name.clone())
        .with_capacity(4096)
        .create_producer()
        .expect("create should succeed");
    // The reserved sentinel slot is added on top of the requested capacity,
    // not carved out of it - see `Segment::create_with_mode`.
    assert_eq!(producer.capacity(), 4096 + HEADER_SIZE as u64);

    let consumer = QueueBuilder::new(name.clone())
        .attach_consumer()
        .expect("attach should succeed");
    assert_eq!(consumer.capacity(), 4096 + HEADER_SIZE as u64);

    drop(producer);
    drop(consumer);
    Segment::attach(&name)
        .expect("segment should still exist after handles drop")
        .destroy()
        .expect("destroy should succeed");
}

#[test]
#[serial]
fn create_twice_with_same_name_fails() {
    let name = unique_name("double-create");
    let segment = Segment::create(&name, 4096).expect("first create should succeed");

    let err = Segment::create(&name, 4096);
    assert!(err.is_err());

    segment.destroy().expect("destroy should succeed");
}

#[test]
#[serial]
fn attach_without_a_creator_fails() {
    let name = unique_name("no-creator");
    assert!(Segment::attach(&name).is_err());
}

#[test]
#[serial]
fn capacity_below_minimum_is_rejected() {
    let name = unique_name("too-small");
    assert!(Segment::create(&name, 1).is_err());
}

#[test]
#[serial]
fn producer_and_consumer_exchange_payloads_across_handles() {
    let name = unique_name("exchange");
    let producer = QueueBuilder::new(name.clone())
        .with_capacity(4096)
        .create_producer()
        .expect("create should succeed");
    let consumer = QueueBuilder::new(name.clone())
        .attach_consumer()
        .expect("attach should succeed");

    assert_eq!(producer.try_enqueue(b"cross-process"), EnqueueStatus::Ok);

    match consumer.try_dequeue() {
        DequeueStatus::Ok(lease) => {
            assert_eq!(lease.as_slice(), b"cross-process");
            lease.release();
        }
        other => panic!("expected a payload, got {other:?}"),
    }

    let stats = producer.stats();
    assert_eq!(stats.queue, 1);
    assert_eq!(stats.dequeue, 1);

    Segment::attach(&name).unwrap().destroy().unwrap();
}

#[test]
#[serial]
fn inspect_on_fresh_ring_is_neither_valid_nor_unread() {
    let name = unique_name("inspect-fresh");
    let producer = QueueBuilder::new(name.clone())
        .with_capacity(4096)
        .create_producer()
        .expect("create should succeed");

    // A freshly zeroed slot must never read as "valid for offset 0 and
    // unread" - that would make it indistinguishable from a live payload.
    let marker = producer.inspect(0);
    assert!(marker & 1 == 0, "freshly zeroed marker must not carry the unread bit");

    Segment::attach(&name).unwrap().destroy().unwrap();
}

#[test]
#[serial]
fn destroy_prevents_further_attaches() {
    let name = unique_name("destroy");
    let segment = Segment::create(&name, 4096).expect("create should succeed");
    segment.destroy().expect("destroy should succeed");

    assert!(Segment::attach(&name).is_err());
}
