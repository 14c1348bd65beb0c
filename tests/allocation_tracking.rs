// Allocation tracking for the enqueue/dequeue fast path.
//
// Tests using dhat are marked #[serial] because dhat only allows one
// profiler active at a time.
//
// Run with: cargo test --test allocation_tracking -- --nocapture

use ring_shm::Spsc::{DequeueStatus, EnqueueStatus, QueueBuilder};
use serial_test::serial;

fn unique_name(tag: &str) -> String {
    format!("ringshm-alloc-{tag}-{}", std::process::id())
}

#[test]
#[serial]
fn steady_state_enqueue_dequeue_is_allocation_free() {
    let name = unique_name("dhat");
    let producer = QueueBuilder::new(name.clone())
        .with_capacity(64 * 1024)
        .create_producer()
        .unwrap();
    let consumer = QueueBuilder::new(name.clone()).attach_consumer().unwrap();

    let payload = vec![0x11u8; 128];

    // Warm up: touch every code path once outside the profiler so lazily
    // initialized state (if any crept in) doesn't show up as a one-time cost.
    assert_eq!(producer.try_enqueue(&payload), EnqueueStatus::Ok);
    match consumer.try_dequeue() {
        DequeueStatus::Ok(lease) => lease.release(),
        other => panic!("expected Ok, got {other:?}"),
    }

    let _profiler = dhat::Profiler::new_heap();
    let stats_before = dhat::HeapStats::get();

    for _ in 0..2000 {
        assert_eq!(producer.try_enqueue(&payload), EnqueueStatus::Ok);
        match consumer.try_dequeue() {
            DequeueStatus::Ok(lease) => lease.release(),
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    let stats_after = dhat::HeapStats::get();
    assert_eq!(
        stats_after.total_blocks, stats_before.total_blocks,
        "enqueue/dequeue steady state allocated heap blocks"
    );

    ring_shm::Core::Segment::attach(&name).unwrap().destroy().unwrap();
}

#[test]
fn steady_state_enqueue_dequeue_does_not_grow_rss() {
    let name = unique_name("memstats");
    let producer = QueueBuilder::new(name.clone())
        .with_capacity(64 * 1024)
        .create_producer()
        .unwrap();
    let consumer = QueueBuilder::new(name.clone()).attach_consumer().unwrap();
    let payload = vec![0x22u8; 256];

    for _ in 0..64 {
        assert_eq!(producer.try_enqueue(&payload), EnqueueStatus::Ok);
        match consumer.try_dequeue() {
            DequeueStatus::Ok(lease) => lease.release(),
            other => panic!("expected Ok, got {other:?}"),
        }
    }
    let before = memory_stats::memory_stats().map(|m| m.physical_mem);

    for _ in 0..20_000 {
        assert_eq!(producer.try_enqueue(&payload), EnqueueStatus::Ok);
        match consumer.try_dequeue() {
            DequeueStatus::Ok(lease) => lease.release(),
            other => panic!("expected Ok, got {other:?}"),
        }
    }
    let after = memory_stats::memory_stats().map(|m| m.physical_mem);

    if let (Some(before), Some(after)) = (before, after) {
        let grew = after.saturating_sub(before);
        assert!(
            grew < 4 * 1024 * 1024,
            "resident memory grew by {grew} bytes over 20000 steady-state iterations"
        );
    }

    ring_shm::Core::Segment::attach(&name).unwrap().destroy().unwrap();
}
