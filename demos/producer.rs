// Creates a named ring and writes numbered messages to it until interrupted
// or a message count is reached.

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ring_shm::Spsc::{EnqueueStatus, QueueBuilder};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <name> [count] [capacity]", args[0]);
        eprintln!("  count: optional, number of messages to send (default: runs until Ctrl-C)");
        eprintln!("  capacity: optional, ring size in bytes (default: 65536)");
        std::process::exit(1);
    }

    let name = &args[1];
    let count: Option<u64> = args.get(2).and_then(|s| s.parse().ok());
    let capacity: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(64 * 1024);

    println!("Producer: creating ring {name:?} with capacity {capacity}");
    let producer = QueueBuilder::new(name.clone())
        .with_capacity(capacity)
        .create_producer()
        .expect("failed to create ring segment");

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .expect("failed to install Ctrl-C handler");
    }

    let mut sent: u64 = 0;
    while running.load(Ordering::SeqCst) {
        if let Some(count) = count {
            if sent >= count {
                break;
            }
        }

        let message = format!("message-{sent}");
        loop {
            match producer.try_enqueue(message.as_bytes()) {
                EnqueueStatus::Ok => break,
                EnqueueStatus::Full => thread::sleep(Duration::from_micros(100)),
                EnqueueStatus::CasRetry => continue,
            }
            if !running.load(Ordering::SeqCst) {
                break;
            }
        }
        sent += 1;
        if sent % 1000 == 0 {
            println!("Producer: sent {sent} messages");
        }
    }

    let stats = producer.stats();
    println!("Producer: done. sent={sent} stats={stats:?}");
}
