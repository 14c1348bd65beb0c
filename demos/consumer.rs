// Attaches to a named ring and drains messages from it until interrupted.

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ring_shm::Spsc::{DequeueStatus, QueueBuilder};

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <name>", args[0]);
        std::process::exit(1);
    }

    let name = &args[1];
    println!("Consumer: attaching to ring {name:?}");
    let consumer = QueueBuilder::new(name.clone())
        .attach_consumer()
        .expect("failed to attach to ring segment");

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .expect("failed to install Ctrl-C handler");
    }

    let mut received: u64 = 0;
    while running.load(Ordering::SeqCst) {
        match consumer.try_dequeue() {
            DequeueStatus::Ok(lease) => {
                received += 1;
                if received % 1000 == 0 {
                    println!("Consumer: received {received} messages, last={:?}", lease.as_slice());
                }
                lease.release();
            }
            DequeueStatus::Empty => thread::sleep(Duration::from_micros(100)),
            DequeueStatus::CasRetry => continue,
        }
    }

    let stats = consumer.stats();
    println!("Consumer: done. received={received} stats={stats:?}");
}
