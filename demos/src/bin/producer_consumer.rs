use orderdesk::setup_logger;
use orderdesk::sync::{AtomicCounter, WaitNotifyQueue};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

const PRODUCERS: usize = 3;
const CONSUMERS: usize = 4;
const ITEMS_PER_PRODUCER: u64 = 50;

fn main() {
    setup_logger();
    info!("Producer/Consumer Hand-off");
    info!("--------------------------");
    info!("Producers: {}, consumers: {}", PRODUCERS, CONSUMERS);

    let queue = Arc::new(WaitNotifyQueue::new());
    let total = Arc::new(AtomicCounter::new());

    let consumers: Vec<_> = (0..CONSUMERS)
        .map(|id| {
            let queue = Arc::clone(&queue);
            let total = Arc::clone(&total);
            thread::spawn(move || {
                let mut handled = 0u64;
                // `None` is the shutdown sentinel.
                while let Some(value) = queue.pop() {
                    total.add(value);
                    handled += 1;
                }
                info!("Consumer {} handled {} items", id, handled);
                handled
            })
        })
        .collect();

    let producers: Vec<_> = (0..PRODUCERS as u64)
        .map(|id| {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..ITEMS_PER_PRODUCER {
                    queue.push(id * 1_000 + i);
                    if i % 10 == 0 {
                        thread::sleep(Duration::from_millis(1));
                    }
                }
                info!("Producer {} done", id);
            })
        })
        .collect();

    for producer in producers {
        if producer.join().is_err() {
            info!("A producer panicked");
        }
    }
    queue.shutdown(CONSUMERS);

    let handled: u64 = consumers
        .into_iter()
        .filter_map(|consumer| consumer.join().ok())
        .sum();

    let expected: u64 = (0..PRODUCERS as u64)
        .flat_map(|id| (0..ITEMS_PER_PRODUCER).map(move |i| id * 1_000 + i))
        .sum();

    info!("\nResults:");
    info!("Items pushed: {}", queue.pushed());
    info!("Items handled: {}", handled);
    info!("Checksum: {} (expected {})", total.get(), expected);
    info!("Left in queue: {}", queue.len());
}
