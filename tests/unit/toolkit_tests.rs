//! The concurrency toolkit used together, the way batch work uses it.

#[cfg(test)]
mod tests {
    use orderdesk::sync::{
        AtomicCounter, BoundedTaskPool, CancellableOperation, SingleInitGuard, ToolkitError,
        WaitNotifyQueue,
    };
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_pool_feeds_queue_consumers() {
        let queue = Arc::new(WaitNotifyQueue::new());
        let sum = Arc::new(AtomicCounter::new());

        let consumers: Vec<_> = (0..3)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let sum = Arc::clone(&sum);
                thread::spawn(move || {
                    while let Some(value) = queue.pop() {
                        sum.add(value);
                    }
                })
            })
            .collect();

        let pool = BoundedTaskPool::new(4, 2).unwrap();
        for i in 1..=100u64 {
            let queue = Arc::clone(&queue);
            pool.submit(move || queue.push(i)).unwrap();
        }
        assert_eq!(pool.drain().unwrap().len(), 100);
        queue.shutdown(3);

        for consumer in consumers {
            consumer.join().unwrap();
        }
        assert_eq!(sum.get(), 5050);
        assert_eq!(queue.delivered(), 100);
    }

    #[test]
    fn test_submit_after_drain_rejected() {
        let pool = BoundedTaskPool::new(2, 2).unwrap();
        pool.submit(|| 1).unwrap();
        assert_eq!(pool.drain(), Ok(vec![1]));
        assert_eq!(pool.submit(|| 2), Err(ToolkitError::PoolClosed));
    }

    #[test]
    fn test_single_init_across_pool_workers() {
        let guard = Arc::new(SingleInitGuard::new());
        let runs = Arc::new(AtomicCounter::new());
        let pool = BoundedTaskPool::new(8, 8).unwrap();

        for _ in 0..32 {
            let guard = Arc::clone(&guard);
            let runs = Arc::clone(&runs);
            pool.submit(move || {
                *guard.get_or_init(|| {
                    runs.incr();
                    thread::sleep(Duration::from_millis(5));
                    7u32
                })
            })
            .unwrap();
        }

        assert!(pool.drain().unwrap().iter().all(|value| *value == 7));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn test_cancellation_is_cooperative() {
        let finished = Arc::new(AtomicCounter::new());
        let observed = Arc::clone(&finished);

        let result = CancellableOperation::new(Duration::from_millis(20)).run(move |signal| {
            while !signal.is_cancelled() {
                thread::sleep(Duration::from_millis(2));
            }
            observed.incr();
        });

        assert_eq!(
            result,
            Err(ToolkitError::DeadlineExceeded {
                after: Duration::from_millis(20)
            })
        );
        thread::sleep(Duration::from_millis(50));
        assert_eq!(finished.get(), 1);
    }
}
