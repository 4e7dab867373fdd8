#[cfg(test)]
mod tests {
    use crate::sync::BufferPool;
    use std::io::Write;

    #[test]
    fn test_buffer_is_recycled_and_cleared() {
        let pool = BufferPool::new();
        {
            let mut buf = pool.acquire();
            buf.extend_from_slice(b"orders");
            assert_eq!(buf.to_vec(), b"orders".to_vec());
        }
        assert_eq!(pool.idle(), 1);

        let buf = pool.acquire();
        assert!(buf.is_empty(), "recycled buffer must come back cleared");
        assert_eq!(pool.allocated(), 1);
        assert_eq!(pool.reused(), 1);
    }

    #[test]
    fn test_idle_buffers_are_capped() {
        let pool = BufferPool::with_limits(16, 2);
        let a = pool.acquire();
        let b = pool.acquire();
        let c = pool.acquire();
        drop(a);
        drop(b);
        drop(c);

        assert_eq!(pool.idle(), 2);
        assert_eq!(pool.allocated(), 3);
    }

    #[test]
    fn test_buffer_accepts_writes() {
        let pool = BufferPool::with_limits(4, 1);
        let mut buf = pool.acquire();
        write!(&mut *buf, "customer:{}", 42).unwrap();

        assert_eq!(buf.as_slice(), b"customer:42");
    }

    #[test]
    fn test_pool_is_shared_between_threads() {
        let pool = BufferPool::new();
        std::thread::scope(|scope| {
            for i in 0..4 {
                let pool = &pool;
                scope.spawn(move || {
                    for _ in 0..100 {
                        let mut buf = pool.acquire();
                        buf.push(i);
                    }
                });
            }
        });

        assert!(pool.idle() <= 4);
        assert_eq!(pool.allocated() + pool.reused(), 400);
    }
}
