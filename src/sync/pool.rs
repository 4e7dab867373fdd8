//! Fixed-size worker pool fed from a bounded queue.

use super::counter::AtomicCounter;
use super::error::ToolkitError;
use crossbeam_channel::{Receiver, Select, Sender, bounded};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace, warn};

type Task<R> = Box<dyn FnOnce() -> R + Send + 'static>;

/// A fixed number of worker threads consuming tasks from a bounded queue and
/// publishing each task's output to a bounded results queue.
///
/// [`submit`](Self::submit) blocks while the task queue is full, which is the
/// pool's backpressure point. [`drain`](Self::drain) stops admission, waits
/// for every accepted task to finish and returns the outputs that were not
/// already taken with [`recv_result`](Self::recv_result).
///
/// Results arrive in completion order, not submission order. A `submit`
/// that is waiting for room moves finished results aside, so callers may
/// submit any number of tasks before draining.
pub struct BoundedTaskPool<R> {
    name: String,
    jobs: Mutex<Option<Sender<Task<R>>>>,
    results: Receiver<R>,
    parked: Mutex<VecDeque<R>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    submitted: AtomicCounter,
    completed: Arc<AtomicCounter>,
}

impl<R: Send + 'static> BoundedTaskPool<R> {
    /// Starts `worker_count` workers behind a queue of `queue_capacity`
    /// pending tasks. Both values are clamped to at least one.
    pub fn new(worker_count: usize, queue_capacity: usize) -> Result<Self, ToolkitError> {
        Self::with_name("pool", worker_count, queue_capacity)
    }

    /// Same as [`new`](Self::new) with a name used for worker threads and logs.
    pub fn with_name(
        name: &str,
        worker_count: usize,
        queue_capacity: usize,
    ) -> Result<Self, ToolkitError> {
        let worker_count = worker_count.max(1);
        let queue_capacity = queue_capacity.max(1);
        let (job_tx, job_rx) = bounded::<Task<R>>(queue_capacity);
        let (result_tx, result_rx) = bounded::<R>(queue_capacity);
        let completed = Arc::new(AtomicCounter::new());

        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            let completed = Arc::clone(&completed);
            let handle = thread::Builder::new()
                .name(format!("{name}-{index}"))
                .spawn(move || run_worker(index, jobs, results, completed))
                .map_err(|err| ToolkitError::Spawn(err.to_string()))?;
            workers.push(handle);
        }

        debug!(
            "pool {}: started {} workers, queue capacity {}",
            name, worker_count, queue_capacity
        );

        Ok(Self {
            name: name.to_string(),
            jobs: Mutex::new(Some(job_tx)),
            results: result_rx,
            parked: Mutex::new(VecDeque::new()),
            workers: Mutex::new(workers),
            submitted: AtomicCounter::new(),
            completed,
        })
    }

    /// Queues a task, blocking while the queue is at capacity.
    ///
    /// Fails with [`ToolkitError::PoolClosed`] once [`drain`](Self::drain) has
    /// started or every worker has exited.
    pub fn submit<F>(&self, task: F) -> Result<(), ToolkitError>
    where
        F: FnOnce() -> R + Send + 'static,
    {
        // Clone the sender so a blocked submit never holds the admission lock.
        let sender = self.jobs.lock().clone().ok_or(ToolkitError::PoolClosed)?;
        let task: Task<R> = Box::new(task);

        loop {
            let mut select = Select::new();
            let send = select.send(&sender);
            select.recv(&self.results);
            let operation = select.select();

            if operation.index() == send {
                operation
                    .send(&sender, task)
                    .map_err(|_| ToolkitError::PoolClosed)?;
                self.submitted.incr();
                return Ok(());
            }

            // Workers blocked on a full results queue would never free a slot.
            if let Ok(output) = operation.recv(&self.results) {
                self.parked.lock().push_back(output);
            }
        }
    }

    /// Takes one finished result, waiting at most `timeout`.
    pub fn recv_result(&self, timeout: Duration) -> Option<R> {
        if let Some(output) = self.parked.lock().pop_front() {
            return Some(output);
        }
        self.results.recv_timeout(timeout).ok()
    }

    /// Takes one finished result if any is ready.
    pub fn try_recv_result(&self) -> Option<R> {
        if let Some(output) = self.parked.lock().pop_front() {
            return Some(output);
        }
        self.results.try_recv().ok()
    }

    /// Stops accepting work, waits for every queued task to complete and
    /// returns the results that had not been received yet.
    ///
    /// A worker that panicked is reported as [`ToolkitError::WorkerPanicked`]
    /// after the remaining workers have been joined.
    pub fn drain(&self) -> Result<Vec<R>, ToolkitError> {
        // Dropping the last sender lets workers exit once the queue is empty.
        drop(self.jobs.lock().take());

        let mut outputs: Vec<R> = self.parked.lock().drain(..).collect();
        // The results channel disconnects when the last worker exits.
        while let Ok(output) = self.results.recv() {
            outputs.push(output);
        }
        // Submits that raced with us parked results; all of them have
        // returned by the time the last worker exits.
        outputs.extend(self.parked.lock().drain(..));

        let workers = std::mem::take(&mut *self.workers.lock());
        let mut failure = None;
        for (index, handle) in workers.into_iter().enumerate() {
            if handle.join().is_err() {
                warn!("pool {}: worker {} panicked", self.name, index);
                failure.get_or_insert(ToolkitError::WorkerPanicked { worker: index });
            }
        }

        debug!(
            "pool {}: drained, {} submitted, {} completed",
            self.name,
            self.submitted.get(),
            self.completed.get()
        );

        match failure {
            Some(err) => Err(err),
            None => Ok(outputs),
        }
    }

    /// Tasks accepted so far.
    pub fn submitted(&self) -> u64 {
        self.submitted.get()
    }

    /// Tasks that have finished running.
    pub fn completed(&self) -> u64 {
        self.completed.get()
    }

    /// Tasks accepted but not yet finished.
    pub fn pending(&self) -> u64 {
        self.submitted().saturating_sub(self.completed())
    }

    /// Whether [`drain`](Self::drain) has been called.
    pub fn is_closed(&self) -> bool {
        self.jobs.lock().is_none()
    }
}

impl<R> Drop for BoundedTaskPool<R> {
    fn drop(&mut self) {
        // Close admission; workers finish the queue and exit on their own.
        // Joining here could deadlock on a full results queue nobody reads.
        drop(self.jobs.get_mut().take());
    }
}

fn run_worker<R>(
    index: usize,
    jobs: Receiver<Task<R>>,
    results: Sender<R>,
    completed: Arc<AtomicCounter>,
) {
    while let Ok(task) = jobs.recv() {
        let output = task();
        completed.incr();
        if results.send(output).is_err() {
            break;
        }
    }
    trace!("worker {} exiting", index);
}
