//! Worker threads for blocking download tasks.
//!
//! [`RemoteFile::start`](crate::RemoteFile::start) blocks its thread for the
//! whole transfer, so transfers are handed to a [`WorkerPool`]: a fixed set of
//! named OS threads pulling [`Runnable`] tasks from a shared queue. One worker
//! runs one task at a time.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use remote_file::{RemoteFile, WorkerPool};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = WorkerPool::new(4)?;
//! let files: Vec<Arc<RemoteFile>> = ["a", "b", "c"]
//!     .iter()
//!     .map(|name| Arc::new(RemoteFile::new(format!("https://example.com/{name}"), *name)))
//!     .collect();
//! for file in &files {
//!     pool.submit(file.clone())?;
//! }
//! let stats = pool.join();
//! println!("ran {} tasks", stats.completed());
//! # Ok(())
//! # }
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, warn};

/// Minimum allowed worker count.
const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
const MAX_WORKERS: usize = 64;

/// Default worker count if not specified.
pub const DEFAULT_WORKERS: usize = 4;

/// A unit of blocking work executed by a [`WorkerPool`].
///
/// Tasks are shared (`Arc`) rather than moved into the pool so the submitter
/// keeps a handle for observing the task afterwards.
pub trait Runnable: Send + Sync {
    /// Runs the task to completion on the current thread.
    fn run(&self);
}

/// Error type for worker pool operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidThreadCount {
        /// The invalid value that was provided.
        value: usize,
    },

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The pool no longer accepts work.
    #[error("worker pool has shut down")]
    ShutDown,
}

/// Counters for tasks run by a pool.
#[derive(Debug, Default)]
pub struct PoolStats {
    completed: AtomicUsize,
    panicked: AtomicUsize,
}

impl PoolStats {
    /// Returns the number of tasks whose `run` returned normally.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Returns the number of tasks whose `run` panicked.
    #[must_use]
    pub fn panicked(&self) -> usize {
        self.panicked.load(Ordering::SeqCst)
    }

    /// Returns completed plus panicked.
    #[must_use]
    pub fn total(&self) -> usize {
        self.completed() + self.panicked()
    }
}

type Job = Arc<dyn Runnable>;

/// Fixed-size pool of worker threads.
///
/// Dropping the pool is equivalent to [`join`](Self::join): queued tasks
/// still run, and the drop blocks until they have.
#[derive(Debug)]
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
    stats: Arc<PoolStats>,
}

impl WorkerPool {
    /// Spawns `max_threads` workers named `remote-file-worker-<n>`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidThreadCount`] outside 1..=64, or
    /// [`PoolError::Spawn`] if the OS refuses a thread.
    pub fn new(max_threads: usize) -> Result<Self, PoolError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&max_threads) {
            return Err(PoolError::InvalidThreadCount { value: max_threads });
        }

        let (sender, receiver) = mpsc::channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));
        let stats = Arc::new(PoolStats::default());

        let mut workers = Vec::with_capacity(max_threads);
        for index in 0..max_threads {
            let receiver = Arc::clone(&receiver);
            let stats = Arc::clone(&stats);
            let handle = thread::Builder::new()
                .name(format!("remote-file-worker-{index}"))
                .spawn(move || worker_loop(&receiver, &stats))
                .map_err(PoolError::Spawn)?;
            workers.push(handle);
        }
        debug!(workers = max_threads, "worker pool started");

        Ok(Self {
            sender: Some(sender),
            workers,
            stats,
        })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn max_threads(&self) -> usize {
        self.workers.len()
    }

    /// Queues a task; the next idle worker runs it.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::ShutDown`] if every worker has exited.
    pub fn submit(&self, task: Arc<dyn Runnable>) -> Result<(), PoolError> {
        let sender = self.sender.as_ref().ok_or(PoolError::ShutDown)?;
        sender.send(task).map_err(|_| PoolError::ShutDown)
    }

    /// Live counters, updated as tasks finish.
    #[must_use]
    pub fn stats(&self) -> Arc<PoolStats> {
        Arc::clone(&self.stats)
    }

    /// Stops accepting work and waits for every queued task to finish.
    pub fn join(mut self) -> Arc<PoolStats> {
        self.shutdown();
        Arc::clone(&self.stats)
    }

    fn shutdown(&mut self) {
        // Closing the channel lets workers drain the queue and then exit.
        drop(self.sender.take());
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                warn!("worker thread exited abnormally");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(receiver: &Mutex<Receiver<Job>>, stats: &PoolStats) {
    loop {
        let next = receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .recv();
        let Ok(job) = next else {
            break;
        };

        if catch_unwind(AssertUnwindSafe(|| job.run())).is_ok() {
            stats.completed.fetch_add(1, Ordering::SeqCst);
        } else {
            stats.panicked.fetch_add(1, Ordering::SeqCst);
            error!(
                worker = thread::current().name().unwrap_or("unnamed"),
                "task panicked"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    struct Counter {
        runs: AtomicUsize,
    }

    impl Runnable for Counter {
        fn run(&self) {
            self.runs.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Panics;

    impl Runnable for Panics {
        fn run(&self) {
            panic!("task failure for test");
        }
    }

    struct RecordsThread {
        name: Mutex<Option<String>>,
    }

    impl Runnable for RecordsThread {
        fn run(&self) {
            *self.name.lock().unwrap() = thread::current().name().map(str::to_string);
        }
    }

    struct Sleeper {
        done: AtomicBool,
    }

    impl Runnable for Sleeper {
        fn run(&self) {
            thread::sleep(Duration::from_millis(50));
            self.done.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_new_rejects_zero_workers() {
        let err = WorkerPool::new(0).unwrap_err();
        assert!(matches!(err, PoolError::InvalidThreadCount { value: 0 }));
    }

    #[test]
    fn test_new_rejects_too_many_workers() {
        let err = WorkerPool::new(65).unwrap_err();
        assert!(matches!(err, PoolError::InvalidThreadCount { value: 65 }));
        assert!(err.to_string().contains("between 1 and 64"));
    }

    #[test]
    fn test_new_accepts_bounds() {
        assert_eq!(WorkerPool::new(1).unwrap().max_threads(), 1);
        assert_eq!(WorkerPool::new(64).unwrap().max_threads(), 64);
    }

    #[test]
    fn test_join_runs_every_submitted_task() {
        let pool = WorkerPool::new(3).unwrap();
        let counter = Arc::new(Counter {
            runs: AtomicUsize::new(0),
        });

        for _ in 0..20 {
            pool.submit(counter.clone()).unwrap();
        }
        let stats = pool.join();

        assert_eq!(counter.runs.load(Ordering::SeqCst), 20);
        assert_eq!(stats.completed(), 20);
        assert_eq!(stats.panicked(), 0);
    }

    #[test]
    fn test_panicking_task_does_not_kill_worker() {
        let pool = WorkerPool::new(1).unwrap();
        let counter = Arc::new(Counter {
            runs: AtomicUsize::new(0),
        });

        pool.submit(Arc::new(Panics)).unwrap();
        pool.submit(counter.clone()).unwrap();
        let stats = pool.join();

        assert_eq!(counter.runs.load(Ordering::SeqCst), 1);
        assert_eq!(stats.panicked(), 1);
        assert_eq!(stats.completed(), 1);
        assert_eq!(stats.total(), 2);
    }

    #[test]
    fn test_tasks_run_on_named_worker_threads() {
        let pool = WorkerPool::new(1).unwrap();
        let task = Arc::new(RecordsThread {
            name: Mutex::new(None),
        });

        pool.submit(task.clone()).unwrap();
        pool.join();

        assert_eq!(
            task.name.lock().unwrap().as_deref(),
            Some("remote-file-worker-0")
        );
    }

    #[test]
    fn test_drop_waits_for_queued_tasks() {
        let task = Arc::new(Sleeper {
            done: AtomicBool::new(false),
        });
        {
            let pool = WorkerPool::new(1).unwrap();
            pool.submit(task.clone()).unwrap();
        }
        assert!(task.done.load(Ordering::SeqCst));
    }
}
