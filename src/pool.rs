//! Fixed-size worker pool with two submission styles
//!
//! One pool serves the whole pipeline: [`Batch`] submits a group of tasks
//! and waits for all of them (used for per-solid precomputation), and
//! [`AsyncMap`] submits tasks returning values and hands results back in
//! *completion* order (used for pairwise intersection checks).
//!
//! Workers pull boxed tasks from a shared channel; dropping the pool
//! closes the channel and joins every worker, so pending tasks always run
//! to completion. Task completion happens-before the `wait`/`get` that
//! observes it (the channel send/recv edge and the condvar both provide
//! the ordering). Cancellation is not a primitive here: long-running
//! kernel calls honour their own deadlines instead.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};

use crossbeam_channel::{Receiver, Sender};

use crate::Error;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A fixed set of worker threads behind a shared task queue
pub struct ThreadPool {
    queue: Option<Sender<Job>>,
    workers: Vec<std::thread::JoinHandle<()>>,
}

impl ThreadPool {
    /// Upper bound on the worker count; larger requests are configuration
    /// errors
    pub const MAX_WORKERS: usize = 1024;

    /// Builds a pool with `workers` threads
    pub fn new(workers: usize) -> Result<Self, Error> {
        if workers == 0 || workers > Self::MAX_WORKERS {
            return Err(Error::BadWorkerCount {
                count: workers,
                max: Self::MAX_WORKERS,
            });
        }
        let (tx, rx) = crossbeam_channel::unbounded::<Job>();
        let workers = (0..workers)
            .map(|i| {
                let rx: Receiver<Job> = rx.clone();
                std::thread::Builder::new()
                    .name(format!("worker-{i}"))
                    .spawn(move || {
                        for job in rx.iter() {
                            job();
                        }
                    })
                    .expect("failed to spawn worker thread")
            })
            .collect();
        Ok(Self {
            queue: Some(tx),
            workers,
        })
    }

    /// Builds a pool sized to the host core count
    pub fn with_default_size() -> Result<Self, Error> {
        Self::new(default_workers())
    }

    /// Number of worker threads
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Submits a task; it will run on some worker, eventually
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) {
        self.queue
            .as_ref()
            .expect("pool queue closed before drop")
            .send(Box::new(job))
            .expect("worker threads exited early");
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        // closing the queue lets workers drain and exit
        self.queue.take();
        for w in self.workers.drain(..) {
            let _ = w.join();
        }
    }
}

/// Host core count, used as the default worker count
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(ThreadPool::MAX_WORKERS)
}

/// Barrier-style submission: `wait` returns once every submitted task has
/// completed
///
/// Dropping a `Batch` also waits, so a scope ending is enough to
/// synchronize.
#[derive(Default)]
pub struct Batch {
    inner: Arc<BatchInner>,
}

#[derive(Default)]
struct BatchInner {
    in_flight: Mutex<usize>,
    done: Condvar,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&self, pool: &ThreadPool, job: impl FnOnce() + Send + 'static) {
        let inner = Arc::clone(&self.inner);
        *inner.in_flight.lock().unwrap() += 1;
        pool.submit(move || {
            job();
            let mut n = inner.in_flight.lock().unwrap();
            *n -= 1;
            if *n == 0 {
                inner.done.notify_all();
            }
        });
    }

    /// Blocks until every task submitted so far has completed
    pub fn wait(&self) {
        let mut n = self.inner.in_flight.lock().unwrap();
        while *n > 0 {
            n = self.inner.done.wait(n).unwrap();
        }
    }
}

impl Drop for Batch {
    fn drop(&mut self) {
        self.wait();
    }
}

/// Async-map submission: results come back as tasks finish, not in the
/// order they were submitted
pub struct AsyncMap<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    in_flight: Arc<AtomicUsize>,
}

impl<T: Send + 'static> AsyncMap<T> {
    pub fn new() -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn submit(&self, pool: &ThreadPool, job: impl FnOnce() -> T + Send + 'static) {
        let tx = self.tx.clone();
        let in_flight = Arc::clone(&self.in_flight);
        in_flight.fetch_add(1, Ordering::Release);
        pool.submit(move || {
            let result = job();
            // send before decrement, so `empty` can never report true
            // while a result is still on its way
            let _ = tx.send(result);
            in_flight.fetch_sub(1, Ordering::Release);
        });
    }

    /// `true` when no work is in flight and no results are buffered
    pub fn empty(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) == 0 && self.rx.is_empty()
    }

    /// Blocks for the next available result, in completion order
    ///
    /// Call only after checking [`AsyncMap::empty`]; the map holds its own
    /// sender, so this never observes a closed channel.
    pub fn get(&self) -> T {
        self.rx.recv().unwrap()
    }
}

impl<T: Send + 'static> Default for AsyncMap<T> {
    fn default() -> Self {
        Self::new()
    }
}
