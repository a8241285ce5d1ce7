use crossbeam::channel::{Receiver, Sender, unbounded};
use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

/// Unit of work accepted by the pool
pub type Job = Box<dyn FnOnce() + Send + 'static>;

static NEXT_POOL_ID: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    // Id of the pool owning the current worker thread (0 = not a worker)
    static WORKER_OF: Cell<usize> = const { Cell::new(0) };
}

/// Fixed-size pool of worker threads fed by an unbounded channel
///
/// Jobs always run: when the pool has no live workers they execute inline on
/// the submitting thread. A panicking job is caught and logged so the worker
/// keeps serving the queue.
pub struct ThreadPool {
    id: usize,
    name: String,
    job_tx: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

/// Context moved into each worker thread
struct WorkerContext {
    pool_id: usize,
    worker_id: usize,
    job_rx: Receiver<Job>,
}

impl ThreadPool {
    /// Spawn `size` workers named `{name}-{index}`.
    ///
    /// Workers that fail to spawn are logged and skipped; [`size`](Self::size)
    /// reports the number actually running.
    pub fn new(name: &str, size: usize) -> Self {
        let id = NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed);
        let (job_tx, job_rx): (Sender<Job>, Receiver<Job>) = unbounded();

        let mut workers = Vec::with_capacity(size);
        for worker_id in 0..size {
            let ctx = WorkerContext {
                pool_id: id,
                worker_id,
                job_rx: job_rx.clone(),
            };
            let spawned = std::thread::Builder::new()
                .name(format!("{name}-{worker_id}"))
                .spawn(move || worker_thread(ctx));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => tracing::warn!("Failed to spawn {}-{}: {}", name, worker_id, e),
            }
        }

        tracing::debug!("Started thread pool '{}' with {} workers", name, workers.len());

        Self {
            id,
            name: name.to_string(),
            job_tx: Some(job_tx),
            workers,
        }
    }

    /// Number of worker threads
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Whether the calling thread is one of this pool's workers
    pub fn in_thread_pool(&self) -> bool {
        WORKER_OF.with(Cell::get) == self.id
    }

    /// Enqueue `job` for asynchronous execution
    pub fn run(&self, job: Job) {
        let rejected = match &self.job_tx {
            Some(tx) if !self.workers.is_empty() => match tx.send(job) {
                Ok(()) => return,
                Err(err) => err.into_inner(),
            },
            _ => job,
        };
        tracing::trace!("Pool '{}' has no live workers, running job inline", self.name);
        rejected();
    }

    /// Enqueue a job that borrows data from the caller's stack.
    ///
    /// # Safety
    ///
    /// The caller must not let anything borrowed by `job` go out of scope
    /// before the job has finished running, typically by blocking on a
    /// completion signal the job sets as its last action.
    pub(crate) unsafe fn run_scoped<'scope>(&self, job: Box<dyn FnOnce() + Send + 'scope>) {
        // SAFETY: upheld by the caller; the erased lifetime only outlives
        // 'scope while the caller is blocked joining the job.
        let job: Job = unsafe {
            std::mem::transmute::<Box<dyn FnOnce() + Send + 'scope>, Job>(job)
        };
        self.run(job);
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        // Closing the channel lets every worker drain the queue and exit
        drop(self.job_tx.take());
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::warn!("Worker of pool '{}' terminated abnormally", self.name);
            }
        }
    }
}

fn worker_thread(ctx: WorkerContext) {
    WORKER_OF.with(|owner| owner.set(ctx.pool_id));

    while let Ok(job) = ctx.job_rx.recv() {
        if catch_unwind(AssertUnwindSafe(job)).is_err() {
            tracing::error!("Job panicked on worker {} of pool {}", ctx.worker_id, ctx.pool_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::bounded;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_runs_all_jobs() {
        let pool = ThreadPool::new("test-pool", 3);
        assert_eq!(pool.size(), 3);

        let counter = Arc::new(AtomicUsize::new(0));
        let (done_tx, done_rx) = bounded(64);
        for _ in 0..64 {
            let counter = counter.clone();
            let done_tx = done_tx.clone();
            pool.run(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                done_tx.send(()).unwrap();
            }));
        }
        for _ in 0..64 {
            done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 64);
    }

    #[test]
    fn test_worker_threads_are_named_and_recognized() {
        let pool = ThreadPool::new("named", 2);
        assert!(!pool.in_thread_pool());

        let (tx, rx) = bounded(8);
        for _ in 0..8 {
            let tx = tx.clone();
            pool.run(Box::new(move || {
                let name = std::thread::current().name().map(str::to_string);
                tx.send((name, WORKER_OF.with(Cell::get))).unwrap();
            }));
        }
        let mut names = HashSet::new();
        for _ in 0..8 {
            let (name, owner) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(owner, pool.id);
            names.insert(name.unwrap());
        }
        assert!(names.iter().all(|n| n.starts_with("named-")));

        let other = ThreadPool::new("other", 1);
        let (tx, rx) = bounded(1);
        other.run(Box::new(move || tx.send(WORKER_OF.with(Cell::get)).unwrap()));
        let owner = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(owner, other.id);
        assert_ne!(owner, pool.id);
    }

    #[test]
    fn test_zero_sized_pool_runs_inline() {
        let pool = ThreadPool::new("empty", 0);
        assert_eq!(pool.size(), 0);
        let caller = std::thread::current().id();
        let (tx, rx) = bounded(1);
        pool.run(Box::new(move || tx.send(std::thread::current().id()).unwrap()));
        assert_eq!(rx.try_recv().unwrap(), caller);
    }

    #[test]
    fn test_worker_survives_panicking_job() {
        let pool = ThreadPool::new("panicky", 1);
        pool.run(Box::new(|| panic!("job failure")));
        let (tx, rx) = bounded(1);
        pool.run(Box::new(move || tx.send(42).unwrap()));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
    }

    #[test]
    fn test_drop_drains_queue() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = ThreadPool::new("drain", 2);
            for _ in 0..100 {
                let counter = counter.clone();
                pool.run(Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }));
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 100);
    }
}
