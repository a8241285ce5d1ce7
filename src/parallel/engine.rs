//! Fork-join execution of `parallel_for` and `parallel_reduce`.
//!
//! A call is planned into chunks; chunks `1..n` are dispatched to the pool
//! while the calling thread runs chunk 0, then the caller blocks on one
//! [`Future`] per dispatched chunk. Every chunk runs to completion before the
//! first recorded failure is surfaced on the caller.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crossbeam::channel::{Receiver, Sender, bounded};

use super::future::Future;
use super::lazy::LazyPool;
use super::plan::{Chunk, Plan};
use super::region::{self, RegionGuard};
use crate::error::{ParallelError, Result};

/// What a chunk body left behind when it failed
enum ChunkFailure {
    Error(anyhow::Error),
    Panic(Box<dyn Any + Send + 'static>),
}

/// First failure of a fork-join call.
///
/// The atomic claim decides the single winner. Only the winner hands its
/// failure to the one-element slot, and the joiner takes it once every chunk
/// has completed, so no chunk ever waits on another.
struct FirstFailure {
    claimed: AtomicBool,
    slot_tx: Sender<(usize, ChunkFailure)>,
    slot_rx: Receiver<(usize, ChunkFailure)>,
}

impl FirstFailure {
    fn new() -> Self {
        let (slot_tx, slot_rx) = bounded(1);
        Self {
            claimed: AtomicBool::new(false),
            slot_tx,
            slot_rx,
        }
    }

    fn record(&self, task_id: usize, failure: ChunkFailure) {
        if self.claimed.swap(true, Ordering::AcqRel) {
            tracing::debug!("Discarding failure from chunk {}, an earlier one was kept", task_id);
            return;
        }
        if self.slot_tx.try_send((task_id, failure)).is_err() {
            tracing::error!("Failure slot of chunk {} already filled", task_id);
        }
    }

    /// Surface the kept failure: body errors are returned, panics resume on the caller
    fn into_result(self) -> Result<()> {
        match self.slot_rx.try_recv().ok() {
            None => Ok(()),
            Some((task_id, ChunkFailure::Error(source))) => {
                Err(ParallelError::Body { task_id, source })
            }
            Some((_, ChunkFailure::Panic(payload))) => resume_unwind(payload),
        }
    }
}

/// Run one chunk with region bookkeeping and a failure boundary
fn run_chunk<F>(chunk: Chunk, task: &F, failure: &FirstFailure)
where
    F: Fn(usize, i64, i64) -> anyhow::Result<()>,
{
    let _region = RegionGuard::enter(chunk.task_id);
    match catch_unwind(AssertUnwindSafe(|| task(chunk.task_id, chunk.start, chunk.end))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => failure.record(chunk.task_id, ChunkFailure::Error(err)),
        Err(payload) => failure.record(chunk.task_id, ChunkFailure::Panic(payload)),
    }
}

/// Whether a call issued now must run sequentially
fn is_nested(pool: &LazyPool) -> bool {
    region::in_region()
        || pool
            .get_if_initialized()
            .is_some_and(|workers| workers.in_thread_pool())
}

/// Dispatch chunks `1..n` to the pool, run chunk 0 here and join them all
fn fork_join<F>(pool: &LazyPool, plan: &Plan, task: &F) -> Result<()>
where
    F: Fn(usize, i64, i64) -> anyhow::Result<()> + Sync,
{
    let workers = pool.get();
    let failure = FirstFailure::new();
    let failure_ref = &failure;
    let mut futures: Vec<Arc<Future<()>>> = Vec::with_capacity(plan.num_tasks());

    for chunk in plan.chunks().skip(1) {
        let future = Arc::new(Future::new());
        let producer = Arc::clone(&future);
        tracing::trace!("Dispatching chunk {} [{}, {})", chunk.task_id, chunk.start, chunk.end);

        let job: Box<dyn FnOnce() + Send + '_> = Box::new(move || {
            run_chunk(chunk, task, failure_ref);
            // Completion must happen on every path or the joiner blocks forever
            if let Err(err) = producer.complete(()) {
                tracing::error!("Chunk {}: {}", chunk.task_id, err);
            }
        });
        // SAFETY: `task` and `failure` outlive the job because every future
        // is waited on below before this function returns, and nothing in
        // between can unwind (chunk 0 runs inside a failure boundary).
        unsafe { workers.run_scoped(job) };
        futures.push(future);
    }

    if let Some(first) = plan.chunk(0) {
        run_chunk(first, task, failure_ref);
    }

    for future in &futures {
        future.wait();
    }

    failure.into_result()
}

/// `parallel_for` on an explicit pool
pub(crate) fn parallel_for_in<F>(
    pool: &LazyPool,
    begin: i64,
    end: i64,
    grain_size: i64,
    body: F,
) -> Result<()>
where
    F: Fn(i64, i64) -> anyhow::Result<()> + Sync,
{
    if begin >= end {
        return Ok(());
    }

    let plan = Plan::compute(begin, end, grain_size, pool.num_threads(), is_nested(pool))?;
    if plan.is_sequential() {
        return body(begin, end).map_err(|source| ParallelError::Body { task_id: 0, source });
    }

    tracing::trace!(
        "parallel_for [{}, {}) in {} chunks of {}",
        begin,
        end,
        plan.num_tasks(),
        plan.chunk_size()
    );
    fork_join(pool, &plan, &|_task_id: usize, start: i64, stop: i64| body(start, stop))
}

/// `parallel_reduce` on an explicit pool
pub(crate) fn parallel_reduce_in<T, F, SF>(
    pool: &LazyPool,
    begin: i64,
    end: i64,
    grain_size: i64,
    identity: T,
    f: F,
    combine: SF,
) -> Result<T>
where
    T: Clone + Send + Sync,
    F: Fn(i64, i64, T) -> anyhow::Result<T> + Sync,
    SF: Fn(T, T) -> T,
{
    if begin >= end {
        return Ok(identity);
    }

    let plan = Plan::compute(begin, end, grain_size, pool.num_threads(), is_nested(pool))?;
    if plan.is_sequential() {
        return f(begin, end, identity).map_err(|source| ParallelError::Body { task_id: 0, source });
    }

    tracing::trace!(
        "parallel_reduce [{}, {}) in {} chunks of {}",
        begin,
        end,
        plan.num_tasks(),
        plan.chunk_size()
    );

    // One slot per task; each chunk writes only its own
    let results: Vec<OnceLock<T>> = (0..plan.num_tasks()).map(|_| OnceLock::new()).collect();
    fork_join(pool, &plan, &|task_id: usize, start: i64, stop: i64| {
        let partial = f(start, stop, identity.clone())?;
        let stored = results[task_id].set(partial).is_ok();
        debug_assert!(stored, "chunk {task_id} stored twice");
        Ok(())
    })?;

    Ok(results
        .into_iter()
        .filter_map(OnceLock::into_inner)
        .fold(identity, combine))
}
