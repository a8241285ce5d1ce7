//! Fork-join execution framework
//!
//! This module provides the data-parallel primitives and the pools behind them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ parallel_for │    │   engine     │    │  intra-op    │
//! │ parallel_    │───▶│ plan → fork  │───▶│  ThreadPool  │
//! │   reduce     │    │ → join       │    │ (n-1 workers)│
//! └──────────────┘    └──────────────┘    └──────────────┘
//!
//! ┌──────────────┐                        ┌──────────────┐
//! │   launch     │───────────────────────▶│  inter-op    │
//! │              │                        │  ThreadPool  │
//! └──────────────┘                        └──────────────┘
//! ```
//!
//! - **Planning**: [`plan::Plan`] splits `[begin, end)` into at most
//!   `get_num_threads()` chunks no smaller than the grain size.
//! - **Execution**: chunk 0 runs on the caller, the rest on the intra-op pool;
//!   the caller joins every chunk before returning.
//! - **Nesting**: a call made from inside a running chunk runs sequentially.
//! - **Sizing**: both pools are built on first use; their size can be
//!   requested once beforehand.
//!
//! # Example
//!
//! ```rust
//! use forkpool::parallel::{parallel_for, parallel_reduce};
//!
//! let total = parallel_reduce(
//!     0,
//!     1_000_000,
//!     1_000,
//!     0_i64,
//!     |start, end, acc| Ok((start..end).fold(acc, |a, i| a + i)),
//!     |a, b| a + b,
//! )?;
//! assert_eq!(total, 499_999_500_000);
//!
//! parallel_for(0, 100, 10, |start, end| {
//!     assert!(start < end);
//!     Ok(())
//! })?;
//! # Ok::<(), forkpool::ParallelError>(())
//! ```

pub mod engine;
pub mod future;
pub mod interop;
pub mod lazy;
pub mod plan;
pub mod pool;
pub mod region;

pub use future::Future;
pub use interop::{get_num_interop_threads, launch, set_num_interop_threads};
pub use lazy::{PoolSize, hardware_concurrency};
pub use plan::{Chunk, Plan};
pub use pool::ThreadPool;

use crate::error::{ParallelError, Result};
use lazy::LazyPool;

static INTRAOP: LazyPool = LazyPool::new("intraop", true);

/// Run `body` over `[begin, end)` split into chunks of at least `grain_size`.
///
/// Returns after every chunk has finished. The first chunk error is returned
/// as [`ParallelError::Body`]; a chunk panic is resumed on the caller.
pub fn parallel_for<F>(begin: i64, end: i64, grain_size: i64, body: F) -> Result<()>
where
    F: Fn(i64, i64) -> anyhow::Result<()> + Sync,
{
    engine::parallel_for_in(&INTRAOP, begin, end, grain_size, body)
}

/// Reduce `[begin, end)` chunk by chunk with `f`, then fold the partial
/// results in chunk order with `combine`, starting from `identity`.
pub fn parallel_reduce<T, F, SF>(
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
    engine::parallel_reduce_in(&INTRAOP, begin, end, grain_size, identity, f, combine)
}

/// Request the number of threads used by fork-join calls (caller included).
///
/// Must be positive and can only be set once, before the first parallel call.
pub fn set_num_threads(nthreads: usize) -> Result<()> {
    if nthreads == 0 {
        return Err(ParallelError::invalid_argument(
            "expected positive number of threads",
        ));
    }
    INTRAOP.request_threads(nthreads)
}

/// Number of threads taking part in a fork-join call, caller included
pub fn get_num_threads() -> usize {
    INTRAOP.num_threads()
}

/// Chunk task id of the current thread while it runs a chunk
pub fn get_thread_num() -> Option<usize> {
    region::thread_num()
}

/// Whether the current thread is inside a fork-join call
pub fn in_parallel_region() -> bool {
    region::in_region()
        || INTRAOP
            .get_if_initialized()
            .is_some_and(|pool| pool.in_thread_pool())
}

/// Sizing state of the intra-op pool
pub fn intraop_state() -> PoolSize {
    INTRAOP.state()
}
