//! Inter-op pool for fire-and-forget task launches.
//!
//! Sized independently of the intra-op pool. The size can be requested once,
//! before the first [`launch`]; the first launch builds the pool and freezes
//! its size.

use super::lazy::LazyPool;
use crate::error::Result;

static INTEROP: LazyPool = LazyPool::new("interop", false);

/// Request the inter-op pool size.
///
/// `0` is ignored. Fails with [`ParallelError::Runtime`](crate::ParallelError::Runtime)
/// once a size was already committed or the pool has started.
pub fn set_num_interop_threads(nthreads: usize) -> Result<()> {
    set_on(&INTEROP, nthreads)
}

/// Inter-op pool size: the requested value, the hardware hint before the
/// pool exists, or the real pool size afterwards
pub fn get_num_interop_threads() -> usize {
    INTEROP.num_threads()
}

/// Run `task` asynchronously on the inter-op pool
pub fn launch<F>(task: F)
where
    F: FnOnce() + Send + 'static,
{
    launch_on(&INTEROP, task);
}

pub(crate) fn set_on(pool: &LazyPool, nthreads: usize) -> Result<()> {
    if nthreads == 0 {
        return Ok(());
    }
    pool.request_threads(nthreads)
}

pub(crate) fn launch_on<F>(pool: &LazyPool, task: F)
where
    F: FnOnce() + Send + 'static,
{
    pool.get().run(Box::new(task));
}
