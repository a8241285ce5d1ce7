//! Per-thread parallel region state.
//!
//! Each thread carries an "inside a parallel region" flag and the logical
//! thread number of the chunk it is executing. The engine changes both only
//! through [`RegionGuard`], which puts the previous values back when it is
//! dropped, including during unwinding.

use std::cell::Cell;

thread_local! {
    static IN_PARALLEL_REGION: Cell<bool> = const { Cell::new(false) };
    static THREAD_NUM: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Whether the current thread is executing a chunk of a fork-join call
pub fn in_region() -> bool {
    IN_PARALLEL_REGION.with(Cell::get)
}

/// Logical thread number (chunk task id) of the current thread, if any
pub fn thread_num() -> Option<usize> {
    THREAD_NUM.with(Cell::get)
}

/// Marks the current thread as running chunk `task_id` until dropped
pub(crate) struct RegionGuard {
    prev_in_region: bool,
    prev_thread_num: Option<usize>,
}

impl RegionGuard {
    pub(crate) fn enter(task_id: usize) -> Self {
        let prev_in_region = IN_PARALLEL_REGION.with(|flag| flag.replace(true));
        let prev_thread_num = THREAD_NUM.with(|num| num.replace(Some(task_id)));
        Self {
            prev_in_region,
            prev_thread_num,
        }
    }
}

impl Drop for RegionGuard {
    fn drop(&mut self) {
        IN_PARALLEL_REGION.with(|flag| flag.set(self.prev_in_region));
        THREAD_NUM.with(|num| num.set(self.prev_thread_num));
    }
}
