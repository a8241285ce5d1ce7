//! Chunk planning for fork-join calls.
//!
//! Splits `[begin, end)` into contiguous chunks of
//! `max(grain_size, ceil(len / thread_count))` indices. A range shorter than
//! the grain size, or a call made from inside a parallel region, yields a
//! single chunk so the caller runs it sequentially.

use crate::error::{ParallelError, Result};

/// One contiguous sub-range processed as a single unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub task_id: usize,
    pub start: i64,
    pub end: i64,
}

impl Chunk {
    pub fn len(&self) -> u64 {
        self.end.abs_diff(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Ordered chunks covering a range exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    begin: i64,
    end: i64,
    chunk_size: u64,
    num_tasks: usize,
}

impl Plan {
    /// Compute the plan for `[begin, end)`.
    ///
    /// `nested` is the caller's "already inside a parallel region" state;
    /// when set the plan always has a single chunk.
    pub fn compute(
        begin: i64,
        end: i64,
        grain_size: i64,
        thread_count: usize,
        nested: bool,
    ) -> Result<Self> {
        if grain_size < 0 {
            return Err(ParallelError::invalid_argument(format!(
                "grain_size must be non-negative, got {grain_size}"
            )));
        }

        if end <= begin {
            return Ok(Self {
                begin,
                end: begin,
                chunk_size: 0,
                num_tasks: 0,
            });
        }

        // Lengths are unsigned so that [i64::MIN, i64::MAX) still fits
        let len = end.abs_diff(begin);
        let grain = grain_size.unsigned_abs();
        if len < grain || nested {
            return Ok(Self {
                begin,
                end,
                chunk_size: len,
                num_tasks: 1,
            });
        }

        let threads = thread_count.max(1) as u64;
        let chunk_size = std::cmp::max(grain, divup(len, threads)).max(1);
        // chunk_size >= ceil(len / threads), so this never exceeds thread_count
        let num_tasks = divup(len, chunk_size) as usize;

        Ok(Self {
            begin,
            end,
            chunk_size,
            num_tasks,
        })
    }

    pub fn num_tasks(&self) -> usize {
        self.num_tasks
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    pub fn is_empty(&self) -> bool {
        self.num_tasks == 0
    }

    pub fn is_sequential(&self) -> bool {
        self.num_tasks == 1
    }

    /// Chunk `task_id`, clipped to the end of the range
    pub fn chunk(&self, task_id: usize) -> Option<Chunk> {
        if task_id >= self.num_tasks {
            return None;
        }
        // task_id * chunk_size < len, so the offset stays inside the range
        let start = self
            .begin
            .saturating_add_unsigned(task_id as u64 * self.chunk_size);
        let end = start.saturating_add_unsigned(self.chunk_size).min(self.end);
        Some(Chunk {
            task_id,
            start,
            end,
        })
    }

    pub fn chunks(&self) -> impl Iterator<Item = Chunk> + '_ {
        (0..self.num_tasks).filter_map(move |task_id| self.chunk(task_id))
    }
}

fn divup(x: u64, y: u64) -> u64 {
    x / y + u64::from(x % y != 0)
}
