//! Single-assignment completion signal used to join dispatched chunks.
//!
//! A [`Future`] is shared through `Arc` between the job running on a pool
//! worker (the producer) and the thread that joins the fork-join call, so the
//! producer never outlives the value it completes.

use std::sync::{Condvar, Mutex, MutexGuard};

use crate::error::{ParallelError, Result};

/// Completion signal carrying a value, completed at most once
#[derive(Debug)]
pub struct Future<T> {
    value: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T> Default for Future<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Future<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    /// Publish the value and wake every waiter.
    ///
    /// Completing an already completed future is a logic error and leaves
    /// the stored value untouched.
    pub fn complete(&self, value: T) -> Result<()> {
        let mut slot = self.lock();
        if slot.is_some() {
            return Err(ParallelError::Logic(
                "future completed more than once".to_string(),
            ));
        }
        *slot = Some(value);
        drop(slot);
        self.ready.notify_all();
        Ok(())
    }

    pub fn is_completed(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // The slot is a plain Option, so a poisoned lock still holds a valid state
        self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn wait_completed(&self) -> MutexGuard<'_, Option<T>> {
        let guard = self.lock();
        self.ready
            .wait_while(guard, |slot| slot.is_none())
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<T: Clone> Future<T> {
    /// Block until the future is completed and return its value
    pub fn wait(&self) -> T {
        match self.wait_completed().as_ref() {
            Some(value) => value.clone(),
            None => unreachable!("wait_while returned before completion"),
        }
    }
}
