//! Lazily materialized pools guarded by a one-way sizing state machine.
//!
//! The requested size lives in a single atomic integer:
//!
//! ```text
//! Unset (-1) ──set──▶ Requested(n) ──first use──▶ Initialized (-2)
//!      └────────────────first use────────────────────────▲
//! ```
//!
//! A size can be requested at most once and only before the pool exists.
//! The first use consumes whatever value is present and builds the pool.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicI64, Ordering};

use super::pool::ThreadPool;
use crate::error::{ParallelError, Result};

const UNSET: i64 = -1;
const INITIALIZED: i64 = -2;

/// Largest size a pool can be asked for
pub const MAX_THREADS: usize = i64::MAX as usize;

/// Decoded pool sizing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolSize {
    Unset,
    Requested(usize),
    Initialized,
}

impl PoolSize {
    fn encode(self) -> i64 {
        match self {
            PoolSize::Unset => UNSET,
            // Clamped so an oversized request can never alias a sentinel
            PoolSize::Requested(n) => i64::try_from(n).unwrap_or(i64::MAX),
            PoolSize::Initialized => INITIALIZED,
        }
    }

    fn decode(raw: i64) -> Self {
        match raw {
            UNSET => PoolSize::Unset,
            INITIALIZED => PoolSize::Initialized,
            n if n > 0 => PoolSize::Requested(n as usize),
            other => unreachable!("invalid pool size state {other}"),
        }
    }
}

/// Atomic `Unset → Requested → Initialized` state
#[derive(Debug)]
pub struct SizeState(AtomicI64);

impl Default for SizeState {
    fn default() -> Self {
        Self::new()
    }
}

impl SizeState {
    pub const fn new() -> Self {
        Self(AtomicI64::new(UNSET))
    }

    pub fn load(&self) -> PoolSize {
        PoolSize::decode(self.0.load(Ordering::SeqCst))
    }

    /// Commit a user-requested size; fails unless the state is still `Unset`
    pub fn request(&self, n: usize) -> std::result::Result<(), PoolSize> {
        debug_assert!(n > 0 && n <= MAX_THREADS);
        let requested = PoolSize::Requested(n).encode();
        self.0
            .compare_exchange(UNSET, requested, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(PoolSize::decode)
    }

    /// Move to `Initialized`, returning the size that was requested, if any
    pub fn initialize(&self) -> Option<usize> {
        match PoolSize::decode(self.0.swap(INITIALIZED, Ordering::SeqCst)) {
            PoolSize::Requested(n) => Some(n),
            _ => None,
        }
    }
}

/// A thread pool built on first use from its sizing state
pub struct LazyPool {
    name: &'static str,
    /// The calling thread takes part in the work, so the pool holds one worker less
    caller_participates: bool,
    state: SizeState,
    pool: OnceLock<ThreadPool>,
}

impl LazyPool {
    pub const fn new(name: &'static str, caller_participates: bool) -> Self {
        Self {
            name,
            caller_participates,
            state: SizeState::new(),
            pool: OnceLock::new(),
        }
    }

    pub fn state(&self) -> PoolSize {
        self.state.load()
    }

    /// Request `n` threads before the pool is built
    pub fn request_threads(&self, n: usize) -> Result<()> {
        if n == 0 || n > MAX_THREADS {
            return Err(ParallelError::invalid_argument(format!(
                "number of {} threads must be between 1 and {MAX_THREADS}, got {n}",
                self.name
            )));
        }
        self.state.request(n).map_err(|current| {
            tracing::debug!("Rejected size request {} for '{}' in state {:?}", n, self.name, current);
            ParallelError::runtime(format!(
                "cannot set number of {} threads after parallel work has started \
                 or after a previous call",
                self.name
            ))
        })
    }

    /// Thread count as seen by users; never builds the pool
    pub fn num_threads(&self) -> usize {
        match self.state.load() {
            PoolSize::Requested(n) => n,
            PoolSize::Unset => hardware_concurrency(),
            PoolSize::Initialized => {
                let workers = self.get().size();
                if self.caller_participates {
                    workers + 1
                } else {
                    workers
                }
            }
        }
    }

    /// The pool, building it if needed
    pub fn get(&self) -> &ThreadPool {
        self.pool.get_or_init(|| {
            let requested = self.state.initialize();
            let threads = requested.unwrap_or_else(hardware_concurrency);
            let workers = if self.caller_participates {
                threads.saturating_sub(1)
            } else {
                threads
            };
            tracing::debug!(
                "Materializing '{}' pool: requested={:?}, workers={}",
                self.name,
                requested,
                workers
            );
            ThreadPool::new(&format!("forkpool-{}", self.name), workers)
        })
    }

    /// The pool if it has already been built
    pub fn get_if_initialized(&self) -> Option<&ThreadPool> {
        self.pool.get()
    }
}

/// Hardware concurrency hint used when no size was requested
pub fn hardware_concurrency() -> usize {
    num_cpus::get().max(1)
}
