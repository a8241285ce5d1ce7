//! # forkpool - Fork-join data parallelism over index ranges
//!
//! Splits an index range into chunks, runs them on a shared worker pool with
//! the calling thread taking part, and joins them before returning.
//!
//! ## Features
//!
//! - **`parallel_for` / `parallel_reduce`**: grain-size aware chunking over `[begin, end)`
//! - **Strict join**: every chunk finishes before the first failure is surfaced
//! - **No nested fan-out**: calls from inside a chunk run sequentially
//! - **Inter-op pool**: fire-and-forget [`launch`] on a separately sized pool
//! - **Configurable**: `forkpool.toml` and `FORKPOOL_` environment variables
//!
//! ## Quick Start
//!
//! ```rust
//! let sum = forkpool::parallel_reduce(
//!     0,
//!     10_000,
//!     100,
//!     0_i64,
//!     |start, end, acc| Ok((start..end).fold(acc, |a, i| a + i)),
//!     |a, b| a + b,
//! )?;
//! assert_eq!(sum, 49_995_000);
//! # Ok::<(), forkpool::ParallelError>(())
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod info;
pub mod parallel;

pub use config::ParallelConfig;
pub use error::{ParallelError, Result};
pub use info::{ParallelInfo, get_parallel_info, parallel_info};
pub use parallel::{
    get_num_interop_threads, get_num_threads, get_thread_num, in_parallel_region, launch,
    parallel_for, parallel_reduce, set_num_interop_threads, set_num_threads,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
