//! Command implementations for the forkpool CLI
//!
//! Each command receives the loaded [`ParallelConfig`](crate::ParallelConfig)
//! and decides itself whether to commit it to the pools.

pub mod bench;
pub mod info;
