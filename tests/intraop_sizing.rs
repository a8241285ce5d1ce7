//! Intra-op pool sizing through configuration.
//!
//! Commits process-wide pool sizes, so it runs as one test in its own binary.

use forkpool::parallel::{PoolSize, intraop_state};
use forkpool::{
    ParallelConfig, ParallelError, get_num_interop_threads, get_num_threads, parallel_for,
    set_num_threads,
};
use std::collections::HashSet;
use std::fs;
use std::sync::Mutex;
use tempfile::TempDir;

#[test]
fn test_config_file_sizes_pools() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("threads.toml");
    fs::write(&config_path, "num_threads = 4\nnum_interop_threads = 3\n").unwrap();

    let config = ParallelConfig::load_from(&config_path).unwrap();
    assert_eq!(config.num_threads, 4);
    config.apply().unwrap();

    assert_eq!(intraop_state(), PoolSize::Requested(4));
    assert_eq!(get_num_threads(), 4);
    assert_eq!(get_num_interop_threads(), 3);

    // Committed once: both a second apply and a direct call are rejected
    assert!(matches!(config.apply(), Err(ParallelError::Runtime(_))));
    assert!(matches!(set_num_threads(8), Err(ParallelError::Runtime(_))));

    // 4 threads: [0,25) [25,50) [50,75) [75,100)
    let chunks = Mutex::new(Vec::new());
    let workers = Mutex::new(HashSet::new());
    parallel_for(0, 100, 10, |start, end| {
        chunks.lock().unwrap().push((start, end));
        workers.lock().unwrap().insert(std::thread::current().id());
        Ok(())
    })
    .unwrap();

    let mut chunks = chunks.into_inner().unwrap();
    chunks.sort();
    assert_eq!(chunks, vec![(0, 25), (25, 50), (50, 75), (75, 100)]);
    assert!(workers.into_inner().unwrap().len() <= 4);

    assert_eq!(intraop_state(), PoolSize::Initialized);
    assert_eq!(get_num_threads(), 4);
}
