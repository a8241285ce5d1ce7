//! Summary of the current threading setup.

use serde::Serialize;

use crate::config::ENV_PREFIX;
use crate::parallel::{self, PoolSize};

/// Environment variables that influence thread configuration
pub const THREAD_ENV_VARS: &[&str] = &["FORKPOOL_NUM_THREADS", "FORKPOOL_NUM_INTEROP_THREADS"];

/// Snapshot of thread settings; taking it never starts a pool
#[derive(Debug, Clone, Serialize)]
pub struct ParallelInfo {
    pub num_threads: usize,
    pub intraop_state: String,
    pub num_interop_threads: usize,
    pub hardware_concurrency: usize,
    pub physical_cores: usize,
    pub env: Vec<(String, String)>,
}

/// Collect the current thread settings
pub fn parallel_info() -> ParallelInfo {
    let env = THREAD_ENV_VARS
        .iter()
        .map(|name| {
            let value = std::env::var(name).unwrap_or_else(|_| "[not set]".to_string());
            (name.to_string(), value)
        })
        .collect();

    ParallelInfo {
        num_threads: parallel::get_num_threads(),
        intraop_state: describe_state(parallel::intraop_state()),
        num_interop_threads: parallel::get_num_interop_threads(),
        hardware_concurrency: parallel::hardware_concurrency(),
        physical_cores: num_cpus::get_physical(),
        env,
    }
}

/// Render [`parallel_info`] as a multi-line report
pub fn get_parallel_info() -> String {
    parallel_info().to_string()
}

fn describe_state(state: PoolSize) -> String {
    match state {
        PoolSize::Unset => "not started".to_string(),
        PoolSize::Requested(n) => format!("requested {n}"),
        PoolSize::Initialized => "running".to_string(),
    }
}

impl std::fmt::Display for ParallelInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "forkpool/parallel:")?;
        writeln!(
            f,
            "\tget_num_threads() : {} ({})",
            self.num_threads, self.intraop_state
        )?;
        writeln!(f, "\tget_num_interop_threads() : {}", self.num_interop_threads)?;
        writeln!(f, "hardware concurrency : {}", self.hardware_concurrency)?;
        writeln!(f, "physical cores : {}", self.physical_cores)?;
        writeln!(f, "Environment variables ({ENV_PREFIX}*):")?;
        for (name, value) in &self.env {
            writeln!(f, "\t{name} : {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lists_settings() {
        let report = get_parallel_info();
        assert!(report.contains("get_num_threads()"));
        assert!(report.contains("get_num_interop_threads()"));
        assert!(report.contains("hardware concurrency"));
        for name in THREAD_ENV_VARS {
            assert!(report.contains(name));
        }
    }

    #[test]
    fn test_info_serializes() {
        let info = parallel_info();
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["hardware_concurrency"], info.hardware_concurrency);
        assert!(json["env"].is_array());
    }

    #[test]
    fn test_state_descriptions() {
        assert_eq!(describe_state(PoolSize::Unset), "not started");
        assert_eq!(describe_state(PoolSize::Requested(4)), "requested 4");
        assert_eq!(describe_state(PoolSize::Initialized), "running");
    }
}
