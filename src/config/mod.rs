//! Thread configuration loading.
//!
//! Settings come from three layers, lowest priority first:
//!
//! 1. Built-in defaults (0 = use the hardware concurrency)
//! 2. A TOML file (`forkpool.toml` in the working directory, or an explicit path)
//! 3. `FORKPOOL_` environment variables (`FORKPOOL_NUM_THREADS`,
//!    `FORKPOOL_NUM_INTEROP_THREADS`)

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::parallel;

pub const DEFAULT_CONFIG_FILE: &str = "forkpool.toml";
pub const ENV_PREFIX: &str = "FORKPOOL_";

/// Requested pool sizes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Threads per fork-join call, caller included (0 = hardware default)
    pub num_threads: usize,
    /// Inter-op pool size (0 = hardware default)
    pub num_interop_threads: usize,
}

impl ParallelConfig {
    /// Load from defaults, `forkpool.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment(DEFAULT_CONFIG_FILE))
    }

    /// Load using `path` instead of `forkpool.toml`
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path))
    }

    fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(ParallelConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let config: ParallelConfig = figment.extract()?;
        tracing::trace!("CONFIG LOAD: {:?}", config);
        Ok(config)
    }

    /// Commit non-zero sizes to both pools.
    ///
    /// Fails if a pool size was already committed or the pool has started.
    pub fn apply(&self) -> Result<()> {
        if self.num_threads > 0 {
            parallel::set_num_threads(self.num_threads)?;
        }
        parallel::set_num_interop_threads(self.num_interop_threads)?;
        tracing::debug!(
            "Applied thread config: num_threads={}, num_interop_threads={}",
            self.num_threads,
            self.num_interop_threads
        );
        Ok(())
    }
}
