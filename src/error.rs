//! Error types for forkpool.
//!
//! Every fallible library operation returns [`ParallelError`]. Chunk bodies
//! themselves report failures through `anyhow::Result`, which the engine
//! wraps into [`ParallelError::Body`] on the joining thread.

use thiserror::Error;

/// Main error type for parallel primitives and pool management
#[derive(Error, Debug)]
pub enum ParallelError {
    /// Bad input detected before any work was dispatched
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation not allowed in the current pool state
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// First failure raised by a chunk body
    #[error("Parallel body failed in chunk {task_id}: {source}")]
    Body {
        task_id: usize,
        #[source]
        source: anyhow::Error,
    },

    /// Broken internal invariant (e.g. a future completed twice)
    #[error("Logic error: {0}")]
    Logic(String),

    /// Configuration could not be extracted
    #[error("Configuration error: {0}")]
    Config(#[from] Box<figment::Error>),
}

impl ParallelError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Task id of the chunk that failed, for body failures
    pub fn task_id(&self) -> Option<usize> {
        match self {
            Self::Body { task_id, .. } => Some(*task_id),
            _ => None,
        }
    }
}

impl From<figment::Error> for ParallelError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

/// Result type alias for forkpool operations
pub type Result<T> = std::result::Result<T, ParallelError>;
