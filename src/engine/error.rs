//! Button engine error types

use crate::gpio::GpioError;
use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Button engine error types
#[derive(Error, Debug)]
pub enum EngineError {
    /// Engine was configured with no lines to monitor
    #[error("line list is empty; at least one line must be configured")]
    EmptyLineSet,

    /// The same hardware line was configured twice
    #[error("line offset {0} configured more than once")]
    DuplicateLine(u32),

    /// Line index outside the configured table
    #[error("line index {index} out of range (engine has {count} lines)")]
    InvalidIndex {
        /// Requested index
        index: usize,
        /// Number of configured lines
        count: usize,
    },

    /// Edge source failure (fatal at startup, transient during operation)
    #[error(transparent)]
    Gpio(#[from] GpioError),

    /// The reader saw too many consecutive edge-source failures and stopped
    #[error("edge source failed {0} times in a row; engine stopped")]
    ReadFailureStreak(u32),

    /// Worker thread could not be spawned
    #[error("failed to spawn {worker} worker: {source}")]
    Spawn {
        /// Worker name
        worker: &'static str,
        /// Underlying OS error
        source: std::io::Error,
    },
}
