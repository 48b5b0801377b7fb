use thiserror::Error;

use memtier_config::ConfigError;
use memtier_core::ClockError;

use crate::command::CommandParseError;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Virtual clock error: {0}")]
    Clock(#[from] ClockError),

    #[error("Process {pid}: cannot parse command {line:?}: {source}")]
    CommandParse {
        pid: u32,
        line: String,
        #[source]
        source: CommandParseError,
    },

    #[error("Process {pid}: virtual clock stopped before the process could finish")]
    ClockStopped { pid: u32 },

    #[error("Process {pid}: runner thread panicked")]
    RunnerPanicked { pid: u32 },

    #[error("Replay diverged at operation {index}: expected {expected}, got {actual}")]
    ReplayMismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
