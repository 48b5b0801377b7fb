//! Input and output file locations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq, Eq)]
pub struct IoConfig {
    /// Single integer: main memory capacity.
    #[validate(custom(function = validation::validate_path))]
    #[serde(default = "default_memconfig")]
    pub memconfig: PathBuf,

    /// Process table: `<cores> <count>` then `<start> <duration>` pairs.
    #[validate(custom(function = validation::validate_path))]
    #[serde(default = "default_processes")]
    pub processes: PathBuf,

    /// One command per line.
    #[validate(custom(function = validation::validate_path))]
    #[serde(default = "default_commands")]
    pub commands: PathBuf,

    /// Event log destination.
    #[validate(custom(function = validation::validate_path))]
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Final disk snapshot destination.
    #[validate(custom(function = validation::validate_path))]
    #[serde(default = "default_snapshot")]
    pub snapshot: PathBuf,
}

fn default_memconfig() -> PathBuf {
    "memconfig.txt".into()
}

fn default_processes() -> PathBuf {
    "processes.txt".into()
}

fn default_commands() -> PathBuf {
    "commands.txt".into()
}

fn default_output() -> PathBuf {
    "output.txt".into()
}

fn default_snapshot() -> PathBuf {
    "vm.txt".into()
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            memconfig: default_memconfig(),
            processes: default_processes(),
            commands: default_commands(),
            output: default_output(),
            snapshot: default_snapshot(),
        }
    }
}
