//! Process runner policies and pacing.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// What a process does with its remaining commands once its duration has
/// elapsed.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeadlinePolicy {
    /// Drop the rest of the command list.
    #[default]
    Abandon,
    /// Keep going; the finish wait is then already satisfied.
    RunToCompletion,
}

/// How malformed command lines are treated.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParsePolicy {
    /// Skip the line and carry on.
    #[default]
    Lenient,
    /// Fail the owning process. Other processes are unaffected.
    Strict,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Wall-clock pause after each command.
    #[serde(default = "default_pacing")]
    pub pacing_ms: u64,

    /// Upper bound of the uniform random extra pause after each command.
    #[serde(default)]
    pub pacing_jitter_ms: u64,

    /// Clock units per unit of the process table's start and duration.
    #[validate(range(min = 1))]
    #[serde(default = "default_time_scale")]
    pub time_scale: u64,

    #[serde(default)]
    pub deadline_policy: DeadlinePolicy,

    #[serde(default)]
    pub parse_policy: ParsePolicy,
}

fn default_pacing() -> u64 {
    100
}

fn default_time_scale() -> u64 {
    100
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing(),
            pacing_jitter_ms: 0,
            time_scale: default_time_scale(),
            deadline_policy: DeadlinePolicy::default(),
            parse_policy: ParsePolicy::default(),
        }
    }
}

impl RunnerConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }

    pub fn pacing_jitter(&self) -> Duration {
        Duration::from_millis(self.pacing_jitter_ms)
    }
}
