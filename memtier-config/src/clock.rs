//! Virtual clock cadence.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, Clone, PartialEq, Eq)]
pub struct ClockConfig {
    /// Clock value before the first tick.
    #[serde(default)]
    pub start: u64,

    /// Virtual time added per tick.
    #[validate(range(min = 1))]
    #[serde(default = "default_step")]
    pub step: u64,

    /// Wall-clock milliseconds between ticks.
    #[validate(range(min = 1, max = 60_000))]
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
}

fn default_step() -> u64 {
    10
}

fn default_tick_interval() -> u64 {
    100
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            start: 0,
            step: default_step(),
            tick_interval_ms: default_tick_interval(),
        }
    }
}

impl ClockConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
