//! # Memtier Configuration System
//!
//! Layered configuration for the memory hierarchy simulator plus readers for
//! the plain-text workload files (capacity, process table, command list).
//!
//! ## Layers
//! 1. Built-in defaults
//! 2. A YAML file (explicit path, or `memtier.yaml` if present)
//! 3. `MEMTIER_*` environment variables, `__` separating nested keys
//!
//! Everything is validated before use; a configuration error is fatal and
//! is reported before any simulated process starts.

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

mod clock;
mod error;
mod io;
mod memory;
mod runner;
mod telemetry;
mod validation;
pub mod workload;

pub use clock::ClockConfig;
pub use error::ConfigError;
pub use io::IoConfig;
pub use memory::MemoryConfig;
pub use runner::{DeadlinePolicy, ParsePolicy, RunnerConfig};
pub use telemetry::TelemetryConfig;
pub use workload::{ProcessEntry, ProcessSpec, ProcessTable, Workload};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "memtier.yaml";

/// Top‑level configuration container.
#[derive(Debug, Serialize, Deserialize, Validate, Default, Clone, PartialEq, Eq)]
pub struct MemtierConfig {
    #[validate(nested)]
    #[serde(default)]
    pub memory: MemoryConfig,

    #[validate(nested)]
    #[serde(default)]
    pub clock: ClockConfig,

    #[validate(nested)]
    #[serde(default)]
    pub runner: RunnerConfig,

    #[validate(nested)]
    #[serde(default)]
    pub io: IoConfig,

    #[validate(nested)]
    #[serde(default)]
    pub logging: TelemetryConfig,
}

impl MemtierConfig {
    /// Load configuration from defaults, an optional YAML file and the
    /// environment.
    ///
    /// An explicit `path` must exist. Without one, `memtier.yaml` is merged
    /// only if it is present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(MemtierConfig::default()));

        match path {
            Some(path) if !path.exists() => {
                return Err(ConfigError::FileNotFound(PathBuf::from(path)));
            }
            Some(path) => figment = figment.merge(Yaml::file(path)),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                figment = figment.merge(Yaml::file(DEFAULT_CONFIG_FILE));
            }
            None => debug!("{DEFAULT_CONFIG_FILE} not found, using default configuration"),
        }

        Self::extract(figment.merge(Env::prefixed("MEMTIER_").split("__")))
    }

    /// Extract and validate from an already assembled figment.
    pub fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }
}
