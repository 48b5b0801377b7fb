//! # Memtier Telemetry
//!
//! Crate for logging and metrics shared by the simulator crates.

pub mod logging;
pub mod metrics;

pub use logging::Logger;
pub use metrics::MetricsRecorder;
