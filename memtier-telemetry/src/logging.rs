//! ## memtier-telemetry::logging
//! **Diagnostic logging with `tracing`**
//!
//! The simulation's own event log (the `Clock: ...` lines) lives in
//! `memtier-core`. This module only configures the diagnostic subscriber that
//! receives `tracing` output from every crate.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone, Copy, Debug)]
pub struct Logger;

impl Logger {
    /// Installs the global fmt subscriber.
    ///
    /// `RUST_LOG` takes precedence over `default_level`. Returns `false` if a
    /// subscriber was already installed, which is harmless in tests.
    pub fn init(default_level: &str) -> bool {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| EnvFilter::new(default_level)),
            )
            .with_thread_names(true)
            .with_span_events(FmtSpan::CLOSE)
            .try_init()
            .is_ok()
    }

    /// Emits a lifecycle message for a simulated process.
    #[inline]
    pub fn process_event(pid: u32, phase: &str) {
        let span = tracing::info_span!("process", pid = pid);
        let _entered = span.enter();
        tracing::info!(phase = phase, "Process lifecycle event");
    }
}
