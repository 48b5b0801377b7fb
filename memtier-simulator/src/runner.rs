//! One simulated process.
//!
//! Lifecycle: `WaitingToStart -> Running -> WaitingToFinish -> Done`. The
//! runner sleeps on the virtual clock until its start time, executes its
//! command list against the shared cache with wall-clock pacing in between,
//! then waits out the rest of its duration.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, instrument, warn};

use memtier_config::{DeadlinePolicy, ParsePolicy, ProcessSpec, RunnerConfig};
use memtier_core::{Cache, Event, VirtualClock};
use memtier_telemetry::Logger;

use crate::command::Command;
use crate::pacing::Pacer;
use crate::SimulationError;

/// A process definition. Times are in virtual clock units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Process {
    pub id: u32,
    pub start: u64,
    pub duration: u64,
    pub commands: Vec<String>,
}

impl Process {
    pub fn new(id: u32, start: u64, duration: u64, commands: Vec<String>) -> Self {
        Self {
            id,
            start,
            duration,
            commands,
        }
    }

    /// Clock value at which the process is due to finish.
    pub fn deadline(&self) -> u64 {
        self.start.saturating_add(self.duration)
    }
}

impl From<ProcessSpec> for Process {
    fn from(spec: ProcessSpec) -> Self {
        Self::new(spec.id, spec.start, spec.duration, spec.commands)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcessState {
    WaitingToStart,
    Running,
    WaitingToFinish,
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunnerSettings {
    pub pacing: Duration,
    pub pacing_jitter: Duration,
    pub deadline_policy: DeadlinePolicy,
    pub parse_policy: ParsePolicy,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self::from(&RunnerConfig::default())
    }
}

impl From<&RunnerConfig> for RunnerSettings {
    fn from(config: &RunnerConfig) -> Self {
        Self {
            pacing: config.pacing(),
            pacing_jitter: config.pacing_jitter(),
            deadline_policy: config.deadline_policy,
            parse_policy: config.parse_policy,
        }
    }
}

/// What a process got through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProcessReport {
    pub pid: u32,
    /// Commands dispatched to the cache.
    pub executed: usize,
    /// Malformed lines skipped under the lenient policy.
    pub skipped: usize,
    /// Commands dropped because the deadline passed.
    pub abandoned: usize,
}

pub struct ProcessRunner {
    process: Process,
    clock: VirtualClock,
    cache: Arc<Cache>,
    settings: RunnerSettings,
    pacer: Pacer,
    state: Mutex<ProcessState>,
}

impl ProcessRunner {
    pub fn new(
        process: Process,
        clock: VirtualClock,
        cache: Arc<Cache>,
        settings: RunnerSettings,
    ) -> Self {
        let pacer = Pacer::new(settings.pacing, settings.pacing_jitter);
        Self {
            process,
            clock,
            cache,
            settings,
            pacer,
            state: Mutex::new(ProcessState::WaitingToStart),
        }
    }

    pub fn pid(&self) -> u32 {
        self.process.id
    }

    pub fn state(&self) -> ProcessState {
        *self.state.lock()
    }

    /// Drives the process to `Done`.
    ///
    /// Under the strict parse policy a malformed command ends the process
    /// with an error right away; the cache and the other processes are not
    /// affected.
    #[instrument(skip(self), fields(pid = self.process.id))]
    pub fn run(&self) -> Result<ProcessReport, SimulationError> {
        let pid = self.process.id;
        let deadline = self.process.deadline();
        let log = self.cache.log();
        let mut report = ProcessReport {
            pid,
            ..ProcessReport::default()
        };

        self.set_state(ProcessState::WaitingToStart);
        if !self.clock.wait_until(self.process.start) {
            return Err(SimulationError::ClockStopped { pid });
        }

        self.set_state(ProcessState::Running);
        log.append(Event::Started { pid });
        Logger::process_event(pid, "started");

        let total = self.process.commands.len();
        for (index, line) in self.process.commands.iter().enumerate() {
            if self.settings.deadline_policy == DeadlinePolicy::Abandon
                && self.clock.now() >= deadline
            {
                report.abandoned = total - index;
                log.append(Event::Abandoned {
                    pid,
                    remaining: report.abandoned,
                });
                debug!(remaining = report.abandoned, "Deadline reached");
                break;
            }

            match line.parse::<Command>() {
                Ok(command) => {
                    self.dispatch(&command);
                    report.executed += 1;
                }
                Err(source) => match self.settings.parse_policy {
                    ParsePolicy::Lenient => {
                        // Not part of the event log; only diagnostics see it.
                        warn!(line = %line, error = %source, "Skipping malformed command");
                        report.skipped += 1;
                    }
                    ParsePolicy::Strict => {
                        log.append(Event::Failed {
                            pid,
                            reason: format!("cannot parse {line:?}: {source}"),
                        });
                        self.set_state(ProcessState::Done);
                        return Err(SimulationError::CommandParse {
                            pid,
                            line: line.clone(),
                            source,
                        });
                    }
                },
            }

            self.pacer.pause();
        }

        self.set_state(ProcessState::WaitingToFinish);
        if !self.clock.wait_until(deadline) {
            return Err(SimulationError::ClockStopped { pid });
        }

        self.set_state(ProcessState::Done);
        log.append(Event::Finished { pid });
        Logger::process_event(pid, "finished");
        Ok(report)
    }

    fn dispatch(&self, command: &Command) {
        let pid = self.process.id;
        match command {
            Command::Store { id, value } => self.cache.store(pid, id, *value),
            Command::Release { id } => {
                self.cache.release(pid, id);
            }
            Command::Lookup { id } => {
                self.cache.lookup(pid, id);
            }
        }
    }

    fn set_state(&self, state: ProcessState) {
        *self.state.lock() = state;
    }
}
