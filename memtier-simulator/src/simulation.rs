//! Simulation orchestration.
//!
//! Starts the virtual clock, runs every process on its own thread against
//! the shared cache, stops the clock once all of them are done and takes the
//! disk snapshot.

use std::io::Write;
use std::sync::Arc;

use tracing::{error, info, instrument};

use memtier_config::{MemtierConfig, Workload};
use memtier_core::{Cache, ClockSettings, EventLog, EventRecord, VirtualClock};
use memtier_telemetry::MetricsRecorder;

use crate::runner::{Process, ProcessReport, ProcessRunner, RunnerSettings};
use crate::snapshot::DiskSnapshot;
use crate::SimulationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationSettings {
    pub capacity: usize,
    pub clock: ClockSettings,
    pub runner: RunnerSettings,
}

impl SimulationSettings {
    pub fn from_config(config: &MemtierConfig, capacity: usize) -> Self {
        Self {
            capacity,
            clock: ClockSettings {
                start: config.clock.start,
                step: config.clock.step,
                tick_interval: config.clock.tick_interval(),
            },
            runner: RunnerSettings::from(&config.runner),
        }
    }
}

/// Outcome of a finished simulation.
#[derive(Debug)]
pub struct SimulationReport {
    pub capacity: usize,
    /// One entry per process, in process order.
    pub processes: Vec<Result<ProcessReport, SimulationError>>,
    /// Every record of the event log, in commit order.
    pub events: Vec<EventRecord>,
    pub snapshot: DiskSnapshot,
    /// Ids still in main memory at shutdown. They are not exported.
    pub resident: Vec<String>,
    pub final_clock: u64,
}

impl SimulationReport {
    pub fn failures(&self) -> impl Iterator<Item = &SimulationError> {
        self.processes.iter().filter_map(|outcome| outcome.as_ref().err())
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures().next().is_none()
    }
}

pub struct Simulation {
    settings: SimulationSettings,
    processes: Vec<Process>,
    clock: VirtualClock,
    cache: Arc<Cache>,
}

impl Simulation {
    pub fn new(settings: SimulationSettings, processes: Vec<Process>) -> Self {
        Self::with_outputs(settings, processes, None, Arc::new(MetricsRecorder::new()))
    }

    /// Builds a simulation from a loaded configuration and workload.
    pub fn from_workload(
        config: &MemtierConfig,
        workload: Workload,
        sink: Option<Box<dyn Write + Send>>,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        let settings = SimulationSettings::from_config(config, workload.capacity);
        let processes = workload.processes.into_iter().map(Process::from).collect();
        Self::with_outputs(settings, processes, sink, metrics)
    }

    /// Like [`Simulation::new`], mirroring the event log to `sink` (one
    /// flushed line per record) and reporting into `metrics`.
    pub fn with_outputs(
        settings: SimulationSettings,
        processes: Vec<Process>,
        sink: Option<Box<dyn Write + Send>>,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        let clock = VirtualClock::new(settings.clock);
        let time = Arc::new(clock.clone());
        let log = Arc::new(match sink {
            Some(sink) => EventLog::with_sink(time.clone(), sink),
            None => EventLog::new(time.clone()),
        });
        let cache = Arc::new(Cache::new(settings.capacity, time, log).with_metrics(metrics));

        Self {
            settings,
            processes,
            clock,
            cache,
        }
    }

    /// Runs every process to completion. A simulation can run only once.
    ///
    /// Failing processes are reported in [`SimulationReport::processes`] and
    /// never stop the others.
    #[instrument(skip(self), fields(processes = self.processes.len(), capacity = self.settings.capacity))]
    pub fn run(&self) -> Result<SimulationReport, SimulationError> {
        let runners: Vec<ProcessRunner> = self
            .processes
            .iter()
            .cloned()
            .map(|process| {
                ProcessRunner::new(
                    process,
                    self.clock.clone(),
                    Arc::clone(&self.cache),
                    self.settings.runner,
                )
            })
            .collect();

        self.clock.start()?;
        info!(now = self.clock.now(), "Simulation started");

        let outcomes = crossbeam::thread::scope(|scope| {
            let handles: Vec<_> = runners
                .iter()
                .map(|runner| {
                    scope
                        .builder()
                        .name(format!("process-{}", runner.pid()))
                        .spawn(move |_| runner.run())
                })
                .collect();

            handles
                .into_iter()
                .zip(&runners)
                .map(|(handle, runner)| match handle {
                    Ok(handle) => handle.join().unwrap_or_else(|_| {
                        error!(pid = runner.pid(), "Process runner panicked");
                        Err(SimulationError::RunnerPanicked { pid: runner.pid() })
                    }),
                    Err(e) => Err(SimulationError::Io(e)),
                })
                .collect::<Vec<_>>()
        });

        self.clock.stop();

        // Only reachable if the scope itself fails; every handle is joined
        // inside it.
        let processes = outcomes.unwrap_or_else(|_| {
            runners
                .iter()
                .map(|runner| Err(SimulationError::RunnerPanicked { pid: runner.pid() }))
                .collect()
        });

        let report = SimulationReport {
            capacity: self.settings.capacity,
            processes,
            events: self.cache.log().records(),
            snapshot: DiskSnapshot::from(self.cache.disk_snapshot()),
            resident: self.cache.resident_ids(),
            final_clock: self.clock.now(),
        };

        info!(
            final_clock = report.final_clock,
            events = report.events.len(),
            disk_pages = report.snapshot.len(),
            failed = report.failures().count(),
            "Simulation finished"
        );
        Ok(report)
    }
}
