use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use memtier_config::{MemtierConfig, Workload};
use memtier_simulator::{replay, Simulation};
use memtier_telemetry::{Logger, MetricsRecorder};

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the simulation and write the event log and disk snapshot
    Run(RunArgs),
    /// Load and validate the configuration, then print it
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Configuration file (defaults to memtier.yaml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Main memory capacity; the memconfig file is not read when set
    #[arg(long)]
    pub capacity: Option<usize>,
    #[arg(long)]
    pub processes: Option<PathBuf>,
    #[arg(long)]
    pub commands: Option<PathBuf>,
    /// Event log destination
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Disk snapshot destination
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

impl ConfigArgs {
    /// Loads the configuration and applies command-line overrides on top.
    fn load(&self) -> anyhow::Result<MemtierConfig> {
        let mut config = MemtierConfig::load(self.config.as_deref())
            .context("failed to load configuration")?;

        if let Some(capacity) = self.capacity {
            config.memory.capacity = Some(capacity);
        }
        if let Some(path) = &self.processes {
            config.io.processes = path.clone();
        }
        if let Some(path) = &self.commands {
            config.io.commands = path.clone();
        }
        if let Some(path) = &self.output {
            config.io.output = path.clone();
        }
        if let Some(path) = &self.snapshot {
            config.io.snapshot = path.clone();
        }
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
    /// Replay the recorded log sequentially and check it matches the run
    #[arg(long)]
    pub verify: bool,
    /// Print Prometheus metrics after the run
    #[arg(long)]
    pub metrics: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Both output files, opened before any process starts so that a bad path
/// fails the run up front.
struct OutputFiles {
    log: File,
    snapshot: File,
}

impl OutputFiles {
    fn create(config: &MemtierConfig) -> anyhow::Result<Self> {
        let log = File::create(&config.io.output)
            .with_context(|| format!("cannot create {}", config.io.output.display()))?;
        let snapshot = File::create(&config.io.snapshot)
            .with_context(|| format!("cannot create {}", config.io.snapshot.display()))?;
        Ok(Self { log, snapshot })
    }
}

pub async fn run_simulation(args: RunArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;
    Logger::init(&config.logging.level);

    let workload = Workload::load(&config).context("failed to load workload")?;
    info!(
        capacity = workload.capacity,
        processes = workload.processes.len(),
        "Workload loaded"
    );

    let outputs = OutputFiles::create(&config)?;
    let metrics = Arc::new(MetricsRecorder::new());
    let simulation = Simulation::from_workload(
        &config,
        workload,
        Some(Box::new(BufWriter::new(outputs.log))),
        Arc::clone(&metrics),
    );

    let report = tokio::task::spawn_blocking(move || simulation.run())
        .await
        .context("simulation task failed")??;

    report
        .snapshot
        .write_to(BufWriter::new(outputs.snapshot))
        .with_context(|| format!("cannot write {}", config.io.snapshot.display()))?;
    info!(
        path = %config.io.snapshot.display(),
        pages = report.snapshot.len(),
        "Disk snapshot written"
    );

    if args.verify {
        replay::verify(&report).context("run does not match its sequential replay")?;
        info!(events = report.events.len(), "Replay verified");
    }

    if args.metrics {
        match metrics.gather_metrics() {
            Ok(text) => print!("{text}"),
            Err(e) => warn!("Failed to gather metrics: {e}"),
        }
    }

    let failed = report.failures().count();
    for failure in report.failures() {
        error!("{failure}");
    }
    if failed > 0 {
        bail!("{failed} of {} processes failed", report.processes.len());
    }
    Ok(())
}

pub fn check_config(args: CheckArgs) -> anyhow::Result<()> {
    let config = args.config.load()?;
    println!("{config:#?}");
    Ok(())
}
