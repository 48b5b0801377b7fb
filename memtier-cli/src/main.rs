//! ## memtier-cli
//! **Command-line front end for the memory hierarchy simulator**
//!
//! Loads the layered configuration and the workload files, runs the
//! simulation, and writes the event log and the disk snapshot.

use clap::Parser;

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(run_args) => commands::run_simulation(run_args).await,
        Commands::Check(check_args) => commands::check_config(check_args),
    }
}
