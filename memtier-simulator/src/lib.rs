// memtier-simulator/src/lib.rs

/*!
# Memtier Simulator

Runs simulated processes against the two-tier memory manager of
`memtier-core`. Each process is a thread that waits for its start time on the
virtual clock, issues its Store/Release/Lookup commands with wall-clock pacing
in between, and waits out the rest of its duration.

## Key Components:
- **Commands:** parsing of `<Verb> <id> [<value>]` lines.
- **Process runner:** the per-process state machine.
- **Simulation:** clock start/stop, one thread per process, disk snapshot.
- **Replay:** sequential re-execution of a recorded log to check a concurrent
  run against its commit order.
*/

pub mod command;
pub mod error;
pub mod pacing;
pub mod replay;
pub mod runner;
pub mod simulation;
pub mod snapshot;

pub use command::{Command, CommandParseError};
pub use error::SimulationError;
pub use runner::{Process, ProcessReport, ProcessRunner, ProcessState, RunnerSettings};
pub use simulation::{Simulation, SimulationReport, SimulationSettings};
pub use snapshot::DiskSnapshot;
