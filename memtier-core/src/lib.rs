//! # memtier-core
//!
//! Shared state of the two-tier memory simulation: the virtual clock, the
//! event log and the memory manager.
//!
//! ### Key Submodules:
//! - `time`: `VirtualClock` advanced by a background ticker, plus the
//!   `TimeSource` seam used by everything that only reads time
//! - `events`: the causally ordered event log
//! - `memory`: the LRU cache over a bounded main memory and an unbounded disk
//!
//! Lock order is always `Cache` before `EventLog`; the clock is lock-free for
//! readers.

pub mod error;
pub mod events;
pub mod memory;
pub mod time;

pub mod prelude {
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::memory::*;
    pub use crate::time::*;
}

pub use error::ClockError;
pub use events::{Event, EventLog, EventRecord};
pub use memory::{Cache, Page, Residency};
pub use time::{ClockSettings, ManualClock, TimeSource, VirtualClock};
