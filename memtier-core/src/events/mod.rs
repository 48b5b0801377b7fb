//! ## memtier-core::events
//! **Append-only event log stamped with virtual time**
//!
//! Every state change of the memory manager and every process lifecycle step
//! becomes one [`EventRecord`]. Records are kept in commit order and mirrored
//! line by line to an optional sink.

mod log;
mod record;

pub use log::EventLog;
pub use record::{Event, EventRecord};
