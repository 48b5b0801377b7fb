//! Event types and their log-line rendering.

use std::fmt;

/// Something that happened in the simulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Store { pid: u32, id: String, value: u32 },
    Release { pid: u32, id: String },
    LookupFound { pid: u32, id: String, value: u32 },
    LookupMissing { pid: u32, id: String },
    /// A page moved from main memory to disk.
    SwapOut { id: String },
    /// A page moved from disk back into main memory.
    SwapIn { id: String },
    Started { pid: u32 },
    Finished { pid: u32 },
    Abandoned { pid: u32, remaining: usize },
    Failed { pid: u32, reason: String },
}

impl Event {
    /// Process that caused the event, if any. Swaps belong to the memory
    /// manager itself.
    pub fn pid(&self) -> Option<u32> {
        match self {
            Event::Store { pid, .. }
            | Event::Release { pid, .. }
            | Event::LookupFound { pid, .. }
            | Event::LookupMissing { pid, .. }
            | Event::Started { pid }
            | Event::Finished { pid }
            | Event::Abandoned { pid, .. }
            | Event::Failed { pid, .. } => Some(*pid),
            Event::SwapOut { .. } | Event::SwapIn { .. } => None,
        }
    }

    pub fn is_swap(&self) -> bool {
        matches!(self, Event::SwapOut { .. } | Event::SwapIn { .. })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Store { pid, id, value } => {
                write!(f, "Process {pid}, Store: Variable {id}, Value: {value}")
            }
            Event::Release { pid, id } => write!(f, "Process {pid}, Release: Variable {id}"),
            Event::LookupFound { pid, id, value } => {
                write!(f, "Process {pid}, Lookup: Variable {id}, Value: {value}")
            }
            Event::LookupMissing { pid, id } => {
                write!(f, "Process {pid}, Lookup: Variable {id} not found")
            }
            Event::SwapOut { id } => write!(f, "Memory Manager, SWAP: Variable {id} with disk"),
            Event::SwapIn { id } => write!(f, "Memory Manager, SWAP: Variable {id} with memory"),
            Event::Started { pid } => write!(f, "Process {pid}: Started."),
            Event::Finished { pid } => write!(f, "Process {pid}: Finished."),
            Event::Abandoned { pid, remaining } => write!(
                f,
                "Process {pid}: Deadline reached, {remaining} commands abandoned."
            ),
            Event::Failed { pid, reason } => write!(f, "Process {pid}: Failed: {reason}"),
        }
    }
}

/// An event together with the clock value it was committed at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventRecord {
    pub clock: u64,
    pub event: Event,
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Clock: {}, {}", self.clock, self.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(clock: u64, event: Event) -> String {
        EventRecord { clock, event }.to_string()
    }

    #[test]
    fn renders_process_operations() {
        assert_eq!(
            line(
                120,
                Event::Store {
                    pid: 1,
                    id: "x".into(),
                    value: 7
                }
            ),
            "Clock: 120, Process 1, Store: Variable x, Value: 7"
        );
        assert_eq!(
            line(
                0,
                Event::LookupMissing {
                    pid: 2,
                    id: "q".into()
                }
            ),
            "Clock: 0, Process 2, Lookup: Variable q not found"
        );
        assert_eq!(
            line(
                30,
                Event::Release {
                    pid: 3,
                    id: "a".into()
                }
            ),
            "Clock: 30, Process 3, Release: Variable a"
        );
    }

    #[test]
    fn renders_swaps_and_lifecycle() {
        assert_eq!(
            line(40, Event::SwapOut { id: "y".into() }),
            "Clock: 40, Memory Manager, SWAP: Variable y with disk"
        );
        assert_eq!(
            line(50, Event::SwapIn { id: "y".into() }),
            "Clock: 50, Memory Manager, SWAP: Variable y with memory"
        );
        assert_eq!(
            line(1000, Event::Started { pid: 4 }),
            "Clock: 1000, Process 4: Started."
        );
        assert_eq!(
            line(
                90,
                Event::Abandoned {
                    pid: 4,
                    remaining: 2
                }
            ),
            "Clock: 90, Process 4: Deadline reached, 2 commands abandoned."
        );
    }

    #[test]
    fn swaps_have_no_owner() {
        assert_eq!(Event::SwapIn { id: "a".into() }.pid(), None);
        assert_eq!(Event::Finished { pid: 9 }.pid(), Some(9));
        assert!(Event::SwapOut { id: "a".into() }.is_swap());
    }
}
