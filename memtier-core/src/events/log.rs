//! Serialized event log.
//!
//! All writers go through one mutex. The position of a record in the log is
//! the order in which its writer acquired that mutex, not wall-clock arrival
//! order.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::warn;

use super::record::{Event, EventRecord};
use crate::time::TimeSource;

struct LogInner {
    records: Vec<EventRecord>,
    sink: Option<Box<dyn Write + Send>>,
}

pub struct EventLog {
    time: Arc<dyn TimeSource>,
    inner: Mutex<LogInner>,
}

impl EventLog {
    /// Creates an in-memory log stamped by `time`.
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self {
            time,
            inner: Mutex::new(LogInner {
                records: Vec::new(),
                sink: None,
            }),
        }
    }

    /// Creates a log that also writes every record to `sink`, flushing after
    /// each line.
    pub fn with_sink(time: Arc<dyn TimeSource>, sink: Box<dyn Write + Send>) -> Self {
        Self {
            time,
            inner: Mutex::new(LogInner {
                records: Vec::new(),
                sink: Some(sink),
            }),
        }
    }

    /// Appends one event stamped with the current clock value and returns
    /// that value.
    pub fn append(&self, event: Event) -> u64 {
        let mut inner = self.inner.lock();
        let clock = self.time.now();
        inner.push(EventRecord { clock, event });
        clock
    }

    /// Appends all `events` under a single acquisition, stamped with `clock`.
    ///
    /// The memory manager uses this so that the records of one operation are
    /// contiguous and carry the same clock value the operation used for page
    /// access times.
    pub fn append_at<I>(&self, clock: u64, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        let mut inner = self.inner.lock();
        for event in events {
            inner.push(EventRecord { clock, event });
        }
    }

    /// Copy of every record committed so far, in commit order.
    pub fn records(&self) -> Vec<EventRecord> {
        self.inner.lock().records.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the output sink is still attached.
    pub fn has_sink(&self) -> bool {
        self.inner.lock().sink.is_some()
    }
}

impl LogInner {
    fn push(&mut self, record: EventRecord) {
        if let Some(sink) = self.sink.as_mut() {
            let written = writeln!(sink, "{record}").and_then(|()| sink.flush());
            if let Err(e) = written {
                warn!("Event log sink failed, further lines are kept in memory only: {e}");
                self.sink = None;
            }
        }
        self.records.push(record);
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("EventLog")
            .field("records", &inner.records.len())
            .field("sink", &inner.sink.is_some())
            .finish()
    }
}
