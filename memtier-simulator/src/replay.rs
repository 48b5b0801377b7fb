//! Sequential replay of a recorded event log.
//!
//! Re-executes every cache operation found in a log, in log order, against a
//! fresh cache whose clock is set to each record's stamp. Because every
//! operation commits under the cache lock and stamps its records with the
//! same clock value it used for access times, a concurrent run must produce
//! exactly the log its sequential replay produces.

use std::sync::Arc;

use memtier_core::{Cache, Event, EventLog, EventRecord, ManualClock};
use tracing::debug;

use crate::simulation::SimulationReport;
use crate::SimulationError;

/// Replays the cache operations of `records` on a new cache of `capacity`.
pub fn replay(capacity: usize, records: &[EventRecord]) -> Cache {
    let clock = Arc::new(ManualClock::new(0));
    let log = Arc::new(EventLog::new(clock.clone()));
    let cache = Cache::new(capacity, clock.clone(), log);

    for record in records {
        clock.set(record.clock);
        match &record.event {
            Event::Store { pid, id, value } => cache.store(*pid, id, *value),
            Event::Release { pid, id } => {
                cache.release(*pid, id);
            }
            Event::LookupFound { pid, id, .. } | Event::LookupMissing { pid, id } => {
                cache.lookup(*pid, id);
            }
            _ => {}
        }
    }
    cache
}

/// Checks that `report` matches its own sequential replay: the same cache
/// records in the same order, and the same final disk contents.
pub fn verify(report: &SimulationReport) -> Result<(), SimulationError> {
    let original: Vec<&EventRecord> = report
        .events
        .iter()
        .filter(|record| is_cache_event(&record.event))
        .collect();

    let cache = replay(report.capacity, &report.events);
    let replayed = cache.log().records();

    for (index, (expected, actual)) in original.iter().zip(&replayed).enumerate() {
        if **expected != *actual {
            return Err(SimulationError::ReplayMismatch {
                index,
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
    }
    if original.len() != replayed.len() {
        return Err(SimulationError::ReplayMismatch {
            index: original.len().min(replayed.len()),
            expected: format!("{} cache records", original.len()),
            actual: format!("{} cache records", replayed.len()),
        });
    }

    let disk = cache.disk_snapshot();
    if disk != report.snapshot.entries() {
        return Err(SimulationError::ReplayMismatch {
            index: original.len(),
            expected: format!("disk {:?}", report.snapshot.entries()),
            actual: format!("disk {disk:?}"),
        });
    }

    debug!(records = original.len(), "Replay matches recorded run");
    Ok(())
}

fn is_cache_event(event: &Event) -> bool {
    matches!(
        event,
        Event::Store { .. }
            | Event::Release { .. }
            | Event::LookupFound { .. }
            | Event::LookupMissing { .. }
            | Event::SwapOut { .. }
            | Event::SwapIn { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(clock: u64, event: Event) -> EventRecord {
        EventRecord { clock, event }
    }

    #[test]
    fn replay_rebuilds_tiers() {
        let records = vec![
            record(0, Event::Started { pid: 1 }),
            record(
                0,
                Event::Store {
                    pid: 1,
                    id: "a".into(),
                    value: 1,
                },
            ),
            record(
                10,
                Event::Store {
                    pid: 1,
                    id: "b".into(),
                    value: 2,
                },
            ),
            record(10, Event::SwapOut { id: "a".into() }),
            record(
                20,
                Event::LookupMissing {
                    pid: 1,
                    id: "z".into(),
                },
            ),
        ];

        let cache = replay(1, &records);
        assert_eq!(cache.resident_ids(), vec!["b"]);
        assert_eq!(cache.disk_snapshot(), vec![("a".to_string(), 1)]);
        assert_eq!(cache.log().len(), 4);
    }
}
