//! ## memtier-core::memory
//! **LRU memory manager over a bounded main memory and an unbounded disk**
//!
//! Every public operation runs entirely inside one critical section, so
//! Store, Release and Lookup from different processes never interleave. The
//! event log is appended to while that section is held; the lock order is
//! therefore always cache first, log second.
//!
//! Policies:
//! - Eviction picks the resident page with the smallest `last_access`. Ties go
//!   to the page that entered main memory first.
//! - Storing an id that is already resident updates it in place and never
//!   evicts. Storing an id that lives on disk replaces the disk copy with a
//!   fresh resident page.
//! - With a capacity of zero a page is still inserted and logged, then moved
//!   to disk straight away.

mod page;

pub use page::{Page, Residency};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use memtier_telemetry::MetricsRecorder;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::events::{Event, EventLog};
use crate::time::TimeSource;

#[derive(Default)]
struct Tiers {
    /// Resident pages in the order they entered main memory.
    memory: Vec<Page>,
    disk: BTreeMap<String, Page>,
}

impl Tiers {
    fn position(&self, id: &str) -> Option<usize> {
        self.memory.iter().position(|page| page.id == id)
    }

    /// Index of the least recently used page. `min_by_key` keeps the first of
    /// equal keys, which is the earliest inserted.
    fn lru_position(&self) -> Option<usize> {
        self.memory
            .iter()
            .enumerate()
            .min_by_key(|(_, page)| page.last_access)
            .map(|(index, _)| index)
    }
}

/// The memory manager.
pub struct Cache {
    capacity: usize,
    time: Arc<dyn TimeSource>,
    log: Arc<EventLog>,
    metrics: Arc<MetricsRecorder>,
    tiers: Mutex<Tiers>,
}

impl Cache {
    pub fn new(capacity: usize, time: Arc<dyn TimeSource>, log: Arc<EventLog>) -> Self {
        Self {
            capacity,
            time,
            log,
            metrics: Arc::new(MetricsRecorder::new()),
            tiers: Mutex::new(Tiers::default()),
        }
    }

    /// Reports into a shared recorder instead of a private one.
    pub fn with_metrics(mut self, metrics: Arc<MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn log(&self) -> &Arc<EventLog> {
        &self.log
    }

    pub fn metrics(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }

    /// Stores `value` under `id` on behalf of process `pid`.
    pub fn store(&self, pid: u32, id: &str, value: u32) {
        let mut tiers = self.tiers.lock();
        let now = self.time.now();
        let mut events = Vec::with_capacity(2);

        if let Some(index) = tiers.position(id) {
            let page = &mut tiers.memory[index];
            page.value = value;
            page.last_access = now;
            trace!(pid, id, "Store updated resident page in place");
        } else {
            if tiers.disk.remove(id).is_some() {
                trace!(pid, id, "Store superseded disk copy");
            }
            self.make_room(&mut tiers, &mut events);
            tiers.memory.push(Page::new(id, value, now));
        }

        events.push(Event::Store {
            pid,
            id: id.to_owned(),
            value,
        });
        self.settle_overflow(&mut tiers, &mut events);
        self.metrics.stores.inc();
        self.commit(&tiers, now, events);
        debug!(pid, id, value, now, "Store");
    }

    /// Removes `id` from both tiers. Releasing an absent id only logs.
    ///
    /// Returns whether a page was removed.
    pub fn release(&self, pid: u32, id: &str) -> bool {
        let mut tiers = self.tiers.lock();
        let now = self.time.now();

        let before = tiers.memory.len();
        tiers.memory.retain(|page| page.id != id);
        let from_memory = tiers.memory.len() != before;
        let from_disk = tiers.disk.remove(id).is_some();
        let removed = from_memory || from_disk;

        self.metrics.releases.inc();
        self.commit(
            &tiers,
            now,
            [Event::Release {
                pid,
                id: id.to_owned(),
            }],
        );
        debug!(pid, id, removed, now, "Release");
        removed
    }

    /// Looks `id` up, promoting it from disk if needed.
    pub fn lookup(&self, pid: u32, id: &str) -> Option<u32> {
        let mut tiers = self.tiers.lock();
        let now = self.time.now();

        if let Some(index) = tiers.position(id) {
            let page = &mut tiers.memory[index];
            page.last_access = now;
            let value = page.value;

            self.metrics.lookup_hits.inc();
            self.commit(
                &tiers,
                now,
                [Event::LookupFound {
                    pid,
                    id: id.to_owned(),
                    value,
                }],
            );
            debug!(pid, id, value, now, "Lookup hit in memory");
            return Some(value);
        }

        if let Some(mut page) = tiers.disk.remove(id) {
            let mut events = Vec::with_capacity(4);
            self.make_room(&mut tiers, &mut events);

            page.last_access = now;
            let value = page.value;
            tiers.memory.push(page);
            self.metrics.swaps_in.inc();
            events.push(Event::SwapIn { id: id.to_owned() });
            events.push(Event::LookupFound {
                pid,
                id: id.to_owned(),
                value,
            });
            self.settle_overflow(&mut tiers, &mut events);

            self.metrics.lookup_hits.inc();
            self.commit(&tiers, now, events);
            debug!(pid, id, value, now, "Lookup promoted page from disk");
            return Some(value);
        }

        self.metrics.lookup_misses.inc();
        self.commit(
            &tiers,
            now,
            [Event::LookupMissing {
                pid,
                id: id.to_owned(),
            }],
        );
        debug!(pid, id, now, "Lookup miss");
        None
    }

    /// Where `id` lives right now, with a copy of its page.
    pub fn peek(&self, id: &str) -> Option<(Residency, Page)> {
        let tiers = self.tiers.lock();
        if let Some(index) = tiers.position(id) {
            return Some((Residency::Memory, tiers.memory[index].clone()));
        }
        tiers
            .disk
            .get(id)
            .map(|page| (Residency::Disk, page.clone()))
    }

    /// Resident ids in insertion order.
    pub fn resident_ids(&self) -> Vec<String> {
        self.tiers
            .lock()
            .memory
            .iter()
            .map(|page| page.id.clone())
            .collect()
    }

    pub fn resident_pages(&self) -> Vec<Page> {
        self.tiers.lock().memory.clone()
    }

    /// Disk ids in ascending order.
    pub fn disk_ids(&self) -> Vec<String> {
        self.tiers.lock().disk.keys().cloned().collect()
    }

    pub fn memory_len(&self) -> usize {
        self.tiers.lock().memory.len()
    }

    pub fn disk_len(&self) -> usize {
        self.tiers.lock().disk.len()
    }

    /// `(id, value)` for every disk page, ordered by id.
    pub fn disk_snapshot(&self) -> Vec<(String, u32)> {
        self.tiers
            .lock()
            .disk
            .values()
            .map(|page| (page.id.clone(), page.value))
            .collect()
    }

    /// Evicts until one more page fits.
    fn make_room(&self, tiers: &mut Tiers, events: &mut Vec<Event>) {
        while !tiers.memory.is_empty() && tiers.memory.len() >= self.capacity {
            self.evict_lru(tiers, events);
        }
    }

    /// Only does work for a zero capacity, where `make_room` cannot help.
    fn settle_overflow(&self, tiers: &mut Tiers, events: &mut Vec<Event>) {
        while tiers.memory.len() > self.capacity {
            self.evict_lru(tiers, events);
        }
    }

    fn evict_lru(&self, tiers: &mut Tiers, events: &mut Vec<Event>) {
        let Some(index) = tiers.lru_position() else {
            return;
        };
        let page = tiers.memory.remove(index);
        trace!(id = %page.id, last_access = page.last_access, "Evicting to disk");

        events.push(Event::SwapOut {
            id: page.id.clone(),
        });
        self.metrics.swaps_out.inc();
        tiers.disk.insert(page.id.clone(), page);
    }

    fn commit<I>(&self, tiers: &Tiers, now: u64, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        self.metrics
            .record_tiers(tiers.memory.len(), tiers.disk.len());
        self.log.append_at(now, events);
    }
}

impl fmt::Debug for Cache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tiers = self.tiers.lock();
        f.debug_struct("Cache")
            .field("capacity", &self.capacity)
            .field("memory", &tiers.memory)
            .field("disk", &tiers.disk)
            .finish()
    }
}
