//! ## memtier-core::time
//! **Virtual clock driven by a background ticker**
//!
//! The clock is a single atomic counter. Exactly one ticker thread writes it,
//! adding `step` every `tick_interval` of wall-clock time; every other
//! component only reads it.
//!
//! Waiting for a point in virtual time uses a condition variable that the
//! ticker signals on every tick, so processes never spin on the counter.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::error::ClockError;

/// Read-only access to virtual time.
///
/// The cache and the event log only ever need `now()`, so they take this
/// trait instead of a concrete clock and can be driven by [`ManualClock`].
pub trait TimeSource: Send + Sync {
    fn now(&self) -> u64;
}

/// Tick parameters for [`VirtualClock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSettings {
    /// Value of the clock before the first tick.
    pub start: u64,
    /// Amount added on every tick.
    pub step: u64,
    /// Wall-clock time between ticks.
    pub tick_interval: Duration,
}

impl Default for ClockSettings {
    fn default() -> Self {
        Self {
            start: 0,
            step: 10,
            tick_interval: Duration::from_millis(100),
        }
    }
}

struct Shared {
    now: AtomicU64,
    stopped: AtomicBool,
    // Ticks happen while holding this lock so a waiter cannot miss one
    // between checking the counter and parking.
    lock: Mutex<()>,
    ticked: Condvar,
    stop_signal: Condvar,
}

impl Shared {
    fn halt(&self) {
        let _guard = self.lock.lock();
        self.stopped.store(true, Ordering::Release);
        self.stop_signal.notify_all();
        self.ticked.notify_all();
    }
}

/// Owns the ticker thread. Dropped with the last clone of its clock, which
/// stops and joins the thread.
struct Ticker {
    shared: Arc<Shared>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Ticker {
    fn shutdown(&self) -> bool {
        self.shared.halt();
        let Some(handle) = self.handle.lock().take() else {
            return false;
        };
        if handle.join().is_err() {
            tracing::error!("Virtual clock ticker panicked");
        }
        true
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        if self.shutdown() {
            debug!("Virtual clock dropped while running, ticker stopped");
        }
    }
}

/// Monotonic virtual clock. Clones share the same counter and ticker.
#[derive(Clone)]
pub struct VirtualClock {
    shared: Arc<Shared>,
    settings: ClockSettings,
    ticker: Arc<Ticker>,
}

impl VirtualClock {
    pub fn new(settings: ClockSettings) -> Self {
        let shared = Arc::new(Shared {
            now: AtomicU64::new(settings.start),
            stopped: AtomicBool::new(false),
            lock: Mutex::new(()),
            ticked: Condvar::new(),
            stop_signal: Condvar::new(),
        });
        Self {
            ticker: Arc::new(Ticker {
                shared: Arc::clone(&shared),
                handle: Mutex::new(None),
            }),
            shared,
            settings,
        }
    }

    /// Returns the current virtual time.
    #[inline]
    pub fn now(&self) -> u64 {
        self.shared.now.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.ticker.handle.lock().is_some() && !self.shared.stopped.load(Ordering::Acquire)
    }

    /// Spawns the ticker thread.
    pub fn start(&self) -> Result<(), ClockError> {
        let mut ticker = self.ticker.handle.lock();
        if self.shared.stopped.load(Ordering::Acquire) {
            return Err(ClockError::Stopped);
        }
        if ticker.is_some() {
            return Err(ClockError::AlreadyRunning);
        }

        let shared = Arc::clone(&self.shared);
        let settings = self.settings;
        let handle = thread::Builder::new()
            .name("virtual-clock".into())
            .spawn(move || run_ticker(&shared, settings))?;

        debug!(
            start = settings.start,
            step = settings.step,
            interval_ms = settings.tick_interval.as_millis() as u64,
            "Virtual clock started"
        );
        *ticker = Some(handle);
        Ok(())
    }

    /// Stops the ticker and joins it.
    ///
    /// Once this returns the clock never advances again, and every pending
    /// [`wait_until`](Self::wait_until) returns `false` unless its target was
    /// already reached. Stopping a clock that never started is a no-op apart
    /// from marking it stopped. Dropping the last clone of a running clock
    /// stops it the same way.
    pub fn stop(&self) {
        if self.ticker.shutdown() {
            debug!(now = self.now(), "Virtual clock stopped");
        }
    }

    /// Blocks until the clock reaches `target`.
    ///
    /// Returns `false` if the clock is stopped before reaching it.
    pub fn wait_until(&self, target: u64) -> bool {
        if self.now() >= target {
            return true;
        }

        let mut guard = self.shared.lock.lock();
        loop {
            if self.now() >= target {
                return true;
            }
            if self.shared.stopped.load(Ordering::Acquire) {
                return false;
            }
            self.shared.ticked.wait(&mut guard);
        }
    }
}

impl TimeSource for VirtualClock {
    #[inline]
    fn now(&self) -> u64 {
        VirtualClock::now(self)
    }
}

fn run_ticker(shared: &Shared, settings: ClockSettings) {
    let mut next = Instant::now() + settings.tick_interval;
    let mut guard = shared.lock.lock();

    while !shared.stopped.load(Ordering::Acquire) {
        let timed_out = shared.stop_signal.wait_until(&mut guard, next).timed_out();
        if shared.stopped.load(Ordering::Acquire) {
            break;
        }
        if timed_out {
            let now = shared.now.fetch_add(settings.step, Ordering::AcqRel) + settings.step;
            trace!(now, "tick");
            shared.ticked.notify_all();
            next += settings.tick_interval;
        }
    }
}

/// A clock that only moves when told to. Used to drive the cache and the
/// event log deterministically.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start: u64) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    pub fn set(&self, value: u64) {
        self.now.store(value, Ordering::Release);
    }

    pub fn advance(&self, delta: u64) {
        self.now.fetch_add(delta, Ordering::AcqRel);
    }
}

impl TimeSource for ManualClock {
    #[inline]
    fn now(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }
}
