//! Wall-clock pacing between commands.
//!
//! A process pauses after every command for a base delay plus a uniform
//! random jitter. This is real time; it never advances the virtual clock.

use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[derive(Debug)]
pub struct Pacer {
    base: Duration,
    jitter_ms: u64,
    rng: Mutex<SmallRng>,
}

impl Pacer {
    pub fn new(base: Duration, jitter: Duration) -> Self {
        Self::with_rng(base, jitter, SmallRng::from_rng(&mut rand::rng()))
    }

    /// Same as [`Pacer::new`] but with reproducible jitter.
    pub fn seeded(base: Duration, jitter: Duration, seed: u64) -> Self {
        Self::with_rng(base, jitter, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(base: Duration, jitter: Duration, rng: SmallRng) -> Self {
        Self {
            base,
            jitter_ms: u64::try_from(jitter.as_millis()).unwrap_or(u64::MAX),
            rng: Mutex::new(rng),
        }
    }

    /// Next pause length.
    pub fn delay(&self) -> Duration {
        if self.jitter_ms == 0 {
            return self.base;
        }
        let extra = self.rng.lock().random_range(0..=self.jitter_ms);
        self.base + Duration::from_millis(extra)
    }

    pub fn pause(&self) {
        let delay = self.delay();
        if !delay.is_zero() {
            thread::sleep(delay);
        }
    }
}
