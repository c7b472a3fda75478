//! Per-player clock arithmetic and the wall-clock source it measures against.
//!
//! The clock keeps no state of its own: a match stores each player's
//! remaining seconds and the timestamp of the last move, and `tick` turns
//! those plus the elapsed time into the new remaining value.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Outcome of charging one move's thinking time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    pub remaining: u32,
    pub expired: bool,
}

/// Charges `elapsed` against `remaining` and credits `increment`.
///
/// The flag falls when the time left before the increment reaches zero; the
/// increment never rescues a player who ran out.
pub fn tick(remaining: u32, elapsed: u64, increment: u32) -> ClockTick {
    let before_increment = i64::from(remaining) - elapsed.min(i64::MAX as u64) as i64;
    let after_increment = (before_increment + i64::from(increment)).max(0);

    ClockTick {
        remaining: after_increment.min(i64::from(u32::MAX)) as u32,
        expired: before_increment <= 0,
    }
}

/// Whole seconds from `since` to `now`, truncated; zero if `now` is earlier.
pub fn elapsed_seconds(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    (now - since).num_seconds().max(0) as u64
}

/// Source of the current instant.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug)]
pub struct ManualTimeSource {
    current: Mutex<DateTime<Utc>>,
}

impl ManualTimeSource {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        let mut current = self.current.lock();
        *current = instant;
    }

    pub fn advance_seconds(&self, seconds: i64) {
        let mut current = self.current.lock();
        *current += Duration::seconds(seconds);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock()
    }
}
