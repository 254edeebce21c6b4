// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling
//!
//! Two readings are exposed. `now()` is monotonic and drives every local
//! deadline (renewal windows, write timeouts). `wall()` is only used for the
//! timestamps written into a lease record and for judging whether a record
//! read from the store has expired.

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A clock that provides the current time
pub trait Clock: Clone + Send + Sync + 'static {
    /// Monotonic time, for local deadlines
    fn now(&self) -> Instant;

    /// Wall-clock time, for timestamps shared through the store
    fn wall(&self) -> DateTime<Utc>;
}

/// Real system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug)]
struct FakeTime {
    instant: Instant,
    wall: DateTime<Utc>,
}

/// Fake clock for testing with controllable time
///
/// Clones share the same underlying time, so a test can hand one clone to
/// each candidate and advance them all at once.
#[derive(Clone, Debug)]
pub struct FakeClock {
    current: Arc<Mutex<FakeTime>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(FakeTime {
                instant: Instant::now(),
                wall: Utc::now(),
            })),
        }
    }

    /// Advance both readings by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        current.instant += duration;
        if let Ok(delta) = TimeDelta::from_std(duration) {
            current.wall += delta;
        }
    }

    /// Set the wall-clock reading without touching monotonic time.
    ///
    /// Simulates skew between hosts.
    pub fn set_wall(&self, wall: DateTime<Utc>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        current.wall = wall;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .instant
    }

    fn wall(&self) -> DateTime<Utc> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).wall
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
