//! Monotonic wall clock for audit timestamps.
//!
//! Physical clocks can step backwards (NTP corrections, VM migration). The
//! audit log promises timestamps that never decrease within one log
//! instance, so every stamp is clamped to be no earlier than the last one
//! handed out.

use chrono::{DateTime, Utc};

/// A clock whose readings never decrease.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonotonicClock {
    last: Option<DateTime<Utc>>,
}

impl MonotonicClock {
    /// Creates a clock with no prior readings.
    #[must_use]
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Creates a clock that will never return anything earlier than `last`.
    ///
    /// Used when reopening a persisted log.
    #[must_use]
    pub const fn resume_from(last: DateTime<Utc>) -> Self {
        Self { last: Some(last) }
    }

    /// Returns the most recent reading, if any.
    #[must_use]
    pub const fn last(&self) -> Option<DateTime<Utc>> {
        self.last
    }

    /// Returns the next reading based on the system clock.
    #[must_use]
    pub fn peek(&self) -> DateTime<Utc> {
        self.peek_at(Utc::now())
    }

    /// Returns the reading the clock would give if the physical time were `now`.
    #[must_use]
    pub fn peek_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.last {
            Some(last) if last > now => last,
            _ => now,
        }
    }

    /// Records a reading previously obtained from [`peek`](Self::peek).
    ///
    /// Readings earlier than the current one are ignored.
    pub fn commit(&mut self, reading: DateTime<Utc>) {
        if self.last.is_none_or(|last| reading > last) {
            self.last = Some(reading);
        }
    }

    /// Takes a reading from the system clock and commits it.
    pub fn tick(&mut self) -> DateTime<Utc> {
        self.tick_at(Utc::now())
    }

    /// Takes a reading as if the physical time were `now` and commits it.
    pub fn tick_at(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let reading = self.peek_at(now);
        self.commit(reading);
        reading
    }
}
