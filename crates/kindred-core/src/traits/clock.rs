//! Wall-clock source for session timestamps.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Supplies the current time to components that stamp records.
pub trait Clock: Send + Sync + std::fmt::Debug + 'static {
    /// The current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// Every call to [`Clock::now`] returns the current instant and then steps
/// it forward by the configured tick, so consecutive readings are strictly
/// increasing when the tick is positive.
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<DateTime<Utc>>,
    tick: Duration,
}

impl ManualClock {
    /// Start at `start`, advancing by `tick` after each reading.
    pub fn new(start: DateTime<Utc>, tick: Duration) -> Self {
        Self {
            current: Mutex::new(start),
            tick,
        }
    }

    /// Start at `start` and never advance on its own.
    pub fn frozen(start: DateTime<Utc>) -> Self {
        Self::new(start, Duration::zero())
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|p| p.into_inner());
        *current += by;
    }

    /// The instant the next reading will return.
    pub fn peek(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let mut current = self.current.lock().unwrap_or_else(|p| p.into_inner());
        let now = *current;
        *current += self.tick;
        now
    }
}
