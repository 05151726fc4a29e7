//! Wall-clock source for entry time stamping.

use chrono::NaiveTime;

/// Provides the local time of day at request handling time.
pub trait Clock: Send + Sync {
    fn time_of_day(&self) -> NaiveTime;
}

/// The host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn time_of_day(&self) -> NaiveTime {
        chrono::Local::now().time()
    }
}

/// Always reports the same time. Useful in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveTime);

impl Clock for FixedClock {
    fn time_of_day(&self) -> NaiveTime {
        self.0
    }
}
