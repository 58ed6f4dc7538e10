use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::datetime::ProjectDay;

/// Source of "now" and of the zone that decides which day a due date is on.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;

    fn timezone(&self) -> Tz;

    fn today(&self) -> ProjectDay {
        ProjectDay::of(self.now(), self.timezone())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    tz: Tz,
}

impl SystemClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(chrono_tz::UTC)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}

/// Always reports the same instant. UTC unless placed with `in_zone`.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<Utc>,
    tz: Tz,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            tz: chrono_tz::UTC,
        }
    }

    pub fn in_zone(self, tz: Tz) -> Self {
        Self { tz, ..self }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn timezone(&self) -> Tz {
        self.tz
    }
}
