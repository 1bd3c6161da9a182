//! Wall-clock source for budget decisions

use chrono::{DateTime, Local};

/// Source of "now" for the session machine
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// System clock, honouring `MYCEL_MOCK_TIME` in debug builds
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        mycel_util::now()
    }
}

/// Clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}
