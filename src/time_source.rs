//! Clock abstraction for the scheduler.
//!
//! The engine never calls `Local::now()` directly; it asks the [`TimeSource`]
//! it was built with. Production code uses [`RealTimeSource`]. Tests drive a
//! [`ManualTimeSource`] forward to cross twilight windows and midnight without
//! waiting for wall-clock time to pass.

use chrono::{DateTime, Local};

/// Source of the current local time.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// System wall clock.
pub struct RealTimeSource;

impl TimeSource for RealTimeSource {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
#[cfg(any(test, feature = "testing-support"))]
pub struct ManualTimeSource {
    current: std::sync::Mutex<DateTime<Local>>,
}

#[cfg(any(test, feature = "testing-support"))]
impl ManualTimeSource {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            current: std::sync::Mutex::new(start),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, time: DateTime<Local>) {
        *crate::common::utils::lock(&self.current) = time;
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: chrono::Duration) {
        let mut current = crate::common::utils::lock(&self.current);
        *current += delta;
    }
}

#[cfg(any(test, feature = "testing-support"))]
impl TimeSource for ManualTimeSource {
    fn now(&self) -> DateTime<Local> {
        *crate::common::utils::lock(&self.current)
    }
}
