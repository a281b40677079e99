//! One-shot broadcast stop signal.
//!
//! Firing wakes every waiter at once: the scheduler's tick wait and any
//! animation's frame wait. A signal never resets; each run gets a fresh one.

use std::sync::{Condvar, Mutex};
use std::time::Duration;

use crate::common::utils::lock;

#[derive(Debug, Default)]
pub struct StopSignal {
    fired: Mutex<bool>,
    cond: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the signal. Repeated calls are harmless.
    pub fn fire(&self) {
        let mut fired = lock(&self.fired);
        *fired = true;
        self.cond.notify_all();
    }

    pub fn is_fired(&self) -> bool {
        *lock(&self.fired)
    }

    /// Sleep up to `timeout`, returning early if the signal fires.
    ///
    /// Returns `true` when the signal has fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let guard = lock(&self.fired);
        let (fired, _) = self
            .cond
            .wait_timeout_while(guard, timeout, |fired| !*fired)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *fired
    }
}
