//! Latest-wins delivery to a backend.

use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use anyhow::{Context, Result};

use super::{ColorTemperatureBackend, TemperatureSink};
use crate::common::utils::lock;

/// A single-slot mailbox. Posting replaces any value not yet received.
pub struct LatestMailbox<T> {
    state: Mutex<MailboxState<T>>,
    cond: Condvar,
}

struct MailboxState<T> {
    pending: Option<T>,
    closed: bool,
}

impl<T> LatestMailbox<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MailboxState {
                pending: None,
                closed: false,
            }),
            cond: Condvar::new(),
        }
    }

    /// Leave `value` for the receiver, dropping whatever was waiting.
    ///
    /// Returns `false` once the mailbox is closed; the value is discarded.
    pub fn post(&self, value: T) -> bool {
        let mut state = lock(&self.state);
        if state.closed {
            return false;
        }
        state.pending = Some(value);
        self.cond.notify_one();
        true
    }

    /// Block until a value is available.
    ///
    /// After [`close`](Self::close), a value still pending is delivered once,
    /// then `None` is returned.
    pub fn recv(&self) -> Option<T> {
        let state = lock(&self.state);
        let mut state = self
            .cond
            .wait_while(state, |state| state.pending.is_none() && !state.closed)
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.pending.take()
    }

    pub fn close(&self) {
        let mut state = lock(&self.state);
        state.closed = true;
        self.cond.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }
}

impl<T> Default for LatestMailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// [`TemperatureSink`] that feeds a backend from a worker thread.
pub struct CoalescingSink {
    mailbox: Arc<LatestMailbox<u32>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl CoalescingSink {
    /// Spawn the worker that owns `backend`.
    pub fn start(mut backend: Box<dyn ColorTemperatureBackend>) -> Result<Self> {
        let mailbox = Arc::new(LatestMailbox::new());
        let inbox = mailbox.clone();

        let worker = std::thread::Builder::new()
            .name("autotemp-output".into())
            .spawn(move || {
                while let Some(kelvin) = inbox.recv() {
                    if let Err(e) = backend.apply_temperature(kelvin) {
                        log_warning!(
                            "{} backend failed to apply {kelvin}K: {e:#}",
                            backend.backend_name()
                        );
                    }
                }
                log_debug!("{} backend worker finished", backend.backend_name());
            })
            .context("Failed to spawn output worker thread")?;

        Ok(Self {
            mailbox,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Deliver the last pending value, then stop the worker. Idempotent.
    pub fn close(&self) {
        self.mailbox.close();
        let worker = lock(&self.worker).take();
        if let Some(worker) = worker
            && worker.join().is_err()
        {
            log_warning!("Output worker panicked");
        }
    }
}

impl TemperatureSink for CoalescingSink {
    fn apply_temperature(&self, kelvin: u32) {
        if !self.mailbox.post(kelvin) {
            log_debug!("Output closed, dropping {kelvin}K");
        }
    }
}

impl Drop for CoalescingSink {
    fn drop(&mut self) {
        self.close();
    }
}
