//! Manual override and automatic mode switching.
//!
//! [`ModeController`] is what interactive callers talk to (the signal handler
//! here, a tray menu or slider elsewhere). It enforces the one rule that keeps
//! output sane: at any instant either the scheduler or the user owns the
//! applied temperature, never both. A manual write always stops the scheduler
//! first; turning automatic mode back on always cancels any manual fade first.

use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use super::animation::Transition;
use super::{Engine, StopSignal};
use crate::common::utils::lock;

/// Persisted mode preferences.
pub trait ModePreferences: Send + Sync {
    fn auto_enabled(&self) -> bool;
    fn set_auto_enabled(&self, enabled: bool);
    fn manual_temp(&self) -> u32;
    fn set_manual_temp(&self, kelvin: u32);
}

struct ManualFade {
    stop: Arc<StopSignal>,
    handle: JoinHandle<()>,
}

pub struct ModeController {
    engine: Engine,
    prefs: Arc<dyn ModePreferences>,
    fade: Mutex<Option<ManualFade>>,
    // Held for the whole of each mode change.
    switching: Mutex<()>,
}

impl ModeController {
    pub fn new(engine: Engine, prefs: Arc<dyn ModePreferences>) -> Self {
        Self {
            engine,
            prefs,
            fade: Mutex::new(None),
            switching: Mutex::new(()),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn is_auto(&self) -> bool {
        self.engine.is_running()
    }

    /// Bring the display back to the persisted mode at startup.
    pub fn restore(&self) {
        let _switching = lock(&self.switching);
        if self.prefs.auto_enabled() {
            self.engine.start(None);
        } else {
            let kelvin = self.prefs.manual_temp();
            log_block_start!("Manual mode: {kelvin}K");
            self.engine.apply_manual(kelvin);
        }
    }

    /// Apply a manual temperature, leaving automatic mode if needed.
    pub fn set_manual(&self, kelvin: u32) {
        let _switching = lock(&self.switching);
        if self.engine.is_running() {
            self.engine.stop();
            self.prefs.set_auto_enabled(false);
        }
        self.cancel_fade();

        log_decorated!("Manual mode: {kelvin}K");
        self.engine.apply_manual(kelvin);
        self.prefs.set_manual_temp(kelvin);
    }

    /// Switch automatic mode on or off. Switching to the current mode is a no-op.
    pub fn set_auto(&self, enabled: bool) {
        let _switching = lock(&self.switching);
        self.switch_auto(enabled);
    }

    /// Flip automatic mode. Returns the new state.
    pub fn toggle_auto(&self) -> bool {
        let _switching = lock(&self.switching);
        let enabled = !self.engine.is_running();
        self.switch_auto(enabled);
        enabled
    }

    // Caller holds `switching`.
    fn switch_auto(&self, enabled: bool) {
        if enabled == self.engine.is_running() {
            return;
        }

        if enabled {
            self.cancel_fade();
            let from = self.engine.current_temperature();
            self.prefs.set_auto_enabled(true);
            self.engine.start(Some(from));
        } else {
            // Read after stop: the gate is closed to the scheduler by then
            self.engine.stop();
            let from = self.engine.current_temperature();
            self.prefs.set_auto_enabled(false);

            let to = self.prefs.manual_temp();
            log_block_start!("Manual mode: {to}K (animating from {from}K)");
            self.start_fade(from, to);
        }
    }

    /// Cancel the manual fade, if any, and wait for it to exit.
    pub fn cancel_fade(&self) {
        let fade = lock(&self.fade).take();
        if let Some(fade) = fade {
            self.engine.cancel_writer(&fade.stop);
            if fade.handle.join().is_err() {
                log_warning!("Manual fade thread panicked");
            }
        }
    }

    fn start_fade(&self, from: u32, to: u32) {
        self.cancel_fade();

        let stop = Arc::new(StopSignal::new());
        let engine = self.engine.clone();
        let signal = stop.clone();

        let spawned = std::thread::Builder::new()
            .name("autotemp-fade".into())
            .spawn(move || {
                Transition::new(from, to)
                    .with_frame_interval(engine.frame_interval())
                    .run(&signal, |kelvin| engine.publish_unless_stopped(&signal, kelvin));
            });

        match spawned {
            Ok(handle) => *lock(&self.fade) = Some(ManualFade { stop, handle }),
            Err(e) => {
                log_warning!("Could not animate to {to}K: {e}");
                self.engine.apply_manual(to);
            }
        }
    }
}

impl Drop for ModeController {
    fn drop(&mut self) {
        self.cancel_fade();
    }
}
