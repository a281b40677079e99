//! The solar scheduler.
//!
//! [`Engine`] owns automatic mode: while running, one background thread keeps
//! the display's color temperature in step with the sun. It is a cheap,
//! cloneable handle; every caller (signal handler, mode controller, CLI) shares
//! the same state through it.
//!
//! Lifecycle:
//!
//! - [`Engine::start`] is idempotent. It spawns the scheduler thread with a
//!   fresh [`StopSignal`] and returns without waiting on the network.
//! - [`Engine::stop`] is idempotent. It fires the signal and returns; the
//!   temperature last applied stays in effect.
//! - [`Engine::shutdown`] stops and joins.
//!
//! Lock order is lifecycle, then the output gate.
//!
//! Every write to the output goes through a single gate. A scheduler write
//! first checks its own stop signal under that gate, and stopping fires the
//! signal under the same gate, so once `stop()` returns the stopped timeline
//! can never write again. Manual writes take the gate too, which keeps
//! automatic and manual writes from interleaving.

pub mod animation;
pub mod interpolation;
pub mod mode;
pub mod stop;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::Datelike;

use crate::backend::{DisplaySync, TemperatureSink};
use crate::common::constants::{ANIMATION_FRAME_INTERVAL, DEFAULT_DAY_TEMP};
use crate::common::utils::lock;
use crate::geo::{Coordinates, SolarSource, SunSchedule};
use crate::time_source::TimeSource;

use animation::{AnimationOutcome, Transition};
use interpolation::interpolate_temperature;
pub use stop::StopSignal;

/// Preferences and coordinates the scheduler reads and writes.
pub trait Settings: Send + Sync {
    fn coordinates(&self) -> Coordinates;

    /// Persist freshly detected coordinates.
    fn set_coordinates(&self, coords: Coordinates);

    fn day_temp(&self) -> u32;

    fn night_temp(&self) -> u32;
}

/// Everything an [`Engine`] needs.
pub struct EngineParams {
    pub settings: Arc<dyn Settings>,
    pub solar: Arc<dyn SolarSource>,
    pub output: Arc<dyn TemperatureSink>,
    pub display: Arc<dyn DisplaySync>,
    pub clock: Arc<dyn TimeSource>,
    /// Time between steady-state ticks.
    pub tick_interval: Duration,
    /// Time between animation frames.
    pub frame_interval: Duration,
}

impl EngineParams {
    /// Parameters with the production frame interval and the given tick.
    pub fn new(
        settings: Arc<dyn Settings>,
        solar: Arc<dyn SolarSource>,
        output: Arc<dyn TemperatureSink>,
        display: Arc<dyn DisplaySync>,
        clock: Arc<dyn TimeSource>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            settings,
            solar,
            output,
            display,
            clock,
            tick_interval,
            frame_interval: ANIMATION_FRAME_INTERVAL,
        }
    }
}

/// A schedule fetched from the network, tagged with the day-of-year it is for.
#[derive(Debug, Clone, Copy)]
struct CachedSchedule {
    schedule: SunSchedule,
    day_of_year: u32,
}

#[derive(Default)]
struct Lifecycle {
    // Present exactly while running.
    stop: Option<Arc<StopSignal>>,
    handles: Vec<JoinHandle<()>>,
}

struct Shared {
    settings: Arc<dyn Settings>,
    solar: Arc<dyn SolarSource>,
    output: Arc<dyn TemperatureSink>,
    display: Arc<dyn DisplaySync>,
    clock: Arc<dyn TimeSource>,
    tick_interval: Duration,
    frame_interval: Duration,

    lifecycle: Mutex<Lifecycle>,
    output_gate: Mutex<()>,
    current: AtomicU32,
    cache: Mutex<Option<CachedSchedule>>,
    active_workers: AtomicUsize,
}

#[derive(Clone)]
pub struct Engine {
    shared: Arc<Shared>,
}

impl Engine {
    pub fn new(params: EngineParams) -> Self {
        Self {
            shared: Arc::new(Shared {
                settings: params.settings,
                solar: params.solar,
                output: params.output,
                display: params.display,
                clock: params.clock,
                tick_interval: params.tick_interval,
                frame_interval: params.frame_interval,
                lifecycle: Mutex::new(Lifecycle::default()),
                output_gate: Mutex::new(()),
                current: AtomicU32::new(DEFAULT_DAY_TEMP),
                cache: Mutex::new(None),
                active_workers: AtomicUsize::new(0),
            }),
        }
    }

    /// Enter automatic mode.
    ///
    /// With `animate_from`, the first value is faded in from that temperature
    /// instead of being applied as a hard cut. Returns `true` if this call
    /// started the scheduler, `false` if it was already running or the thread
    /// could not be spawned.
    pub fn start(&self, animate_from: Option<u32>) -> bool {
        let mut lifecycle = lock(&self.shared.lifecycle);
        if lifecycle.stop.is_some() {
            log_debug!("Scheduler already running");
            return false;
        }
        lifecycle.handles.retain(|handle| !handle.is_finished());

        let stop = Arc::new(StopSignal::new());
        let slot = WorkerSlot::claim(self.shared.clone());
        let timeline = Timeline::new(self.shared.clone(), stop.clone());

        let spawned = std::thread::Builder::new()
            .name("autotemp-scheduler".into())
            .spawn(move || {
                let _slot = slot;
                timeline.run(animate_from);
            });

        match spawned {
            Ok(handle) => {
                lifecycle.stop = Some(stop);
                lifecycle.handles.push(handle);
                true
            }
            Err(e) => {
                log_error!("Failed to start the scheduler thread: {e}");
                false
            }
        }
    }

    /// Leave automatic mode without touching the applied temperature.
    pub fn stop(&self) {
        // Fired under the lifecycle lock so a concurrent start cannot overlap
        // a timeline that can still write.
        let mut lifecycle = lock(&self.shared.lifecycle);
        if let Some(stop) = lifecycle.stop.take() {
            self.cancel_writer(&stop);
        }
    }

    /// Stop and wait for every scheduler thread to exit.
    pub fn shutdown(&self) {
        self.stop();
        let handles = std::mem::take(&mut lock(&self.shared.lifecycle).handles);
        for handle in handles {
            if handle.join().is_err() {
                log_warning!("Scheduler thread panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        lock(&self.shared.lifecycle).stop.is_some()
    }

    /// The temperature most recently written to the output.
    pub fn current_temperature(&self) -> u32 {
        self.shared.current.load(Ordering::SeqCst)
    }

    /// Number of scheduler threads still alive, including stopped ones that
    /// have not finished unwinding yet.
    pub fn active_workers(&self) -> usize {
        self.shared.active_workers.load(Ordering::SeqCst)
    }

    pub fn frame_interval(&self) -> Duration {
        self.shared.frame_interval
    }

    /// The network schedule cached for today, if any.
    pub fn cached_schedule(&self) -> Option<SunSchedule> {
        let today = self.shared.clock.now().ordinal();
        let cached = *lock(&self.shared.cache);
        cached
            .filter(|cached| cached.day_of_year == today)
            .map(|cached| cached.schedule)
    }

    /// Write a manual value. Callers are expected to have stopped the
    /// scheduler first.
    pub fn apply_manual(&self, kelvin: u32) {
        let _gate = lock(&self.shared.output_gate);
        self.shared.write(kelvin);
    }

    /// Write `kelvin` unless `stop` has fired. Returns whether it was written.
    pub fn publish_unless_stopped(&self, stop: &StopSignal, kelvin: u32) -> bool {
        self.shared.publish(stop, kelvin)
    }

    /// Fire `signal` under the output gate, so no write guarded by it can land
    /// after this returns.
    pub fn cancel_writer(&self, signal: &StopSignal) {
        let _gate = lock(&self.shared.output_gate);
        signal.fire();
    }
}

impl Shared {
    fn publish(&self, stop: &StopSignal, kelvin: u32) -> bool {
        let _gate = lock(&self.output_gate);
        if stop.is_fired() {
            return false;
        }
        self.write(kelvin);
        true
    }

    // Caller holds the output gate.
    fn write(&self, kelvin: u32) {
        self.output.apply_temperature(kelvin);
        self.display.sync_displayed_temperature(kelvin);
        self.current.store(kelvin, Ordering::SeqCst);
    }
}

/// Counts a scheduler thread as alive until dropped.
struct WorkerSlot(Arc<Shared>);

impl WorkerSlot {
    fn claim(shared: Arc<Shared>) -> Self {
        shared.active_workers.fetch_add(1, Ordering::SeqCst);
        Self(shared)
    }
}

impl Drop for WorkerSlot {
    fn drop(&mut self) {
        self.0.active_workers.fetch_sub(1, Ordering::SeqCst);
    }
}

/// One running period of the scheduler, from start to stop.
struct Timeline {
    shared: Arc<Shared>,
    stop: Arc<StopSignal>,
    schedule: SunSchedule,
    last_applied: Option<u32>,
    last_day: u32,
}

impl Timeline {
    fn new(shared: Arc<Shared>, stop: Arc<StopSignal>) -> Self {
        let now = shared.clock.now();
        Self {
            schedule: SunSchedule::default_for(now.date_naive()),
            last_day: now.ordinal(),
            shared,
            stop,
            last_applied: None,
        }
    }

    fn run(mut self, animate_from: Option<u32>) {
        self.apply_immediately(animate_from);

        if !self.stop.is_fired() {
            self.refresh_location();
        }
        if !self.stop.is_fired() {
            self.refresh_schedule();
            self.apply_correction();
        }

        while !self.stop.wait_timeout(self.shared.tick_interval) {
            self.tick();
        }

        log_decorated!("Automatic mode stopped");
    }

    /// First value, from the cached schedule or the default. No network.
    fn apply_immediately(&mut self, animate_from: Option<u32>) {
        let now = self.shared.clock.now();
        self.last_day = now.ordinal();

        let cached = *lock(&self.shared.cache);
        self.schedule = match cached {
            Some(cached) if cached.day_of_year == now.ordinal() => cached.schedule,
            _ => SunSchedule::default_for(now.date_naive()),
        };

        let target = self.target_at(now);
        match animate_from {
            Some(from) if from != target => {
                log_block_start!("Automatic mode: {target}K (animating from {from}K)");
                let outcome = Transition::new(from, target)
                    .with_frame_interval(self.shared.frame_interval)
                    .run(&self.stop, |kelvin| self.shared.publish(&self.stop, kelvin));
                self.last_applied = match outcome {
                    AnimationOutcome::Completed => Some(target),
                    AnimationOutcome::Cancelled { last } => last,
                };
            }
            _ => {
                log_block_start!("Automatic mode: {target}K");
                self.publish(target);
            }
        }
    }

    fn refresh_location(&self) {
        if !self.shared.settings.coordinates().is_unset() {
            return;
        }

        match self.shared.solar.resolve_location() {
            Ok(coords) => {
                log_decorated!("Detected location: {coords}");
                self.shared.settings.set_coordinates(coords);
            }
            Err(e) => {
                log_warning!("Location detection failed: {e}");
                log_indented!("Using the default schedule until a location is known");
            }
        }
    }

    /// Fetch today's schedule. Returns whether a fresh schedule was installed.
    fn refresh_schedule(&mut self) -> bool {
        let coords = self.shared.settings.coordinates();
        if coords.is_unset() {
            return false;
        }

        let now = self.shared.clock.now();
        match self.shared.solar.fetch_schedule(coords, now.date_naive()) {
            Ok(schedule) => {
                self.schedule = schedule;
                *lock(&self.shared.cache) = Some(CachedSchedule {
                    schedule,
                    day_of_year: now.ordinal(),
                });
                log_decorated!("Sun schedule for {}", now.format("%Y-%m-%d"));
                log_indented!("{}", schedule.describe());
                true
            }
            Err(e) => {
                log_warning!("Sun schedule fetch failed: {e}");
                false
            }
        }
    }

    fn apply_correction(&mut self) {
        let target = self.target_at(self.shared.clock.now());
        if Some(target) != self.last_applied {
            log_decorated!("Automatic mode: {target}K (corrected after refresh)");
            self.publish(target);
        }
    }

    fn tick(&mut self) {
        let now = self.shared.clock.now();

        if now.ordinal() != self.last_day {
            self.last_day = now.ordinal();
            log_debug!("New day: {}", now.format("%Y-%m-%d"));

            self.refresh_location();
            if !self.refresh_schedule() {
                // Keep yesterday's times of day, but on today's date.
                self.schedule = self.schedule.rebased_to(now.date_naive());
                log_debug!("Reusing previous schedule: {}", self.schedule.describe());
            }
        }

        let target = self.target_at(now);
        if Some(target) != self.last_applied {
            log_decorated!("Automatic mode: {target}K");
            self.publish(target);
        } else {
            log_debug!("Tick at {}: {target}K unchanged", now.format("%H:%M:%S"));
        }
    }

    fn target_at(&self, now: chrono::DateTime<chrono::Local>) -> u32 {
        interpolate_temperature(
            now,
            &self.schedule,
            self.shared.settings.day_temp(),
            self.shared.settings.night_temp(),
        )
    }

    fn publish(&mut self, kelvin: u32) {
        if self.shared.publish(&self.stop, kelvin) {
            self.last_applied = Some(kelvin);
        }
    }
}
