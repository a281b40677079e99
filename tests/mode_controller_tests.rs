//! Mode switching through the public API, with a manual clock and in-memory
//! collaborators.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, NaiveDate, TimeZone};

use autotemp::backend::{DisplaySync, TemperatureSink};
use autotemp::core::animation::Transition;
use autotemp::core::mode::{ModeController, ModePreferences};
use autotemp::core::{Engine, EngineParams, Settings};
use autotemp::geo::{Coordinates, ResolveError, SolarSource, SunSchedule};
use autotemp::time_source::ManualTimeSource;

struct Prefs {
    auto: AtomicBool,
    manual: AtomicU32,
}

impl Prefs {
    fn new(auto: bool, manual: u32) -> Self {
        Self {
            auto: AtomicBool::new(auto),
            manual: AtomicU32::new(manual),
        }
    }
}

impl Settings for Prefs {
    fn coordinates(&self) -> Coordinates {
        Coordinates::new(48.85, 2.35)
    }
    fn set_coordinates(&self, _coords: Coordinates) {}
    fn day_temp(&self) -> u32 {
        6500
    }
    fn night_temp(&self) -> u32 {
        3500
    }
}

impl ModePreferences for Prefs {
    fn auto_enabled(&self) -> bool {
        self.auto.load(Ordering::SeqCst)
    }
    fn set_auto_enabled(&self, enabled: bool) {
        self.auto.store(enabled, Ordering::SeqCst);
    }
    fn manual_temp(&self) -> u32 {
        self.manual.load(Ordering::SeqCst)
    }
    fn set_manual_temp(&self, kelvin: u32) {
        self.manual.store(kelvin, Ordering::SeqCst);
    }
}

/// Always answers with the built-in schedule.
struct DefaultSolar;

impl SolarSource for DefaultSolar {
    fn resolve_location(&self) -> Result<Coordinates, ResolveError> {
        Err(ResolveError::Network("offline".into()))
    }

    fn fetch_schedule(
        &self,
        _coords: Coordinates,
        today: NaiveDate,
    ) -> Result<SunSchedule, ResolveError> {
        Ok(SunSchedule::default_for(today))
    }
}

#[derive(Default)]
struct Recorder {
    applied: Mutex<Vec<u32>>,
}

impl Recorder {
    fn applied(&self) -> Vec<u32> {
        self.applied.lock().unwrap().clone()
    }

    fn last(&self) -> Option<u32> {
        self.applied.lock().unwrap().last().copied()
    }
}

impl TemperatureSink for Recorder {
    fn apply_temperature(&self, kelvin: u32) {
        self.applied.lock().unwrap().push(kelvin);
    }
}

impl DisplaySync for Recorder {
    fn sync_displayed_temperature(&self, _kelvin: u32) {}
}

struct Setup {
    prefs: Arc<Prefs>,
    recorder: Arc<Recorder>,
    controller: ModeController,
}

impl Drop for Setup {
    fn drop(&mut self) {
        self.controller.cancel_fade();
        self.controller.engine().shutdown();
    }
}

fn noon() -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
}

fn setup(auto: bool, manual: u32, frame_interval: Duration) -> Setup {
    let prefs = Arc::new(Prefs::new(auto, manual));
    let recorder = Arc::new(Recorder::default());

    let engine = Engine::new(EngineParams {
        settings: prefs.clone(),
        solar: Arc::new(DefaultSolar),
        output: recorder.clone(),
        display: recorder.clone(),
        clock: Arc::new(ManualTimeSource::new(noon())),
        tick_interval: Duration::from_millis(5),
        frame_interval,
    });

    Setup {
        controller: ModeController::new(engine, prefs.clone()),
        prefs,
        recorder,
    }
}

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

#[test]
fn test_restore_manual_mode() {
    let s = setup(false, 4200, Duration::from_millis(1));
    s.controller.restore();

    assert!(!s.controller.is_auto());
    assert_eq!(s.recorder.applied(), vec![4200]);
    assert_eq!(s.controller.engine().current_temperature(), 4200);
}

#[test]
fn test_restore_automatic_mode() {
    let s = setup(true, 4200, Duration::from_millis(1));
    s.controller.restore();

    assert!(s.controller.is_auto());
    assert!(wait_until(|| s.recorder.last() == Some(6500)));
}

#[test]
fn test_set_manual_leaves_automatic_mode() {
    let s = setup(true, 6500, Duration::from_millis(1));
    s.controller.restore();
    assert!(wait_until(|| s.recorder.last() == Some(6500)));

    s.controller.set_manual(4000);

    assert!(!s.controller.is_auto());
    assert!(!s.prefs.auto_enabled());
    assert_eq!(s.prefs.manual_temp(), 4000);
    assert_eq!(s.recorder.last(), Some(4000));

    // The stopped scheduler never writes again
    thread::sleep(Duration::from_millis(40));
    assert_eq!(s.recorder.last(), Some(4000));
}

#[test]
fn test_disabling_auto_fades_to_manual_temperature() {
    let s = setup(true, 3000, Duration::from_millis(1));
    s.controller.restore();
    assert!(wait_until(|| s.recorder.last() == Some(6500)));
    let before = s.recorder.applied().len();

    s.controller.set_auto(false);
    assert!(!s.prefs.auto_enabled());
    assert!(wait_until(|| s.recorder.last() == Some(3000)));

    let fade = s.recorder.applied()[before..].to_vec();
    assert!(fade.len() > 1, "expected an animation, got {fade:?}");
    assert!(fade.windows(2).all(|w| w[0] >= w[1]), "{fade:?}");
}

#[test]
fn test_enabling_auto_animates_from_current_value() {
    let s = setup(false, 3000, Duration::from_millis(1));
    s.controller.restore();

    s.controller.set_auto(true);
    assert!(s.prefs.auto_enabled());
    assert!(wait_until(|| s.recorder.last() == Some(6500)));

    let applied = s.recorder.applied();
    assert_eq!(applied[0], 3000);
    assert!(
        applied.iter().any(|&k| k > 3000 && k < 6500),
        "expected intermediate frames: {applied:?}"
    );
}

#[test]
fn test_set_auto_to_current_mode_is_noop() {
    let s = setup(false, 5000, Duration::from_millis(1));
    s.controller.restore();

    s.controller.set_auto(false);
    thread::sleep(Duration::from_millis(20));
    assert_eq!(s.recorder.applied(), vec![5000]);
}

#[test]
fn test_manual_write_cancels_fade() {
    let s = setup(true, 2000, Duration::from_millis(20));
    s.controller.restore();
    assert!(wait_until(|| s.recorder.last() == Some(6500)));

    // 50 frames at 20ms: still running when the manual write arrives
    s.controller.set_auto(false);
    thread::sleep(Duration::from_millis(60));
    s.controller.set_manual(5000);
    assert_eq!(s.recorder.last(), Some(5000));

    thread::sleep(Duration::from_millis(100));
    assert_eq!(s.recorder.last(), Some(5000));
    assert!(!s.recorder.applied().contains(&2000));
}

#[test]
fn test_toggle_auto_flips_mode() {
    let s = setup(true, 4500, Duration::from_millis(1));
    s.controller.restore();

    assert!(!s.controller.toggle_auto());
    assert!(!s.prefs.auto_enabled());
    assert!(wait_until(|| s.recorder.last() == Some(4500)));

    assert!(s.controller.toggle_auto());
    assert!(s.prefs.auto_enabled());
    assert!(wait_until(|| s.recorder.last() == Some(6500)));
}

#[test]
fn test_fade_starts_from_last_scheduler_frame() {
    let s = setup(false, 3000, Duration::from_millis(10));
    s.controller.restore();

    // Leave automatic mode while its opening animation is still running
    s.controller.set_auto(true);
    thread::sleep(Duration::from_millis(60));
    s.controller.set_auto(false);
    assert!(wait_until(|| s.recorder.last() == Some(3000)));

    let applied = s.recorder.applied();
    let fade_start = (2..applied.len()).find(|&i| {
        applied[..i].windows(2).all(|w| w[0] <= w[1])
            && applied[i..] == Transition::new(applied[i - 1], 3000).values()[..]
    });
    assert!(fade_start.is_some(), "{applied:?}");
}

#[test]
fn test_concurrent_mode_changes_leave_one_owner() {
    let s = setup(false, 4000, Duration::from_millis(1));
    s.controller.restore();

    for round in 0..20u32 {
        let kelvin = 4100 + round * 10;
        s.controller.set_manual(4000);

        thread::scope(|scope| {
            scope.spawn(|| s.controller.set_auto(true));
            scope.spawn(|| s.controller.set_manual(kelvin));
        });

        if s.controller.is_auto() {
            assert!(s.prefs.auto_enabled(), "round {round}");
        } else {
            assert!(!s.prefs.auto_enabled(), "round {round}");
            thread::sleep(Duration::from_millis(15));
            assert_eq!(s.recorder.last(), Some(kelvin), "round {round}");
        }
    }
}
