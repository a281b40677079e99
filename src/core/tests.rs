use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};

use super::*;
use crate::backend::{DisplaySync, TemperatureSink};
use crate::geo::{Coordinates, ResolveError, SolarSource, SunSchedule};
use crate::time_source::ManualTimeSource;

// ═══ Fakes ═══

struct FakeSettings {
    coords: Mutex<Coordinates>,
    saved: Mutex<Vec<Coordinates>>,
}

impl FakeSettings {
    fn new(coords: Coordinates) -> Self {
        Self {
            coords: Mutex::new(coords),
            saved: Mutex::new(Vec::new()),
        }
    }
}

impl Settings for FakeSettings {
    fn coordinates(&self) -> Coordinates {
        *self.coords.lock().unwrap()
    }

    fn set_coordinates(&self, coords: Coordinates) {
        *self.coords.lock().unwrap() = coords;
        self.saved.lock().unwrap().push(coords);
    }

    fn day_temp(&self) -> u32 {
        6500
    }

    fn night_temp(&self) -> u32 {
        3500
    }
}

/// Location and schedule answers are configurable; fetches can be held back.
struct FakeSolar {
    location: Mutex<Result<Coordinates, ResolveError>>,
    // (twilight begin, sunrise, sunset, twilight end) as (h, m)
    schedule: Mutex<Option<[(u32, u32); 4]>>,
    fetch_gate: Mutex<()>,
    location_calls: AtomicUsize,
    fetches: Mutex<Vec<(Coordinates, NaiveDate)>>,
}

impl FakeSolar {
    fn new() -> Self {
        Self {
            location: Mutex::new(Err(ResolveError::Network("offline".into()))),
            schedule: Mutex::new(None),
            fetch_gate: Mutex::new(()),
            location_calls: AtomicUsize::new(0),
            fetches: Mutex::new(Vec::new()),
        }
    }

    fn with_location(self, coords: Coordinates) -> Self {
        *self.location.lock().unwrap() = Ok(coords);
        self
    }

    fn with_schedule(self, times: [(u32, u32); 4]) -> Self {
        *self.schedule.lock().unwrap() = Some(times);
        self
    }

    fn fetch_count(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }
}

impl SolarSource for FakeSolar {
    fn resolve_location(&self) -> Result<Coordinates, ResolveError> {
        self.location_calls.fetch_add(1, Ordering::SeqCst);
        self.location.lock().unwrap().clone()
    }

    fn fetch_schedule(
        &self,
        coords: Coordinates,
        today: NaiveDate,
    ) -> Result<SunSchedule, ResolveError> {
        let _gate = self.fetch_gate.lock().unwrap();
        self.fetches.lock().unwrap().push((coords, today));

        let times = *self.schedule.lock().unwrap();
        let [begin, rise, set, end] =
            times.ok_or_else(|| ResolveError::Network("HTTP 503".into()))?;
        let t = |(h, m): (u32, u32)| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        Ok(SunSchedule::from_times(today, t(begin), t(rise), t(set), t(end)))
    }
}

#[derive(Default)]
struct Recorder {
    applied: Mutex<Vec<u32>>,
    displayed: Mutex<Vec<u32>>,
}

impl Recorder {
    fn applied(&self) -> Vec<u32> {
        self.applied.lock().unwrap().clone()
    }
}

impl TemperatureSink for Recorder {
    fn apply_temperature(&self, kelvin: u32) {
        self.applied.lock().unwrap().push(kelvin);
    }
}

impl DisplaySync for Recorder {
    fn sync_displayed_temperature(&self, kelvin: u32) {
        self.displayed.lock().unwrap().push(kelvin);
    }
}

struct Harness {
    settings: Arc<FakeSettings>,
    solar: Arc<FakeSolar>,
    recorder: Arc<Recorder>,
    clock: Arc<ManualTimeSource>,
    engine: Engine,
}

impl Harness {
    fn new(now: DateTime<Local>, coords: Coordinates, solar: FakeSolar) -> Self {
        let settings = Arc::new(FakeSettings::new(coords));
        let solar = Arc::new(solar);
        let recorder = Arc::new(Recorder::default());
        let clock = Arc::new(ManualTimeSource::new(now));

        let engine = Engine::new(EngineParams {
            settings: settings.clone(),
            solar: solar.clone(),
            output: recorder.clone(),
            display: recorder.clone(),
            clock: clock.clone(),
            tick_interval: Duration::from_millis(5),
            frame_interval: Duration::from_millis(1),
        });

        Self {
            settings,
            solar,
            recorder,
            clock,
            engine,
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.engine.shutdown();
    }
}

fn local(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2025, 1, day, hour, minute, 0)
        .earliest()
        .unwrap()
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

const NEW_YORK: Coordinates = Coordinates {
    latitude: 40.71,
    longitude: -74.01,
};

// ═══ Lifecycle ═══

#[test]
fn test_start_applies_default_schedule_immediately() {
    let h = Harness::new(local(15, 3, 0), Coordinates::UNSET, FakeSolar::new());

    assert!(h.engine.start(None));
    assert!(wait_until(|| !h.recorder.applied().is_empty()));

    assert_eq!(h.recorder.applied()[0], 3500);
    assert!(wait_until(|| h.engine.current_temperature() == 3500));
    assert_eq!(*h.recorder.displayed.lock().unwrap(), vec![3500]);
}

#[test]
fn test_start_twice_runs_one_worker() {
    let h = Harness::new(local(15, 12, 0), Coordinates::UNSET, FakeSolar::new());

    assert!(h.engine.start(None));
    assert!(!h.engine.start(None));
    assert!(h.engine.is_running());
    assert_eq!(h.engine.active_workers(), 1);

    h.engine.shutdown();
    assert!(!h.engine.is_running());
    assert_eq!(h.engine.active_workers(), 0);
}

#[test]
fn test_stop_before_start_is_noop() {
    let h = Harness::new(local(15, 12, 0), Coordinates::UNSET, FakeSolar::new());

    h.engine.stop();
    h.engine.stop();

    assert!(!h.engine.is_running());
    assert!(h.recorder.applied().is_empty());
    assert_eq!(h.engine.active_workers(), 0);
}

#[test]
fn test_stop_keeps_last_temperature() {
    let h = Harness::new(local(15, 3, 0), Coordinates::UNSET, FakeSolar::new());

    h.engine.start(None);
    assert!(wait_until(|| h.recorder.applied() == vec![3500]));

    h.engine.stop();
    assert!(!h.engine.is_running());

    // Crossing into the day after stopping must not produce a write
    h.clock.set(local(15, 12, 0));
    thread::sleep(Duration::from_millis(50));

    assert_eq!(h.engine.current_temperature(), 3500);
    assert_eq!(h.recorder.applied(), vec![3500]);
}

#[test]
fn test_restart_after_stop_runs_again() {
    let h = Harness::new(local(15, 3, 0), Coordinates::UNSET, FakeSolar::new());

    h.engine.start(None);
    assert!(wait_until(|| !h.recorder.applied().is_empty()));
    h.engine.stop();

    h.clock.set(local(15, 12, 0));
    assert!(h.engine.start(None));
    assert!(wait_until(|| h.recorder.applied().last() == Some(&6500)));
    assert!(h.engine.is_running());
}

#[test]
fn test_start_does_not_wait_for_network() {
    let solar = FakeSolar::new().with_schedule([(6, 35), (7, 2), (19, 12), (19, 39)]);
    let h = Harness::new(local(15, 12, 0), NEW_YORK, solar);

    let held = h.solar.fetch_gate.lock().unwrap();
    h.engine.start(None);
    assert!(wait_until(|| h.recorder.applied() == vec![6500]));
    drop(held);

    assert!(wait_until(|| h.solar.fetch_count() == 1));
}

// ═══ Resolution ═══

#[test]
fn test_fetched_schedule_corrects_immediate_value() {
    // 06:40 is daytime on the default schedule but still dawn on the real one
    let solar = FakeSolar::new().with_schedule([(6, 35), (7, 2), (19, 12), (19, 39)]);
    let h = Harness::new(local(15, 6, 40), NEW_YORK, solar);

    h.engine.start(None);
    assert!(wait_until(|| h.recorder.applied().len() >= 2));

    let applied = h.recorder.applied();
    assert_eq!(applied[0], 6500);
    assert!(applied[1] < 6500 && applied[1] >= 3500, "{applied:?}");
    assert_eq!(h.engine.current_temperature(), applied[1]);

    let cached = h.engine.cached_schedule().unwrap();
    assert_eq!(cached.sunrise.time(), NaiveTime::from_hms_opt(7, 2, 0).unwrap());
    assert_eq!(h.settings.saved.lock().unwrap().len(), 0);
}

#[test]
fn test_unchanged_value_after_fetch_is_not_reapplied() {
    let solar = FakeSolar::new().with_schedule([(6, 35), (7, 2), (19, 12), (19, 39)]);
    let h = Harness::new(local(15, 12, 0), NEW_YORK, solar);

    h.engine.start(None);
    assert!(wait_until(|| h.solar.fetch_count() == 1));
    thread::sleep(Duration::from_millis(30));

    assert_eq!(h.recorder.applied(), vec![6500]);
}

#[test]
fn test_detected_location_is_persisted_and_used() {
    let paris = Coordinates::new(48.86, 2.35);
    let solar = FakeSolar::new()
        .with_location(paris)
        .with_schedule([(7, 50), (8, 25), (17, 10), (17, 45)]);
    let h = Harness::new(local(15, 12, 0), Coordinates::UNSET, solar);

    h.engine.start(None);
    assert!(wait_until(|| h.solar.fetch_count() == 1));

    assert_eq!(*h.settings.saved.lock().unwrap(), vec![paris]);
    assert_eq!(h.solar.fetches.lock().unwrap()[0].0, paris);
}

#[test]
fn test_location_failure_keeps_default_schedule() {
    let h = Harness::new(local(15, 12, 0), Coordinates::UNSET, FakeSolar::new());

    h.engine.start(None);
    assert!(wait_until(|| h.solar.location_calls.load(Ordering::SeqCst) == 1));
    thread::sleep(Duration::from_millis(30));

    assert_eq!(h.solar.fetch_count(), 0);
    assert!(h.settings.saved.lock().unwrap().is_empty());
    assert_eq!(h.recorder.applied(), vec![6500]);
    assert!(h.engine.is_running());
    assert!(h.engine.cached_schedule().is_none());
}

#[test]
fn test_known_coordinates_skip_detection() {
    let solar = FakeSolar::new().with_schedule([(6, 35), (7, 2), (19, 12), (19, 39)]);
    let h = Harness::new(local(15, 12, 0), NEW_YORK, solar);

    h.engine.start(None);
    assert!(wait_until(|| h.solar.fetch_count() == 1));
    assert_eq!(h.solar.location_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_restart_same_day_uses_cached_schedule() {
    let solar = FakeSolar::new().with_schedule([(6, 35), (7, 2), (19, 12), (19, 39)]);
    let h = Harness::new(local(15, 6, 40), NEW_YORK, solar);

    h.engine.start(None);
    assert!(wait_until(|| h.engine.cached_schedule().is_some()));
    h.engine.shutdown();

    *h.solar.schedule.lock().unwrap() = None;
    let before = h.recorder.applied().len();

    h.engine.start(None);
    assert!(wait_until(|| h.recorder.applied().len() > before));

    // Still dawn at 06:40 on the cached schedule; the default one says day
    let first = h.recorder.applied()[before];
    assert!((3500..6500).contains(&first), "{first}");
    assert!(wait_until(|| h.solar.fetch_count() == 2));
    assert!(h.engine.cached_schedule().is_some());
}

#[test]
fn test_restart_next_day_ignores_stale_cache() {
    let solar = FakeSolar::new().with_schedule([(6, 35), (7, 2), (19, 12), (19, 39)]);
    let h = Harness::new(local(15, 6, 40), NEW_YORK, solar);

    h.engine.start(None);
    assert!(wait_until(|| h.engine.cached_schedule().is_some()));
    h.engine.shutdown();

    *h.solar.schedule.lock().unwrap() = None;
    h.clock.set(local(16, 6, 40));
    let before = h.recorder.applied().len();

    h.engine.start(None);
    assert!(wait_until(|| h.recorder.applied().len() > before));

    assert_eq!(h.recorder.applied()[before], 6500);
    assert!(wait_until(|| h.solar.fetch_count() == 2));
    assert!(h.engine.cached_schedule().is_none());
}

// ═══ Steady state ═══

#[test]
fn test_ticks_follow_the_clock_without_repeats() {
    let h = Harness::new(local(15, 5, 0), Coordinates::UNSET, FakeSolar::new());

    h.engine.start(None);
    assert!(wait_until(|| h.recorder.applied() == vec![3500]));

    for minute in (30..=60).step_by(5) {
        h.clock.set(local(15, 5 + minute / 60, minute % 60));
        thread::sleep(Duration::from_millis(20));
    }
    assert!(wait_until(|| h.recorder.applied().last() == Some(&5000)));

    let applied = h.recorder.applied();
    assert!(applied.windows(2).all(|w| w[0] != w[1]), "{applied:?}");
    assert!(applied.windows(2).all(|w| w[0] < w[1]), "{applied:?}");
}

#[test]
fn test_new_day_refetches_schedule() {
    let solar = FakeSolar::new().with_schedule([(6, 35), (7, 2), (19, 12), (19, 39)]);
    let h = Harness::new(local(15, 23, 50), NEW_YORK, solar);

    h.engine.start(None);
    assert!(wait_until(|| h.solar.fetch_count() == 1));

    h.clock.set(local(16, 0, 10));
    assert!(wait_until(|| h.solar.fetch_count() == 2));

    let fetches = h.solar.fetches.lock().unwrap().clone();
    assert_eq!(fetches[0].1, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    assert_eq!(fetches[1].1, NaiveDate::from_ymd_opt(2025, 1, 16).unwrap());
    assert!(wait_until(|| h.engine.cached_schedule().is_some()));
}

#[test]
fn test_failed_refetch_moves_schedule_to_new_day() {
    let h = Harness::new(local(15, 23, 50), Coordinates::UNSET, FakeSolar::new());

    h.engine.start(None);
    assert!(wait_until(|| h.recorder.applied() == vec![3500]));

    // Noon the next day must be daytime, not "after yesterday's sunset"
    h.clock.set(local(16, 12, 0));
    assert!(wait_until(|| h.recorder.applied().last() == Some(&6500)));

    // Detection is retried on the new day while coordinates are unset
    assert!(h.solar.location_calls.load(Ordering::SeqCst) >= 2);
}

// ═══ Animation and output gate ═══

#[test]
fn test_start_animates_from_previous_value() {
    let h = Harness::new(local(15, 3, 0), Coordinates::UNSET, FakeSolar::new());

    h.engine.start(Some(6500));
    assert!(wait_until(|| h.recorder.applied().last() == Some(&3500)));

    let applied = h.recorder.applied();
    assert_eq!(applied, animation::Transition::new(6500, 3500).values());
}

#[test]
fn test_animation_skipped_when_already_on_target() {
    let h = Harness::new(local(15, 3, 0), Coordinates::UNSET, FakeSolar::new());

    h.engine.start(Some(3500));
    assert!(wait_until(|| !h.recorder.applied().is_empty()));
    thread::sleep(Duration::from_millis(20));

    assert_eq!(h.recorder.applied(), vec![3500]);
}

#[test]
fn test_no_writes_after_stop_mid_animation() {
    let settings = Arc::new(FakeSettings::new(Coordinates::UNSET));
    let recorder = Arc::new(Recorder::default());
    let engine = Engine::new(EngineParams {
        settings,
        solar: Arc::new(FakeSolar::new()),
        output: recorder.clone(),
        display: recorder.clone(),
        clock: Arc::new(ManualTimeSource::new(local(15, 3, 0))),
        tick_interval: Duration::from_millis(5),
        frame_interval: Duration::from_millis(10),
    });

    engine.start(Some(6500));
    assert!(wait_until(|| recorder.applied().len() >= 3));
    engine.stop();

    let at_stop = recorder.applied();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(recorder.applied(), at_stop);
    assert!(at_stop.len() < 50);
    assert_eq!(engine.current_temperature(), *at_stop.last().unwrap());

    engine.shutdown();
}

#[test]
fn test_manual_write_after_stop_is_last() {
    let h = Harness::new(local(15, 3, 0), Coordinates::UNSET, FakeSolar::new());

    h.engine.start(Some(6500));
    assert!(wait_until(|| !h.recorder.applied().is_empty()));
    h.engine.stop();
    h.engine.apply_manual(4200);

    thread::sleep(Duration::from_millis(50));
    assert_eq!(h.recorder.applied().last(), Some(&4200));
    assert_eq!(h.engine.current_temperature(), 4200);
}

#[test]
fn test_publish_respects_signal() {
    let h = Harness::new(local(15, 12, 0), Coordinates::UNSET, FakeSolar::new());
    let signal = StopSignal::new();

    assert!(h.engine.publish_unless_stopped(&signal, 4000));
    h.engine.cancel_writer(&signal);
    assert!(!h.engine.publish_unless_stopped(&signal, 4100));

    assert_eq!(h.recorder.applied(), vec![4000]);
}

#[test]
fn test_concurrent_stop_and_start_leave_no_stray_writer() {
    let h = Harness::new(local(15, 3, 0), Coordinates::UNSET, FakeSolar::new());

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..25 {
                    h.engine.start(Some(6500));
                    h.engine.stop();
                }
            });
        }
    });

    h.engine.stop();
    let at_stop = h.recorder.applied();
    thread::sleep(Duration::from_millis(50));

    assert!(!h.engine.is_running());
    assert_eq!(h.recorder.applied(), at_stop);
    assert!(wait_until(|| h.engine.active_workers() == 0));
}
