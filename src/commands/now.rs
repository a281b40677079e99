//! `autotemp now`: one resolution pass, printed.
//!
//! Resolves the location if none is stored yet, fetches today's schedule, and
//! prints what the daemon would apply right now. Freshly detected coordinates
//! are saved so the next daemon start skips detection.

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::color::{Rgb, kelvin_to_rgb};
use crate::config::ConfigStore;
use crate::core::Settings;
use crate::core::interpolation::interpolate_temperature;
use crate::geo::{Coordinates, NetworkSolarSource, ResolveError, SolarSource, SunSchedule};

/// Where the schedule in a [`NowReport`] came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleOrigin {
    Fetched,
    /// Built-in schedule, with the reason the fetch was skipped or failed.
    Default(String),
}

/// Everything `autotemp now` prints.
#[derive(Debug, Clone)]
pub struct NowReport {
    pub coordinates: Option<Coordinates>,
    pub detected: bool,
    pub schedule: SunSchedule,
    pub origin: ScheduleOrigin,
    pub target: u32,
    pub rgb: Rgb,
}

/// Handle the `now` command against the configured store and live services.
pub fn handle_now_command() -> Result<()> {
    let store = ConfigStore::open()?;
    let solar = NetworkSolarSource::new();

    let report = resolve_now(&store, &solar, Local::now());
    display_report(&report);
    Ok(())
}

/// Run one resolution pass at `now`.
///
/// Never fails: each step that cannot complete falls back the way the daemon
/// would, and the report says which fallback was taken.
pub fn resolve_now(
    settings: &dyn Settings,
    solar: &dyn SolarSource,
    now: DateTime<Local>,
) -> NowReport {
    let mut coords = settings.coordinates();
    let mut detected = false;

    if coords.is_unset() {
        log_block_start!("Detecting location...");
        match solar.resolve_location() {
            Ok(found) => {
                settings.set_coordinates(found);
                coords = found;
                detected = true;
            }
            Err(e) => log_warning!("Location detection failed: {e}"),
        }
    }

    let today = now.date_naive();
    let (schedule, origin) = if coords.is_unset() {
        (
            SunSchedule::default_for(today),
            ScheduleOrigin::Default("no location".into()),
        )
    } else {
        match solar.fetch_schedule(coords, today) {
            Ok(schedule) => (schedule, ScheduleOrigin::Fetched),
            Err(e) => (SunSchedule::default_for(today), fallback_reason(&e)),
        }
    };

    let target = interpolate_temperature(now, &schedule, settings.day_temp(), settings.night_temp());

    NowReport {
        coordinates: (!coords.is_unset()).then_some(coords),
        detected,
        schedule,
        origin,
        target,
        rgb: kelvin_to_rgb(target),
    }
}

fn fallback_reason(error: &ResolveError) -> ScheduleOrigin {
    log_warning!("Schedule fetch failed: {error}");
    ScheduleOrigin::Default(error.to_string())
}

fn display_report(report: &NowReport) {
    log_version!();

    match report.coordinates {
        Some(coords) if report.detected => log_block_start!("Location: {coords} (detected, saved)"),
        Some(coords) => log_block_start!("Location: {coords}"),
        None => log_block_start!("Location: unknown"),
    }

    match &report.origin {
        ScheduleOrigin::Fetched => log_block_start!("Today's schedule:"),
        ScheduleOrigin::Default(reason) => {
            log_block_start!("Default schedule ({reason}):");
        }
    }
    let schedule = &report.schedule;
    log_indented!("Civil twilight begins: {}", schedule.civil_twilight_begin.format("%H:%M:%S"));
    log_indented!("Sunrise:               {}", schedule.sunrise.format("%H:%M:%S"));
    log_indented!("Sunset:                {}", schedule.sunset.format("%H:%M:%S"));
    log_indented!("Civil twilight ends:   {}", schedule.civil_twilight_end.format("%H:%M:%S"));

    let (morning_start, morning_end) = schedule.morning_window();
    let (evening_start, evening_end) = schedule.evening_window();
    log_block_start!("Transitions:");
    log_indented!(
        "Morning: {} → {}",
        morning_start.format("%H:%M:%S"),
        morning_end.format("%H:%M:%S")
    );
    log_indented!(
        "Evening: {} → {}",
        evening_start.format("%H:%M:%S"),
        evening_end.format("%H:%M:%S")
    );

    log_block_start!("Target: {}K", report.target);
    log_indented!(
        "RGB: {:.3} {:.3} {:.3}",
        report.rgb.red,
        report.rgb.green,
        report.rgb.blue
    );
    log_end!();
}
