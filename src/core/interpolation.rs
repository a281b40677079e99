//! Time of day → target color temperature.
//!
//! The day is split by two ramps derived from the [`SunSchedule`]:
//!
//! ```text
//!  night   │ morning ramp │        day        │ evening ramp │  night
//!  ────────┼──────┬───────┼───────────────────┼──────┬───────┼────────
//!     twilight  sunrise   2·sunrise−twilight  2·sunset−twilight  sunset  twilight
//! ```
//!
//! Each ramp is mirrored around its sun event, so sunrise and sunset sit
//! exactly halfway through the blend. The ramp edges are therefore not the
//! civil twilight times on both sides, only on the outer side.

use chrono::{DateTime, Local};

use crate::common::constants::TEMPERATURE_STEP;
use crate::geo::SunSchedule;

/// Target temperature at `now`.
///
/// Outside both ramps the exact `night_temp` or `day_temp` is returned. Inside
/// a ramp the linear blend is truncated to whole Kelvin and then rounded to
/// the nearest 100.
pub fn interpolate_temperature(
    now: DateTime<Local>,
    schedule: &SunSchedule,
    day_temp: u32,
    night_temp: u32,
) -> u32 {
    let (morning_start, morning_end) = schedule.morning_window();
    let (evening_start, evening_end) = schedule.evening_window();

    if now < morning_start || now > evening_end {
        return night_temp;
    }
    if now > morning_end && now < evening_start {
        return day_temp;
    }

    if now <= morning_end {
        let frac = elapsed_fraction(now, morning_start, morning_end);
        blend(night_temp, day_temp, frac)
    } else {
        let frac = elapsed_fraction(now, evening_start, evening_end);
        blend(day_temp, night_temp, frac)
    }
}

/// Round to the nearest multiple of 100, halves rounding up.
pub fn round_to_100(kelvin: u32) -> u32 {
    kelvin.saturating_add(TEMPERATURE_STEP / 2) / TEMPERATURE_STEP * TEMPERATURE_STEP
}

// A zero-length window counts as already complete.
fn elapsed_fraction(now: DateTime<Local>, start: DateTime<Local>, end: DateTime<Local>) -> f64 {
    let total = (end - start).num_milliseconds();
    if total <= 0 {
        return 1.0;
    }
    let elapsed = (now - start).num_milliseconds();
    (elapsed as f64 / total as f64).clamp(0.0, 1.0)
}

fn blend(from: u32, to: u32, frac: f64) -> u32 {
    let value = f64::from(from) + frac * (f64::from(to) - f64::from(from));
    round_to_100(value.trunc().max(0.0) as u32)
}
