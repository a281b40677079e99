//! Daily sun schedule and the network provider that fetches it.
//!
//! A [`SunSchedule`] holds four local timestamps on one calendar date. The
//! default schedule (twilight 05:30, sunrise 06:00, sunset 18:00, twilight
//! 18:30) stands in whenever nothing better is available. The provider itself
//! has no fallback; it either returns a complete, ordered schedule or an error.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone};
use serde::Deserialize;

use super::error::ResolveError;
use super::http::HttpClient;
use super::location::Coordinates;
use crate::common::constants::{
    DEFAULT_CIVIL_TWILIGHT_BEGIN, DEFAULT_CIVIL_TWILIGHT_END, DEFAULT_SUNRISE, DEFAULT_SUNSET,
    SUN_SCHEDULE_OK_STATUS, SUN_SCHEDULE_URL, SUN_TIME_FORMAT,
};

/// Sun events for one day, in observer-local time.
///
/// A schedule coming out of [`fetch_schedule`] or [`SunSchedule::default_for`]
/// always satisfies `civil_twilight_begin < sunrise < sunset < civil_twilight_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunSchedule {
    pub civil_twilight_begin: DateTime<Local>,
    pub sunrise: DateTime<Local>,
    pub sunset: DateTime<Local>,
    pub civil_twilight_end: DateTime<Local>,
}

impl SunSchedule {
    /// Anchor four times of day onto `date`.
    pub fn from_times(
        date: NaiveDate,
        civil_twilight_begin: NaiveTime,
        sunrise: NaiveTime,
        sunset: NaiveTime,
        civil_twilight_end: NaiveTime,
    ) -> Self {
        Self {
            civil_twilight_begin: anchor_local(date, civil_twilight_begin),
            sunrise: anchor_local(date, sunrise),
            sunset: anchor_local(date, sunset),
            civil_twilight_end: anchor_local(date, civil_twilight_end),
        }
    }

    /// The fixed fallback schedule on `date`.
    pub fn default_for(date: NaiveDate) -> Self {
        Self::from_times(
            date,
            hm(DEFAULT_CIVIL_TWILIGHT_BEGIN),
            hm(DEFAULT_SUNRISE),
            hm(DEFAULT_SUNSET),
            hm(DEFAULT_CIVIL_TWILIGHT_END),
        )
    }

    /// Check the event ordering.
    pub fn validate(&self) -> Result<(), ResolveError> {
        let ordered = self.civil_twilight_begin < self.sunrise
            && self.sunrise < self.sunset
            && self.sunset < self.civil_twilight_end;

        if ordered {
            Ok(())
        } else {
            Err(ResolveError::DataInvalid(format!(
                "sun events out of order ({})",
                self.describe()
            )))
        }
    }

    /// Calendar date the schedule is anchored to.
    pub fn date(&self) -> NaiveDate {
        self.sunrise.date_naive()
    }

    /// Same times of day, moved onto `date`.
    pub fn rebased_to(&self, date: NaiveDate) -> Self {
        Self::from_times(
            date,
            self.civil_twilight_begin.time(),
            self.sunrise.time(),
            self.sunset.time(),
            self.civil_twilight_end.time(),
        )
    }

    /// Morning ramp: starts at civil twilight, with sunrise as its midpoint.
    pub fn morning_window(&self) -> (DateTime<Local>, DateTime<Local>) {
        let half = self.sunrise - self.civil_twilight_begin;
        (self.civil_twilight_begin, self.sunrise + half)
    }

    /// Evening ramp: ends at civil twilight, with sunset as its midpoint.
    pub fn evening_window(&self) -> (DateTime<Local>, DateTime<Local>) {
        let half = self.civil_twilight_end - self.sunset;
        (self.sunset - half, self.civil_twilight_end)
    }

    /// One-line `HH:MM` summary for logs.
    pub fn describe(&self) -> String {
        format!(
            "twilight {}, sunrise {}, sunset {}, twilight {}",
            self.civil_twilight_begin.format("%H:%M"),
            self.sunrise.format("%H:%M"),
            self.sunset.format("%H:%M"),
            self.civil_twilight_end.format("%H:%M"),
        )
    }
}

fn hm((hour, minute): (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// Place a wall-clock time on `date` in the local zone.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times that
/// do not exist (DST spring-forward gap) are pushed past the gap.
pub(crate) fn anchor_local(date: NaiveDate, time: NaiveTime) -> DateTime<Local> {
    let naive = date.and_time(time);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
        })
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

/// Parse an `h:mm:ss AM/PM` time, e.g. `6:04:31 AM`.
pub fn parse_sun_time(value: &str) -> Result<NaiveTime, ResolveError> {
    NaiveTime::parse_from_str(value.trim(), SUN_TIME_FORMAT)
        .map_err(|e| ResolveError::Parse(format!("bad time \"{value}\": {e}")))
}

/// Request URL for the schedule of `coords` today.
pub fn sun_schedule_url(coords: Coordinates) -> String {
    format!(
        "{SUN_SCHEDULE_URL}?lat={:.6}&lng={:.6}&date=today",
        coords.latitude, coords.longitude
    )
}

#[derive(Debug, Default, Deserialize)]
struct SunSchedulePayload {
    #[serde(default)]
    results: SunTimesPayload,
    #[serde(default)]
    status: String,
}

#[derive(Debug, Default, Deserialize)]
struct SunTimesPayload {
    #[serde(default)]
    sunrise: String,
    #[serde(default)]
    sunset: String,
    #[serde(default)]
    civil_twilight_begin: String,
    #[serde(default)]
    civil_twilight_end: String,
}

/// Fetch the schedule for `coords`, anchored onto `today`.
///
/// Fails as a unit: a bad status, any unparseable field, or out-of-order
/// events discard the whole response.
pub fn fetch_schedule(
    http: &dyn HttpClient,
    coords: Coordinates,
    today: NaiveDate,
) -> Result<SunSchedule, ResolveError> {
    let body = http.get(&sun_schedule_url(coords))?;
    let payload: SunSchedulePayload = serde_json::from_str(&body)?;

    if payload.status != SUN_SCHEDULE_OK_STATUS {
        return Err(ResolveError::DataInvalid(format!(
            "schedule service status \"{}\"",
            payload.status
        )));
    }

    let times = &payload.results;
    let schedule = SunSchedule::from_times(
        today,
        parse_sun_time(&times.civil_twilight_begin)?,
        parse_sun_time(&times.sunrise)?,
        parse_sun_time(&times.sunset)?,
        parse_sun_time(&times.civil_twilight_end)?,
    );
    schedule.validate()?;

    Ok(schedule)
}
