//! Where the observer is and when the sun moves there.
//!
//! ## Module Structure
//!
//! - [`location`]: IP geolocation with a time zone table fallback
//! - [`timezone`]: system zone detection and the zone → coordinates table
//! - [`schedule`]: [`SunSchedule`], the default schedule, and the schedule service client
//! - [`http`]: the blocking GET seam both services go through
//! - [`error`]: the [`ResolveError`] taxonomy
//!
//! The scheduler only sees the [`SolarSource`] trait. [`NetworkSolarSource`] is
//! the production implementation; tests plug in canned sources.

pub mod error;
pub mod http;
pub mod location;
pub mod schedule;
pub mod timezone;

pub use error::{ErrorKind, ResolveError};
pub use http::{HttpClient, UreqClient};
pub use location::Coordinates;
pub use schedule::SunSchedule;


use chrono::NaiveDate;

/// Location and schedule lookups, both potentially slow.
///
/// Only ever called from the scheduler's background thread (or a one-shot
/// CLI command), never from an interactive caller.
pub trait SolarSource: Send + Sync {
    fn resolve_location(&self) -> Result<Coordinates, ResolveError>;

    fn fetch_schedule(
        &self,
        coords: Coordinates,
        today: NaiveDate,
    ) -> Result<SunSchedule, ResolveError>;
}

/// Talks to the IP location and sunrise/sunset services over HTTP.
pub struct NetworkSolarSource {
    http: Box<dyn HttpClient>,
}

impl NetworkSolarSource {
    pub fn new() -> Self {
        Self::with_client(Box::new(UreqClient::new()))
    }

    pub fn with_client(http: Box<dyn HttpClient>) -> Self {
        Self { http }
    }
}

impl Default for NetworkSolarSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SolarSource for NetworkSolarSource {
    fn resolve_location(&self) -> Result<Coordinates, ResolveError> {
        let zone = timezone::system_timezone_name();
        location::resolve_location(self.http.as_ref(), zone.as_deref())
    }

    fn fetch_schedule(
        &self,
        coords: Coordinates,
        today: NaiveDate,
    ) -> Result<SunSchedule, ResolveError> {
        schedule::fetch_schedule(self.http.as_ref(), coords, today)
    }
}
