//! Observer location resolution.
//!
//! Two tiers: an IP geolocation lookup, then the system time zone table. The
//! first tier that yields usable coordinates wins. Nothing here persists the
//! result; that is the caller's job.

use serde::{Deserialize, Serialize};

use super::error::ResolveError;
use super::http::HttpClient;
use super::timezone::coordinates_for_timezone;
use crate::common::constants::IP_LOCATION_URL;

/// Decimal-degree coordinates. `(0, 0)` means "not detected yet".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const UNSET: Self = Self {
        latitude: 0.0,
        longitude: 0.0,
    };

    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_unset(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&crate::common::utils::format_coordinates(
            self.latitude,
            self.longitude,
        ))
    }
}

#[derive(Deserialize)]
struct IpLocationPayload {
    lat: f64,
    lon: f64,
}

/// Look up coordinates from the machine's public IP.
///
/// An exact `(0, 0)` answer is rejected as [`ResolveError::DataInvalid`].
pub fn locate_by_ip(http: &dyn HttpClient) -> Result<Coordinates, ResolveError> {
    let body = http.get(IP_LOCATION_URL)?;
    let payload: IpLocationPayload = serde_json::from_str(&body)?;

    let coords = Coordinates::new(payload.lat, payload.lon);
    if coords.is_unset() {
        return Err(ResolveError::DataInvalid(
            "location service returned zero coordinates".into(),
        ));
    }
    Ok(coords)
}

/// Look up coordinates from a time zone name.
pub fn locate_by_timezone(zone: Option<&str>) -> Result<Coordinates, ResolveError> {
    let zone = zone.ok_or_else(|| {
        ResolveError::DataInvalid("could not determine the system time zone".into())
    })?;

    coordinates_for_timezone(zone)
        .ok_or_else(|| ResolveError::DataInvalid(format!("unknown time zone \"{zone}\"")))
}

/// IP lookup first, time zone table second.
///
/// When both tiers fail, the time zone error is returned.
pub fn resolve_location(
    http: &dyn HttpClient,
    zone: Option<&str>,
) -> Result<Coordinates, ResolveError> {
    match locate_by_ip(http) {
        Ok(coords) => Ok(coords),
        Err(e) => {
            log_warning!("IP location failed: {e}");
            log_indented!("Trying time zone fallback");
            let coords = locate_by_timezone(zone)?;
            log_indented!(
                "Using time zone fallback for {}",
                zone.unwrap_or("unknown")
            );
            Ok(coords)
        }
    }
}
