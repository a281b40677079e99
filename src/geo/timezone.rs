//! Time-zone based location fallback.
//!
//! When IP geolocation is unavailable, the system's IANA time zone is a decent
//! proxy for where the machine is. Each zone below maps to the coordinates of a
//! representative city, which is plenty of precision for picking sunrise and
//! sunset times.

use std::path::Path;

use chrono_tz::Tz;

use super::location::Coordinates;

/// Zone name, latitude, longitude.
pub const TIMEZONE_COORDINATES: &[(&str, f64, f64)] = &[
    // Americas
    ("America/New_York", 40.71, -74.01),
    ("America/Chicago", 41.88, -87.63),
    ("America/Denver", 39.74, -104.99),
    ("America/Los_Angeles", 34.05, -118.24),
    ("America/Anchorage", 61.22, -149.90),
    ("Pacific/Honolulu", 21.31, -157.86),
    ("America/Phoenix", 33.45, -112.07),
    ("America/Toronto", 43.65, -79.38),
    ("America/Vancouver", 49.28, -123.12),
    ("America/Mexico_City", 19.43, -99.13),
    ("America/Sao_Paulo", -23.55, -46.63),
    ("America/Argentina/Buenos_Aires", -34.60, -58.38),
    ("America/Bogota", 4.71, -74.07),
    ("America/Lima", -12.05, -77.04),
    // Europe
    ("Europe/London", 51.51, -0.13),
    ("Europe/Paris", 48.86, 2.35),
    ("Europe/Berlin", 52.52, 13.41),
    ("Europe/Madrid", 40.42, -3.70),
    ("Europe/Rome", 41.90, 12.50),
    ("Europe/Amsterdam", 52.37, 4.90),
    ("Europe/Brussels", 50.85, 4.35),
    ("Europe/Vienna", 48.21, 16.37),
    ("Europe/Zurich", 47.38, 8.54),
    ("Europe/Stockholm", 59.33, 18.07),
    ("Europe/Oslo", 59.91, 10.75),
    ("Europe/Helsinki", 60.17, 24.94),
    ("Europe/Warsaw", 52.23, 21.01),
    ("Europe/Moscow", 55.76, 37.62),
    ("Europe/Istanbul", 41.01, 28.98),
    ("Europe/Athens", 37.98, 23.73),
    ("Europe/Bucharest", 44.43, 26.10),
    // Asia
    ("Asia/Tokyo", 35.68, 139.69),
    ("Asia/Shanghai", 31.23, 121.47),
    ("Asia/Hong_Kong", 22.32, 114.17),
    ("Asia/Singapore", 1.35, 103.82),
    ("Asia/Kolkata", 28.61, 77.21),
    ("Asia/Seoul", 37.57, 126.98),
    ("Asia/Taipei", 25.03, 121.57),
    ("Asia/Bangkok", 13.76, 100.50),
    ("Asia/Dubai", 25.20, 55.27),
    ("Asia/Jerusalem", 31.77, 35.22),
    // Oceania
    ("Australia/Sydney", -33.87, 151.21),
    ("Australia/Melbourne", -37.81, 144.96),
    ("Australia/Perth", -31.95, 115.86),
    ("Pacific/Auckland", -36.85, 174.76),
    // Africa
    ("Africa/Cairo", 30.04, 31.24),
    ("Africa/Johannesburg", -26.20, 28.04),
    ("Africa/Lagos", 6.52, 3.38),
];

/// Look up the representative coordinates for an IANA zone name.
pub fn coordinates_for_timezone(name: &str) -> Option<Coordinates> {
    TIMEZONE_COORDINATES
        .iter()
        .find(|(zone, _, _)| *zone == name)
        .map(|&(_, latitude, longitude)| Coordinates {
            latitude,
            longitude,
        })
}

/// Best-effort IANA name of the system time zone.
///
/// Checked in order: the `TZ` environment variable, `/etc/timezone`, and the
/// target of the `/etc/localtime` symlink. Only names chrono-tz recognises are
/// returned.
pub fn system_timezone_name() -> Option<String> {
    if let Ok(tz) = std::env::var("TZ")
        && let Some(name) = valid_zone_name(tz.trim_start_matches(':'))
    {
        return Some(name);
    }

    if let Ok(contents) = std::fs::read_to_string("/etc/timezone")
        && let Some(name) = valid_zone_name(contents.trim())
    {
        return Some(name);
    }

    zone_from_localtime_link(Path::new("/etc/localtime"))
}

fn zone_from_localtime_link(link: &Path) -> Option<String> {
    let target = std::fs::read_link(link).ok()?;
    let target = target.to_string_lossy();
    let (_, zone) = target.split_once("zoneinfo/")?;
    valid_zone_name(zone)
}

fn valid_zone_name(candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }
    candidate.parse::<Tz>().ok().map(|tz| tz.name().to_string())
}
