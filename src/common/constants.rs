//! Application constants and default values for autotemp.
//!
//! Configuration defaults, validation limits, timing values and the addresses
//! of the two network services the engine talks to.

use std::time::Duration;

// ═══ Application Configuration Defaults ═══
// Used when a config option is missing

pub const DEFAULT_AUTO_COLOR_ENABLED: bool = true;
pub const DEFAULT_DAY_TEMP: u32 = 6500; // Kelvin - neutral white
pub const DEFAULT_NIGHT_TEMP: u32 = 3500; // Kelvin - warm evening light
pub const DEFAULT_MANUAL_TEMP: u32 = 6500;
pub const DEFAULT_LATITUDE: f64 = 0.0; // 0,0 means "not detected yet"
pub const DEFAULT_LONGITUDE: f64 = 0.0;
pub const DEFAULT_UPDATE_INTERVAL: u64 = 60; // seconds between scheduler ticks

// ═══ Validation Limits ═══

pub const MINIMUM_TEMP: u32 = 1000;
pub const MAXIMUM_TEMP: u32 = 20000;

pub const MINIMUM_UPDATE_INTERVAL: u64 = 10; // seconds
pub const MAXIMUM_UPDATE_INTERVAL: u64 = 300; // seconds

pub const MINIMUM_LATITUDE: f64 = -90.0;
pub const MAXIMUM_LATITUDE: f64 = 90.0;
pub const MINIMUM_LONGITUDE: f64 = -180.0;
pub const MAXIMUM_LONGITUDE: f64 = 180.0;

// ═══ Default Sun Schedule ═══
// Stand-in schedule used until (or whenever) the network schedule is unavailable.
// Hours and minutes in local time.

pub const DEFAULT_CIVIL_TWILIGHT_BEGIN: (u32, u32) = (5, 30);
pub const DEFAULT_SUNRISE: (u32, u32) = (6, 0);
pub const DEFAULT_SUNSET: (u32, u32) = (18, 0);
pub const DEFAULT_CIVIL_TWILIGHT_END: (u32, u32) = (18, 30);

// ═══ Temperature Stepping ═══

pub const TEMPERATURE_STEP: u32 = 100; // applied values are multiples of this

// ═══ Transition Animation ═══
// A full FULL_RANGE_KELVIN swing takes MAX_ANIMATION_FRAMES frames (one second
// at 20ms per frame); shorter swings scale down but never below the minimum.

pub const MAX_ANIMATION_FRAMES: u32 = 50;
pub const MIN_ANIMATION_FRAMES: u32 = 5;
pub const FULL_RANGE_KELVIN: u32 = 3000;
pub const ANIMATION_FRAME_INTERVAL: Duration = Duration::from_millis(20);

// ═══ Network Services ═══

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
pub const IP_LOCATION_URL: &str = "https://iplocation.info";
pub const SUN_SCHEDULE_URL: &str = "https://api.sunrisesunset.io/json";
pub const SUN_SCHEDULE_OK_STATUS: &str = "OK";
pub const SUN_TIME_FORMAT: &str = "%I:%M:%S %p"; // "h:mm:ss AM/PM"

// ═══ Files ═══

pub const CONFIG_DIR_NAME: &str = "autotemp";
pub const CONFIG_FILE_NAME: &str = "autotemp.toml";
pub const LOCK_FILE_NAME: &str = "autotemp.lock";

// ═══ Exit Codes ═══

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
