//! Configuration for autotemp.
//!
//! Settings live in `autotemp.toml` under `$XDG_CONFIG_HOME/autotemp/` (or the
//! directory given with `--config`). A missing file is created with defaults:
//!
//! ```toml
//! #[Automatic color]
//! auto_color_enabled = true # Follow the sun (true) or hold manual_temp (false)
//! day_temp = 6500           # Color temperature during the day (1000-20000) Kelvin
//! night_temp = 3500         # Color temperature at night (1000-20000) Kelvin
//! update_interval = 60      # Seconds between schedule checks (10-300)
//!
//! #[Manual]
//! manual_temp = 6500        # Color temperature in manual mode (1000-20000) Kelvin
//!
//! #[Location]
//! latitude = 0.000000       # Detected automatically while both are 0
//! longitude = 0.000000
//! ```
//!
//! Every field is optional in the file. Loading validates what is present,
//! then fills in defaults, so code downstream can rely on the accessor
//! methods. The daemon writes the file back when the mode, the manual
//! temperature, or the detected location changes; see [`ConfigStore`].

pub mod builder;
pub mod loading;
pub mod store;
pub mod validation;

use serde::Deserialize;

use crate::common::constants::*;
use crate::geo::Coordinates;

pub use builder::{create_default_config, render_config, save};
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use store::ConfigStore;


#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Whether automatic (sun-following) mode is active.
    pub auto_color_enabled: Option<bool>,
    /// Kelvin during full daylight.
    pub day_temp: Option<u32>,
    /// Kelvin during full night.
    pub night_temp: Option<u32>,
    /// Kelvin held while automatic mode is off.
    pub manual_temp: Option<u32>,
    /// Observer latitude; `0` together with a `0` longitude means undetected.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Seconds between scheduler ticks.
    pub update_interval: Option<u64>,
}

impl Config {
    /// Load using automatic path detection, creating a default file if needed.
    pub fn load() -> anyhow::Result<Self> {
        load()
    }

    /// A config with every field set to its default.
    pub fn defaults() -> Self {
        let mut config = Self::default();
        loading::apply_defaults(&mut config);
        config
    }

    pub fn auto_color_enabled(&self) -> bool {
        self.auto_color_enabled.unwrap_or(DEFAULT_AUTO_COLOR_ENABLED)
    }

    pub fn day_temp(&self) -> u32 {
        self.day_temp.unwrap_or(DEFAULT_DAY_TEMP)
    }

    pub fn night_temp(&self) -> u32 {
        self.night_temp.unwrap_or(DEFAULT_NIGHT_TEMP)
    }

    pub fn manual_temp(&self) -> u32 {
        self.manual_temp.unwrap_or(DEFAULT_MANUAL_TEMP)
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(
            self.latitude.unwrap_or(DEFAULT_LATITUDE),
            self.longitude.unwrap_or(DEFAULT_LONGITUDE),
        )
    }

    pub fn update_interval(&self) -> u64 {
        self.update_interval.unwrap_or(DEFAULT_UPDATE_INTERVAL)
    }

    /// Print the effective settings as a block.
    pub fn log_config(&self) {
        log_block_start!(
            "Mode: {}",
            if self.auto_color_enabled() {
                "automatic"
            } else {
                "manual"
            }
        );
        log_indented!("Day temperature: {}K", self.day_temp());
        log_indented!("Night temperature: {}K", self.night_temp());
        log_indented!("Manual temperature: {}K", self.manual_temp());
        log_indented!("Update interval: {} seconds", self.update_interval());

        let coords = self.coordinates();
        if coords.is_unset() {
            log_indented!("Location: not detected yet");
        } else {
            log_indented!("Location: {coords}");
        }
    }
}
