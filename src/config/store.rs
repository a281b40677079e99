//! Shared, persisted configuration.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;

use super::{Config, save};
use crate::common::utils::{lock, private_path};
use crate::core::Settings;
use crate::core::mode::ModePreferences;
use crate::geo::Coordinates;

/// The loaded configuration behind a lock, written back on every change.
///
/// Write failures are logged and otherwise ignored: the in-memory value stays
/// authoritative for the rest of the session.
pub struct ConfigStore {
    path: PathBuf,
    config: Mutex<Config>,
}

impl ConfigStore {
    pub fn new(path: PathBuf, config: Config) -> Self {
        Self {
            path,
            config: Mutex::new(config),
        }
    }

    /// Load from the standard location, creating the file if needed.
    pub fn open() -> Result<Self> {
        let path = super::get_config_path()?;
        let config = super::load()?;
        Ok(Self::new(path, config))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Config {
        lock(&self.config).clone()
    }

    fn update(&self, change: impl FnOnce(&mut Config)) {
        let mut config = lock(&self.config);
        change(&mut config);
        if let Err(e) = save(&config, &self.path) {
            log_warning!("Could not save {}: {e:#}", private_path(&self.path));
        }
    }
}

impl Settings for ConfigStore {
    fn coordinates(&self) -> Coordinates {
        lock(&self.config).coordinates()
    }

    fn set_coordinates(&self, coords: Coordinates) {
        self.update(|config| {
            config.latitude = Some(coords.latitude);
            config.longitude = Some(coords.longitude);
        });
    }

    fn day_temp(&self) -> u32 {
        lock(&self.config).day_temp()
    }

    fn night_temp(&self) -> u32 {
        lock(&self.config).night_temp()
    }
}

impl ModePreferences for ConfigStore {
    fn auto_enabled(&self) -> bool {
        lock(&self.config).auto_color_enabled()
    }

    fn set_auto_enabled(&self, enabled: bool) {
        self.update(|config| config.auto_color_enabled = Some(enabled));
    }

    fn manual_temp(&self) -> u32 {
        lock(&self.config).manual_temp()
    }

    fn set_manual_temp(&self, kelvin: u32) {
        self.update(|config| config.manual_temp = Some(kelvin));
    }
}
