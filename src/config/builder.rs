//! Writing configuration files.
//!
//! The file is always rendered from a [`Config`] through [`ConfigBuilder`], so
//! a file written back by the daemon keeps the same sections and aligned
//! comments as a freshly created one.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::Config;
use crate::common::utils::private_path;

/// Create `path` (and its directory) holding the default configuration.
pub fn create_default_config(path: &Path) -> Result<()> {
    save(&Config::defaults(), path)
}

/// Write `config` to `path` atomically.
///
/// The content goes to a sibling `*.tmp` file first and is renamed over the
/// target, so a crash never leaves a half-written config behind.
pub fn save(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, render_config(config))
        .with_context(|| format!("Failed to write {}", private_path(&tmp_path)))?;
    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to replace {}", private_path(path)))?;

    Ok(())
}

/// Render `config` as commented TOML. Missing fields render as defaults.
pub fn render_config(config: &Config) -> String {
    let mut content = ConfigBuilder::new()
        .add_section("Automatic color")
        .add_setting(
            "auto_color_enabled",
            &config.auto_color_enabled().to_string(),
            "Follow the sun (true) or hold manual_temp (false)",
        )
        .add_setting(
            "day_temp",
            &config.day_temp().to_string(),
            "Color temperature during the day (1000-20000) Kelvin",
        )
        .add_setting(
            "night_temp",
            &config.night_temp().to_string(),
            "Color temperature at night (1000-20000) Kelvin",
        )
        .add_setting(
            "update_interval",
            &config.update_interval().to_string(),
            "Seconds between schedule checks (10-300)",
        )
        .add_section("Manual")
        .add_setting(
            "manual_temp",
            &config.manual_temp().to_string(),
            "Color temperature in manual mode (1000-20000) Kelvin",
        )
        .add_section("Location")
        .add_setting(
            "latitude",
            &format!("{:.6}", config.coordinates().latitude),
            "Detected automatically while both are 0",
        )
        .add_setting(
            "longitude",
            &format!("{:.6}", config.coordinates().longitude),
            "Decimal degrees, east positive",
        )
        .build();

    content.push('\n');
    content
}

struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        // Comments line up one space past the longest setting
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        let mut first_section = true;

        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !first_section {
                        result.push(String::new());
                    }
                    result.push(title);
                    first_section = false;
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        result.join("\n")
    }
}
