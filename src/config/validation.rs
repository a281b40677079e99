//! Configuration validation functionality.
//!
//! Range checks are hard errors. A day temperature below the night
//! temperature is allowed (the ramps simply run the other way) but warned
//! about, since it is almost always a typo.

use anyhow::Result;

use super::Config;
use crate::common::constants::*;

/// Validate every field that is present.
pub fn validate_config(config: &Config) -> Result<()> {
    for (name, value) in [
        ("day_temp", config.day_temp),
        ("night_temp", config.night_temp),
        ("manual_temp", config.manual_temp),
    ] {
        if let Some(temp) = value {
            validate_temperature(name, temp)?;
        }
    }

    if let Some(lat) = config.latitude
        && !(MINIMUM_LATITUDE..=MAXIMUM_LATITUDE).contains(&lat)
    {
        anyhow::bail!("latitude must be between -90 and 90 degrees (got {lat})");
    }

    if let Some(lon) = config.longitude
        && !(MINIMUM_LONGITUDE..=MAXIMUM_LONGITUDE).contains(&lon)
    {
        anyhow::bail!("longitude must be between -180 and 180 degrees (got {lon})");
    }

    if let Some(interval) = config.update_interval
        && !(MINIMUM_UPDATE_INTERVAL..=MAXIMUM_UPDATE_INTERVAL).contains(&interval)
    {
        anyhow::bail!(
            "update_interval ({interval} seconds) must be between {MINIMUM_UPDATE_INTERVAL} and {MAXIMUM_UPDATE_INTERVAL} seconds"
        );
    }

    if let (Some(day), Some(night)) = (config.day_temp, config.night_temp)
        && day < night
    {
        log_pipe!();
        log_warning!("day_temp ({day}K) is lower than night_temp ({night}K)");
        log_indented!("Nights will be cooler than days. Swap the values if that is unintended.");
    }

    Ok(())
}

fn validate_temperature(name: &str, temp: u32) -> Result<()> {
    if !(MINIMUM_TEMP..=MAXIMUM_TEMP).contains(&temp) {
        anyhow::bail!("{name} ({temp}) must be between {MINIMUM_TEMP} and {MAXIMUM_TEMP} Kelvin");
    }
    Ok(())
}
