//! Kelvin to RGB conversion.
//!
//! Turns a color temperature into per-channel multipliers using Tanner
//! Helland's piecewise fit of the blackbody curve, evaluated on
//! `temp = kelvin / 100`. 6500K lands on (almost exactly) neutral white; lower
//! values pull green and blue down toward amber, higher values pull red and
//! green down toward blue.
//!
//! [`GammaRamp`] scales an identity ramp by those multipliers, which is the
//! form display backends consume.

/// Channel multipliers in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

/// Convert a color temperature in Kelvin to RGB multipliers.
///
/// Any input is accepted; each channel is clamped to `[0, 1]` after evaluation.
pub fn kelvin_to_rgb(kelvin: u32) -> Rgb {
    let temp = f64::from(kelvin) / 100.0;

    let red = if temp <= 66.0 {
        1.0
    } else {
        329.698727446 * (temp - 60.0).powf(-0.1332047592) / 255.0
    };

    let green = if temp <= 66.0 {
        (99.4708025861 * temp.ln() - 161.1195681661) / 255.0
    } else {
        288.1221695283 * (temp - 60.0).powf(-0.0755148492) / 255.0
    };

    let blue = if temp >= 66.0 {
        1.0
    } else if temp <= 19.0 {
        0.0
    } else {
        (138.5177312231 * (temp - 10.0).ln() - 305.0447927307) / 255.0
    };

    Rgb {
        red: clamp_unit(red),
        green: clamp_unit(green),
        blue: clamp_unit(blue),
    }
}

// ln(0) is -inf for kelvin == 0; clamp() maps that to 0 while NaN would
// survive it, so NaN is handled explicitly.
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub const RAMP_SIZE: usize = 256;

/// Per-channel gamma lookup table (red, green, blue) of 16-bit entries.
#[derive(Debug, Clone, PartialEq)]
pub struct GammaRamp {
    pub channels: [[u16; RAMP_SIZE]; 3],
}

impl GammaRamp {
    /// Identity ramp scaled by the multipliers for `kelvin`.
    pub fn for_temperature(kelvin: u32) -> Self {
        let rgb = kelvin_to_rgb(kelvin);
        let multipliers = [rgb.red, rgb.green, rgb.blue];
        let mut channels = [[0u16; RAMP_SIZE]; 3];

        for (channel, multiplier) in channels.iter_mut().zip(multipliers) {
            for (i, entry) in channel.iter_mut().enumerate() {
                let identity = (i as u16) << 8;
                *entry = (f64::from(identity) * multiplier) as u16;
            }
        }

        Self { channels }
    }

    pub fn red(&self) -> &[u16; RAMP_SIZE] {
        &self.channels[0]
    }

    pub fn green(&self) -> &[u16; RAMP_SIZE] {
        &self.channels[1]
    }

    pub fn blue(&self) -> &[u16; RAMP_SIZE] {
        &self.channels[2]
    }
}
