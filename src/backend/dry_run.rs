//! Backend that computes everything a real display backend would, and logs it.

use anyhow::Result;

use super::ColorTemperatureBackend;
use crate::color::{GammaRamp, RAMP_SIZE, kelvin_to_rgb};

#[derive(Debug, Default)]
pub struct DryRunBackend {
    last_applied: Option<u32>,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_applied(&self) -> Option<u32> {
        self.last_applied
    }
}

impl ColorTemperatureBackend for DryRunBackend {
    fn apply_temperature(&mut self, kelvin: u32) -> Result<()> {
        let rgb = kelvin_to_rgb(kelvin);
        let ramp = GammaRamp::for_temperature(kelvin);

        log_debug!(
            "Backend set {kelvin}K (R {:.3}, G {:.3}, B {:.3})",
            rgb.red,
            rgb.green,
            rgb.blue
        );
        let top = RAMP_SIZE - 1;
        log_debug!(
            "Gamma ramp[{top}]: R {} G {} B {}",
            ramp.red()[top],
            ramp.green()[top],
            ramp.blue()[top]
        );

        self.last_applied = Some(kelvin);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "Dry run"
    }
}
