//! Output side of the engine.
//!
//! The scheduler writes through two narrow traits:
//!
//! - [`TemperatureSink`]: the display control collaborator. Fire-and-forget.
//! - [`DisplaySync`]: the advisory UI readout. Safe to call with no UI attached.
//!
//! The daemon's sink is a [`CoalescingSink`]: writes land in a capacity-one
//! mailbox where a newer value replaces an unconsumed older one, and a worker
//! thread hands whatever is latest to a [`ColorTemperatureBackend`]. A slow
//! backend therefore never stalls the scheduler or an animation, and bursts of
//! writes collapse to their final value.

pub mod dry_run;
pub mod mailbox;

pub use dry_run::DryRunBackend;
pub use mailbox::{CoalescingSink, LatestMailbox};

use anyhow::Result;

/// Receives every temperature the engine decides on.
pub trait TemperatureSink: Send + Sync {
    fn apply_temperature(&self, kelvin: u32);
}

/// Mirrors the applied temperature into whatever UI is attached.
pub trait DisplaySync: Send + Sync {
    fn sync_displayed_temperature(&self, kelvin: u32);
}

/// Something that can actually change the display's white point.
///
/// Only ever driven from the [`CoalescingSink`] worker thread, so methods take
/// `&mut self`.
pub trait ColorTemperatureBackend: Send {
    /// Apply a color temperature in Kelvin.
    fn apply_temperature(&mut self, kelvin: u32) -> Result<()>;

    /// Human-readable name for logs.
    fn backend_name(&self) -> &'static str;
}

/// No UI attached.
pub struct NoDisplay;

impl DisplaySync for NoDisplay {
    fn sync_displayed_temperature(&self, _kelvin: u32) {}
}

/// Terminal stand-in for a UI readout; shows the value in debug output.
pub struct TerminalDisplay;

impl DisplaySync for TerminalDisplay {
    fn sync_displayed_temperature(&self, kelvin: u32) {
        log_debug!("Display readout: {kelvin}K");
    }
}
