//! Eased, cancellable temperature transitions.
//!
//! A transition walks from one Kelvin value to another over a handful of
//! frames spaced [`ANIMATION_FRAME_INTERVAL`] apart. The frame count scales
//! with distance: a full 3000K swing takes 50 frames (one second), short hops
//! never take fewer than 5.
//!
//! The animator does not write anywhere itself. Every frame goes through the
//! caller's `emit` closure, which returns `false` when the write was refused
//! (for instance because a manual override took over in the meantime).

use std::time::Duration;

use super::stop::StopSignal;
use crate::common::constants::{
    ANIMATION_FRAME_INTERVAL, FULL_RANGE_KELVIN, MAX_ANIMATION_FRAMES, MIN_ANIMATION_FRAMES,
};

/// Cubic ease-in-out on `[0, 1]`.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let u = -2.0 * t + 2.0;
        1.0 - u * u * u / 2.0
    }
}

/// Number of frames for a transition between two temperatures.
pub fn animation_frames(from: u32, to: u32) -> u32 {
    let distance = u64::from(from.abs_diff(to));
    let frames = u64::from(MAX_ANIMATION_FRAMES) * distance / u64::from(FULL_RANGE_KELVIN);
    frames.clamp(
        u64::from(MIN_ANIMATION_FRAMES),
        u64::from(MAX_ANIMATION_FRAMES),
    ) as u32
}

/// How a transition ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationOutcome {
    /// Every frame was emitted; the last one was exactly the target.
    Completed,
    /// Stopped early. `last` is the final value that was actually emitted.
    Cancelled { last: Option<u32> },
}

#[derive(Debug, Clone, Copy)]
pub struct Transition {
    from: u32,
    to: u32,
    frame_interval: Duration,
}

impl Transition {
    pub fn new(from: u32, to: u32) -> Self {
        Self {
            from,
            to,
            frame_interval: ANIMATION_FRAME_INTERVAL,
        }
    }

    pub fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }

    pub fn frames(&self) -> u32 {
        animation_frames(self.from, self.to)
    }

    /// Every frame value in emission order. The final entry is always `to`.
    pub fn values(&self) -> Vec<u32> {
        let frames = self.frames();
        let from = i64::from(self.from);
        let delta = i64::from(self.to) - from;

        let mut values: Vec<u32> = (1..=frames)
            .map(|frame| {
                let eased = ease_in_out_cubic(f64::from(frame) / f64::from(frames));
                let value = from + (eased * delta as f64).round() as i64;
                value.clamp(0, i64::from(u32::MAX)) as u32
            })
            .collect();

        // Eased arithmetic must not leave the target off by a rounding step.
        if let Some(last) = values.last_mut() {
            *last = self.to;
        }
        values
    }

    /// Emit every frame in order, blocking between frames.
    ///
    /// `stop` is checked before each frame and waited on between frames, so a
    /// fired signal halts the sequence within one frame interval. Cancellation
    /// never forces the target value.
    pub fn run(&self, stop: &StopSignal, mut emit: impl FnMut(u32) -> bool) -> AnimationOutcome {
        let values = self.values();
        let mut last = None;

        for (index, &value) in values.iter().enumerate() {
            if stop.is_fired() || !emit(value) {
                return AnimationOutcome::Cancelled { last };
            }
            last = Some(value);

            let more_frames = index + 1 < values.len();
            if more_frames && stop.wait_timeout(self.frame_interval) {
                return AnimationOutcome::Cancelled { last };
            }
        }

        AnimationOutcome::Completed
    }
}
