//! Fixed-timestep accumulator
//!
//! Converts variable real frame times into a whole number of 60 Hz ticks.
//! Catch-up is bounded by [`MAX_SUBSTEPS`]; leftover backlog beyond that is
//! dropped so a stall never snowballs.

use crate::consts::{MAX_SUBSTEPS, SIM_DT};

/// Longest real frame the clock will account for (seconds)
pub const MAX_FRAME_TIME: f32 = 0.25;

#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    accumulator: f32,
    total_ticks: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed `elapsed` real seconds; returns how many ticks to run now
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        let elapsed = if elapsed.is_finite() {
            elapsed.clamp(0.0, MAX_FRAME_TIME)
        } else {
            0.0
        };
        self.accumulator += elapsed;

        let mut ticks = 0;
        while self.accumulator >= SIM_DT && ticks < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            ticks += 1;
        }
        if ticks == MAX_SUBSTEPS && self.accumulator >= SIM_DT {
            log::debug!("Dropping {:.3}s of simulation backlog", self.accumulator);
            self.accumulator %= SIM_DT;
        }
        self.total_ticks += u64::from(ticks);
        ticks
    }

    /// Fraction of a tick left in the accumulator, for interpolation
    pub fn alpha(&self) -> f32 {
        (self.accumulator / SIM_DT).clamp(0.0, 1.0)
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Forget pending time (after a pause or a blocking load)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_frame_one_tick() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(SIM_DT), 1);
        assert_eq!(clock.advance(SIM_DT * 0.5), 0);
        assert_eq!(clock.advance(SIM_DT * 0.5), 1);
        assert_eq!(clock.total_ticks(), 2);
    }

    #[test]
    fn test_catch_up_is_capped() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(10.0), MAX_SUBSTEPS);
        assert!(clock.alpha() < 1.0);
        // Backlog was dropped, not carried into the next frame
        assert!(clock.advance(0.0) <= 1);
    }

    #[test]
    fn test_bad_elapsed_values_are_ignored() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(-1.0), 0);
        assert_eq!(clock.advance(f32::NAN), 0);
        assert_eq!(clock.advance(f32::INFINITY), 0);
    }

    #[test]
    fn test_reset_clears_partial_tick() {
        let mut clock = FrameClock::new();
        clock.advance(SIM_DT * 0.9);
        assert!(clock.alpha() > 0.5);
        clock.reset();
        assert_eq!(clock.alpha(), 0.0);
    }
}
