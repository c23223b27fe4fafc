//! Fixed-timestep stepping ("Fix Your Timestep").
//!
//! [`FixedTimestep`] turns arbitrary frame times into a whole number of
//! fixed-size simulation steps. [`GameLoop`] feeds it wall-clock time for
//! real-time runs; headless runs feed it simulated frame times directly so
//! a flight is reproducible tick for tick.

use std::time::{Duration, Instant};

use tracing::warn;

/// Fixed simulation timestep: 60 Hz.
pub const FIXED_DT: f64 = 1.0 / 60.0;

/// Longest frame accepted before clamping, so a stall never triggers a burst
/// of catch-up steps.
pub const MAX_FRAME_TIME: f64 = 0.25;

/// Accumulator that converts frame time into fixed steps.
#[derive(Clone, Debug, Default)]
pub struct FixedTimestep {
    accumulator: f64,
    total_sim_time: f64,
    frame_count: u64,
    update_count: u64,
}

impl FixedTimestep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `frame_time` seconds and run `update_fn(FIXED_DT, sim_time)` for
    /// every whole step that fits. Returns the interpolation alpha in
    /// `[0, 1)`.
    ///
    /// Negative or non-finite frame times count as zero.
    pub fn advance(&mut self, frame_time: f64, mut update_fn: impl FnMut(f64, f64)) -> f64 {
        let frame_time = if frame_time.is_finite() {
            frame_time.clamp(0.0, MAX_FRAME_TIME)
        } else {
            0.0
        };
        self.accumulator += frame_time;

        while self.accumulator >= FIXED_DT {
            update_fn(FIXED_DT, self.total_sim_time);
            self.total_sim_time += FIXED_DT;
            self.accumulator -= FIXED_DT;
            self.update_count += 1;
        }

        self.frame_count += 1;
        self.alpha()
    }

    /// Interpolation alpha without advancing.
    pub fn alpha(&self) -> f64 {
        if self.accumulator > 0.0 {
            self.accumulator / FIXED_DT
        } else {
            0.0
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Total simulation steps executed.
    pub fn update_count(&self) -> u64 {
        self.update_count
    }

    /// Total simulation time in seconds.
    pub fn total_sim_time(&self) -> f64 {
        self.total_sim_time
    }
}

/// Wall-clock driven loop around [`FixedTimestep`].
pub struct GameLoop {
    previous_time: Instant,
    step: FixedTimestep,
}

impl GameLoop {
    /// Creates a loop starting from the current instant.
    pub fn new() -> Self {
        Self {
            previous_time: Instant::now(),
            step: FixedTimestep::new(),
        }
    }

    /// Measure elapsed time since the previous tick and run the fixed steps
    /// that fit. Returns the interpolation alpha.
    pub fn tick(&mut self, update_fn: impl FnMut(f64, f64)) -> f64 {
        let now = Instant::now();
        let frame_time = now.duration_since(self.previous_time).as_secs_f64();
        self.previous_time = now;

        if frame_time > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                frame_time * 1000.0,
                MAX_FRAME_TIME * 1000.0
            );
        }
        self.step.advance(frame_time, update_fn)
    }

    /// Sleep until the next fixed step is due.
    pub fn pace(&self) {
        let remaining = FIXED_DT - self.step.accumulator;
        if remaining > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(remaining));
        }
    }

    pub fn timestep(&self) -> &FixedTimestep {
        &self.step
    }
}

impl Default for GameLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_step() {
        let mut step = FixedTimestep::new();
        let mut updates = 0u32;
        step.advance(FIXED_DT, |_, _| updates += 1);
        assert_eq!(updates, 1);
        assert!(step.accumulator.abs() < 1e-12);
    }

    #[test]
    fn test_multiple_steps_pass_sim_time() {
        let mut step = FixedTimestep::new();
        let mut times = Vec::new();
        step.advance(3.0 * FIXED_DT + 1e-9, |_, t| times.push(t));
        assert_eq!(times.len(), 3);
        assert_eq!(times[0], 0.0);
        assert!((times[2] - 2.0 * FIXED_DT).abs() < 1e-12);
    }

    #[test]
    fn test_partial_frame_keeps_remainder() {
        let mut step = FixedTimestep::new();
        let alpha = step.advance(0.25 * FIXED_DT, |_, _| panic!("no step expected"));
        assert!((alpha - 0.25).abs() < 1e-10);
        assert_eq!(step.frame_count(), 1);
    }

    #[test]
    fn test_long_frame_clamped() {
        let mut step = FixedTimestep::new();
        let mut updates = 0u32;
        step.advance(5.0, |_, _| updates += 1);
        let max_updates = (MAX_FRAME_TIME / FIXED_DT).ceil() as u32;
        assert!(updates > 0 && updates <= max_updates);
    }

    #[test]
    fn test_invalid_frame_times_ignored() {
        let mut step = FixedTimestep::new();
        for ft in [-1.0, f64::NAN, f64::INFINITY] {
            step.advance(ft, |_, _| panic!("no step expected"));
        }
        assert_eq!(step.update_count(), 0);
        assert_eq!(step.total_sim_time(), 0.0);
    }

    #[test]
    fn test_deterministic_sequence() {
        let frame_times = [0.017, 0.015, 0.020, 0.016, 0.033, 0.008, 0.018];
        let mut a = FixedTimestep::new();
        let mut b = FixedTimestep::new();
        for &ft in &frame_times {
            let alpha_a = a.advance(ft, |_, _| {});
            let alpha_b = b.advance(ft, |_, _| {});
            assert_eq!(alpha_a.to_bits(), alpha_b.to_bits());
        }
        assert_eq!(a.update_count(), b.update_count());
        let expected = a.update_count() as f64 * FIXED_DT;
        assert!((a.total_sim_time() - expected).abs() < 1e-10);
    }

    #[test]
    fn test_game_loop_starts_empty() {
        let game_loop = GameLoop::default();
        assert_eq!(game_loop.timestep().frame_count(), 0);
        assert_eq!(game_loop.timestep().update_count(), 0);
    }
}
