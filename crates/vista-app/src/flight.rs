//! Fly-through driver: moves a viewpoint along −Z and keeps the segment
//! window around it.

use tracing::{debug, info};
use vista_stream::{TerrainWindowManager, WindowStats};
use vista_terrain::{BiasOverrides, generate_seed};

use crate::game_loop::{FIXED_DT, FixedTimestep, GameLoop};

/// Constant-speed motion along the travel axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flight {
    z: f64,
    speed: f64,
}

impl Flight {
    pub fn new(start_z: f64, speed: f64) -> Self {
        Self { z: start_z, speed }
    }

    /// Advance by `dt` seconds and return the new coordinate. Positive speed
    /// moves toward −Z.
    pub fn step(&mut self, dt: f64) -> f64 {
        self.z -= self.speed * dt;
        self.z
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }
}

/// A world change scheduled at a fixed simulation time.
#[derive(Clone, Debug)]
struct Reseed {
    at_secs: f64,
    seed: Option<String>,
}

/// Outcome of a completed flight.
#[derive(Clone, Debug, PartialEq)]
pub struct FlightSummary {
    pub ticks: u64,
    pub sim_secs: f64,
    pub final_z: f64,
    /// Largest resident segment count seen after any tick.
    pub max_resident: usize,
    pub stats: WindowStats,
}

/// Drives a [`TerrainWindowManager`] from a [`Flight`], one window update per
/// fixed tick.
pub struct FlightDriver<'a> {
    manager: &'a mut TerrainWindowManager,
    flight: Flight,
    reseed: Option<Reseed>,
    ticks: u64,
    max_resident: usize,
    next_report: f64,
}

impl<'a> FlightDriver<'a> {
    pub fn new(manager: &'a mut TerrainWindowManager, flight: Flight) -> Self {
        Self {
            manager,
            flight,
            reseed: None,
            ticks: 0,
            max_resident: 0,
            next_report: 1.0,
        }
    }

    /// Rebuild the world once simulation time reaches `at_secs`. With no seed
    /// a fresh one is generated.
    pub fn with_reseed(mut self, at_secs: f64, seed: Option<String>) -> Self {
        self.reseed = Some(Reseed { at_secs, seed });
        self
    }

    /// Simulate `duration_secs` as fast as possible.
    ///
    /// `each_second` runs once per simulated second with the manager, e.g.
    /// to pick up config changes.
    pub fn run_headless(
        mut self,
        duration_secs: f64,
        mut each_second: impl FnMut(&mut TerrainWindowManager),
    ) -> FlightSummary {
        self.start();
        let mut step = FixedTimestep::new();
        while step.total_sim_time() < duration_secs {
            let before = self.next_report;
            step.advance(FIXED_DT, |dt, t| self.tick(dt, t));
            if self.next_report > before {
                each_second(&mut *self.manager);
            }
        }
        self.finish(step.total_sim_time())
    }

    /// Simulate `duration_secs` paced by the wall clock.
    pub fn run_realtime(
        mut self,
        duration_secs: f64,
        mut each_second: impl FnMut(&mut TerrainWindowManager),
    ) -> FlightSummary {
        self.start();
        let mut game_loop = GameLoop::new();
        while game_loop.timestep().total_sim_time() < duration_secs {
            let before = self.next_report;
            game_loop.tick(|dt, t| self.tick(dt, t));
            if self.next_report > before {
                each_second(&mut *self.manager);
            }
            game_loop.pace();
        }
        let sim_secs = game_loop.timestep().total_sim_time();
        self.finish(sim_secs)
    }

    fn start(&mut self) {
        let update = self.manager.update_window(self.flight.z());
        self.max_resident = self.manager.resident_count();
        info!(
            "Flight start at z={:.1}, speed {:.1}/s, {} segments resident around {}",
            self.flight.z(),
            self.flight.speed(),
            self.max_resident,
            update.center
        );
    }

    fn tick(&mut self, dt: f64, sim_time: f64) {
        let now = sim_time + dt;
        let z = self.flight.step(dt);

        if let Some(reseed) = self.reseed.take_if(|r| now >= r.at_secs) {
            let seed = reseed.seed.unwrap_or_else(generate_seed);
            info!("Reseeding at t={now:.2}s to '{seed}'");
            self.manager.rebuild(Some(seed), &BiasOverrides::default());
        }

        let update = self.manager.update_window(z);
        if !update.is_noop() {
            debug!(
                "t={now:.2}s z={z:.1} center {}: +{:?} -{:?} ({} adopted)",
                update.center, update.created, update.evicted, update.adopted
            );
        }

        self.ticks += 1;
        self.max_resident = self.max_resident.max(self.manager.resident_count());

        if now >= self.next_report {
            self.next_report = now.floor() + 1.0;
            let stats = self.manager.stats();
            info!(
                "t={now:.0}s z={z:.1} | resident {} ({} vertices) | created {} evicted {} adopted {} discarded {}",
                self.manager.resident_count(),
                stats.resident_vertices,
                stats.created,
                stats.evicted,
                stats.adopted,
                stats.discarded
            );
        }
    }

    fn finish(self, sim_secs: f64) -> FlightSummary {
        let summary = FlightSummary {
            ticks: self.ticks,
            sim_secs,
            final_z: self.flight.z(),
            max_resident: self.max_resident,
            stats: self.manager.stats(),
        };
        info!(
            "Flight done: {} ticks, {:.1}s, final z={:.1}, peak residency {}",
            summary.ticks, summary.sim_secs, summary.final_z, summary.max_resident
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vista_stream::WindowMargins;
    use vista_terrain::{BiasConfig, SegmentBuilder, SegmentLayout, TerrainConfigState};

    fn small_manager(seed: &str) -> TerrainWindowManager {
        TerrainWindowManager::new(
            TerrainConfigState::new(seed, BiasConfig::default()),
            SegmentBuilder::with_layout(SegmentLayout::new(10.0, 20.0, 4, 2)),
            WindowMargins {
                behind: 1,
                ahead: 3,
                prefetch: 0,
            },
        )
    }

    #[test]
    fn test_flight_moves_toward_negative_z() {
        let mut flight = Flight::new(5.0, 3.0);
        assert_eq!(flight.step(1.0), 2.0);
        assert_eq!(flight.step(0.5), 0.5);
        assert_eq!(flight.z(), 0.5);
    }

    #[test]
    fn test_headless_flight_keeps_window_bounded() {
        let mut manager = small_manager("fly");
        let summary = FlightDriver::new(&mut manager, Flight::new(0.0, 30.0))
            .run_headless(2.0, |_| {});

        assert!(summary.ticks >= 120 && summary.ticks <= 121);
        assert!(summary.final_z < -59.0);
        assert_eq!(summary.max_resident, 5);
        assert_eq!(manager.resident_count(), 5);
        assert!(summary.stats.evicted > 0);

        let window = manager.window().unwrap();
        for index in window.indices() {
            assert!(manager.segment(index).is_some());
        }
    }

    #[test]
    fn test_each_second_hook_runs_once_per_second() {
        let mut manager = small_manager("hook");
        let mut calls = 0;
        FlightDriver::new(&mut manager, Flight::new(0.0, 3.0)).run_headless(3.0, |_| calls += 1);
        assert!((3..=4).contains(&calls));
    }

    #[test]
    fn test_reseed_mid_flight() {
        let mut manager = small_manager("before");
        let summary = FlightDriver::new(&mut manager, Flight::new(0.0, 3.0))
            .with_reseed(0.5, Some("after".to_string()))
            .run_headless(1.0, |_| {});

        assert_eq!(summary.stats.rebuilds, 1);
        assert_eq!(manager.snapshot().seed(), "after");
        assert_eq!(manager.snapshot().generation(), 1);
        assert!(manager.segments().all(|s| s.generation() == 1));
    }

    #[test]
    fn test_same_seed_same_flight() {
        let mut a = small_manager("repeat");
        let mut b = small_manager("repeat");
        FlightDriver::new(&mut a, Flight::new(0.0, 12.0)).run_headless(1.0, |_| {});
        FlightDriver::new(&mut b, Flight::new(0.0, 12.0)).run_headless(1.0, |_| {});

        assert_eq!(a.resident_indices(), b.resident_indices());
        for (sa, sb) in a.segments().zip(b.segments()) {
            assert_eq!(sa, sb);
        }
    }
}
