//! Command-line overrides for the configuration.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Terrain fly-through command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "vista", about = "Procedural terrain fly-through")]
pub struct CliArgs {
    /// World seed (any string).
    #[arg(long)]
    pub seed: Option<String>,

    /// Desert weight multiplier.
    #[arg(long)]
    pub desert_bias: Option<f64>,

    /// Forest weight multiplier.
    #[arg(long)]
    pub forest_bias: Option<f64>,

    /// Plateau weight multiplier.
    #[arg(long)]
    pub plateau_bias: Option<f64>,

    /// Mountain weight multiplier.
    #[arg(long)]
    pub mountain_bias: Option<f64>,

    /// Ocean threshold in [0, 1]; higher means more water.
    #[arg(long)]
    pub ocean_threshold: Option<f64>,

    /// Segments kept behind the viewpoint.
    #[arg(long)]
    pub behind: Option<u32>,

    /// Segments kept ahead of the viewpoint.
    #[arg(long)]
    pub ahead: Option<u32>,

    /// Segments generated in the background (0 disables).
    #[arg(long)]
    pub prefetch: Option<u32>,

    /// Travel speed in units per second.
    #[arg(long)]
    pub speed: Option<f64>,

    /// Simulated flight duration in seconds.
    #[arg(long)]
    pub duration: Option<f64>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Write a PNG preview of the final window to this path.
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref seed) = args.seed {
            self.world.seed = Some(seed.clone());
        }
        if let Some(v) = args.desert_bias {
            self.world.desert_bias = v;
        }
        if let Some(v) = args.forest_bias {
            self.world.forest_bias = v;
        }
        if let Some(v) = args.plateau_bias {
            self.world.plateau_bias = v;
        }
        if let Some(v) = args.mountain_bias {
            self.world.mountain_bias = v;
        }
        if let Some(v) = args.ocean_threshold {
            self.world.ocean_threshold = v;
        }
        if let Some(n) = args.behind {
            self.stream.behind = n;
        }
        if let Some(n) = args.ahead {
            self.stream.ahead = n;
        }
        if let Some(n) = args.prefetch {
            self.stream.prefetch = n;
        }
        if let Some(speed) = args.speed {
            self.flight.speed = speed;
        }
        if let Some(secs) = args.duration {
            self.flight.duration_secs = secs;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(ref path) = args.preview {
            self.debug.preview_path = Some(path.clone());
        }
    }
}
