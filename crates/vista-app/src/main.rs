//! The `vista` binary: a headless fly-through over procedural terrain.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};
use vista_app::AppError;
use vista_app::flight::{Flight, FlightDriver};
use vista_app::platform::PlatformDirs;
use vista_app::{preview, setup};
use vista_config::{CliArgs, Config};
use vista_stream::TerrainWindowManager;
use vista_terrain::debug_viz::PreviewKind;

#[derive(Parser, Debug)]
#[command(name = "vista", about = "Procedural terrain fly-through")]
struct VistaArgs {
    #[command(flatten)]
    config: CliArgs,

    /// Rebuild the world after this many simulated seconds.
    #[arg(long)]
    reseed_at: Option<f64>,

    /// Seed used by `--reseed-at` (random if omitted).
    #[arg(long, requires = "reseed_at")]
    reseed_seed: Option<String>,

    /// Pace the flight by the wall clock instead of simulating it at once.
    #[arg(long)]
    realtime: bool,
}

/// Watches `config.ron` during the flight and rebuilds the world when its
/// world section changes.
struct ConfigWatch<'a> {
    config_dir: &'a Path,
    cli: &'a CliArgs,
    file: Config,
    active: Config,
}

impl ConfigWatch<'_> {
    fn poll(&mut self, manager: &mut TerrainWindowManager) {
        let file = match self.file.reload(self.config_dir) {
            Ok(Some(file)) => file,
            Ok(None) => return,
            Err(e) => {
                warn!("Ignoring config change: {e}");
                return;
            }
        };

        let mut next = file.clone();
        next.apply_cli_overrides(self.cli);
        if next.world.seed.as_deref().is_none_or(str::is_empty) {
            next.world.seed = self.active.world.seed.clone();
        }

        if self.active.world_changed(&next) {
            manager.rebuild(next.world.seed.clone(), &setup::bias_overrides(&next.world));
        }
        self.file = file;
        self.active = next;
    }
}

fn run(args: VistaArgs) -> Result<(), AppError> {
    let dirs = PlatformDirs::resolve_and_create(args.config.config.as_deref())?;

    let mut file_config = Config::load_or_create(&dirs.config_dir)?;
    let mut config = file_config.clone();
    config.apply_cli_overrides(&args.config);

    let generated = setup::ensure_seed(&mut config);
    if let Some(seed) = &generated {
        file_config.world.seed = Some(seed.clone());
        file_config.save(&dirs.config_dir)?;
    }

    let log_file = vista_log::init_logging(
        Some(&dirs.log_dir),
        cfg!(debug_assertions),
        Some(&config),
    );
    info!("Config directory: {}", dirs.config_dir.display());
    if let Some(path) = log_file {
        info!("Logging to {}", path.display());
    }
    if let Some(seed) = &generated {
        info!("Generated world seed '{seed}' and saved it to config");
    }

    let mut manager = setup::build_manager(&config)?;
    let mut watch = ConfigWatch {
        config_dir: &dirs.config_dir,
        cli: &args.config,
        file: file_config,
        active: config.clone(),
    };

    let flight = Flight::new(config.flight.start_z, config.flight.speed);
    let mut driver = FlightDriver::new(&mut manager, flight);
    if let Some(at) = args.reseed_at {
        driver = driver.with_reseed(at, args.reseed_seed.clone());
    }
    let duration = config.flight.duration_secs;
    let summary = if args.realtime {
        driver.run_realtime(duration, |m| watch.poll(m))
    } else {
        driver.run_headless(duration, |m| watch.poll(m))
    };
    info!(
        "Streamed {} segments ({} adopted from prefetch, {} stale discarded)",
        summary.stats.created + summary.stats.adopted,
        summary.stats.adopted,
        summary.stats.discarded
    );

    if let Some(path) = &config.debug.preview_path {
        let kind = PreviewKind::from_name(&config.debug.preview_kind).unwrap_or_else(|| {
            warn!(
                "Unknown preview kind '{}', using color",
                config.debug.preview_kind
            );
            PreviewKind::Color
        });
        let image = preview::render_window_preview(&manager, kind, config.debug.preview_scale);
        preview::write_png(&image, path)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(VistaArgs::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("vista: {e}");
            ExitCode::FAILURE
        }
    }
}
