//! Structured logging for the terrain fly-through.
//!
//! Console output through `tracing-subscriber` with uptime timestamps and
//! module targets, plus a JSON log file in debug builds. The level comes from
//! `RUST_LOG` if set, otherwise from the config's `debug.log_level`.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use vista_config::Config;

/// Filter used when neither `RUST_LOG` nor the config names a level.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "vista.log";

/// Filter directive derived from the config.
///
/// A bare level such as `debug` applies to the workspace crates only, leaving
/// dependencies at `info`. Anything else (e.g. `warn,vista_stream=trace`) is
/// used verbatim.
pub fn filter_directive(config: Option<&Config>) -> String {
    let level = config
        .map(|c| c.debug.log_level.trim())
        .filter(|l| !l.is_empty());
    match level {
        None => DEFAULT_FILTER.to_string(),
        Some(level) if is_bare_level(level) => {
            let level = level.to_ascii_lowercase();
            format!(
                "{DEFAULT_FILTER},vista={level},vista_app={level},vista_terrain={level},vista_stream={level},vista_config={level}"
            )
        }
        Some(directive) => directive.to_string(),
    }
}

fn is_bare_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "error" | "warn" | "info" | "debug" | "trace" | "off"
    )
}

/// Path of the JSON log file inside `log_dir`.
pub fn log_file_path(log_dir: &Path) -> PathBuf {
    log_dir.join(LOG_FILE_NAME)
}

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - enables file logging
/// * `config` - source of the log level when `RUST_LOG` is unset
///
/// Returns the log file path if file logging was enabled. Calling this more
/// than once keeps the first subscriber.
pub fn init_logging(
    log_dir: Option<&Path>,
    debug_build: bool,
    config: Option<&Config>,
) -> Option<PathBuf> {
    let directive = filter_directive(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_file_path(log_dir))
    {
        let file_layer = fmt::layer()
            .with_writer(Mutex::new(log_file))
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        let path = log_file_path(log_dir);
        return subscriber.with(file_layer).try_init().ok().map(|()| path);
    }

    let _ = subscriber.try_init();
    None
}
