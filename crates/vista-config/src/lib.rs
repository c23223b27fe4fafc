//! Configuration for the terrain fly-through.
//!
//! Settings persist to disk as RON, can be overridden from the command line
//! via clap, and tolerate missing or unknown fields so old and new config
//! files keep loading.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{CONFIG_FILE, Config, DebugConfig, FlightConfig, StreamConfig, WorldConfig};
pub use error::ConfigError;
