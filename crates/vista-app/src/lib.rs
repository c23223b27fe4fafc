//! Headless terrain fly-through.
//!
//! Wires configuration, logging and the streaming window together and drives
//! a viewpoint along the travel axis on a fixed timestep.

pub mod flight;
pub mod game_loop;
pub mod platform;
pub mod preview;
pub mod setup;

use thiserror::Error;

/// Anything that can stop the fly-through.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Platform(#[from] platform::PlatformError),

    #[error(transparent)]
    Config(#[from] vista_config::ConfigError),

    #[error("failed to start segment workers: {0}")]
    Workers(#[source] std::io::Error),

    #[error(transparent)]
    Preview(#[from] preview::PreviewError),
}
