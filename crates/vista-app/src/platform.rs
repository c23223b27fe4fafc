//! OS directory resolution for config, data and logs.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors resolving or creating application directories.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The OS did not provide a configuration directory.
    #[error("could not determine OS configuration directory")]
    NoConfigDir,
    #[error("platform I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Directory name used under each OS base directory.
pub const APP_NAME: &str = "vista";

/// OS-specific directories for the fly-through.
///
/// Follows XDG on Linux, Known Folders on Windows and `Library` on macOS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformDirs {
    /// Holds `config.ron`.
    pub config_dir: PathBuf,
    /// Default location for preview images.
    pub data_dir: PathBuf,
    /// Log files.
    pub log_dir: PathBuf,
}

impl PlatformDirs {
    /// Resolve directories without creating them on disk.
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::NoConfigDir`] if the OS does not expose a
    /// configuration directory.
    pub fn resolve() -> Result<Self, PlatformError> {
        let app_config = dirs::config_dir()
            .ok_or(PlatformError::NoConfigDir)?
            .join(APP_NAME);
        let data_dir = dirs::data_dir()
            .map(|d| d.join(APP_NAME))
            .unwrap_or_else(|| app_config.join("data"));

        Ok(Self {
            log_dir: app_config.join("logs"),
            config_dir: app_config,
            data_dir,
        })
    }

    /// Resolve directories, honouring an explicit config directory, and
    /// create them on disk.
    pub fn resolve_and_create(config_override: Option<&Path>) -> Result<Self, PlatformError> {
        let mut dirs = Self::resolve()?;
        if let Some(dir) = config_override {
            dirs.config_dir = dir.to_path_buf();
        }
        dirs.create_dirs()?;
        Ok(dirs)
    }

    /// Resolve directories under a custom root. Used by tests.
    pub fn resolve_with_root(root: &Path) -> Self {
        let app_dir = root.join(APP_NAME);
        Self {
            config_dir: app_dir.join("config"),
            data_dir: app_dir.join("data"),
            log_dir: app_dir.join("logs"),
        }
    }

    /// Create every directory in `self`.
    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}
