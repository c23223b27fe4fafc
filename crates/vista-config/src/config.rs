//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name inside the config directory.
pub const CONFIG_FILE: &str = "config.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Seed and biome biases.
    pub world: WorldConfig,
    /// Segment size and window margins.
    pub stream: StreamConfig,
    /// Fly-through driver.
    pub flight: FlightConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// World generation inputs. These fully determine the terrain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed. `None` means generate one on first start and persist it.
    pub seed: Option<String>,
    pub desert_bias: f64,
    pub forest_bias: f64,
    pub plateau_bias: f64,
    pub mountain_bias: f64,
    /// Fraction of the ocean field treated as water, `[0, 1]`.
    pub ocean_threshold: f64,
}

/// Segment streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamConfig {
    /// Segment extent along the travel axis.
    pub segment_length: f64,
    /// Segment extent across the travel axis.
    pub segment_width: f64,
    /// Grid quads across the width.
    pub columns: u32,
    /// Grid quads along the length.
    pub rows: u32,
    /// Segments kept behind the viewpoint.
    pub behind: u32,
    /// Segments kept ahead of the viewpoint.
    pub ahead: u32,
    /// Segments generated in the background beyond `ahead` (0 disables).
    pub prefetch: u32,
    /// Background worker threads (0 = from CPU count).
    pub worker_threads: usize,
}

/// Fly-through configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FlightConfig {
    /// Travel speed along −Z in world units per second.
    pub speed: f64,
    /// Starting travel-axis coordinate.
    pub start_z: f64,
    /// Simulated flight duration in seconds.
    pub duration_secs: f64,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Write a PNG preview of the final window here, if set.
    pub preview_path: Option<PathBuf>,
    /// Preview kind: "color", "height" or "biome".
    pub preview_kind: String,
    /// Preview pixels per world unit.
    pub preview_scale: f64,
}

// --- Default implementations ---

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: None,
            desert_bias: 1.0,
            forest_bias: 1.0,
            plateau_bias: 1.0,
            mountain_bias: 1.0,
            ocean_threshold: 0.35,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            segment_length: 50.0,
            segment_width: 100.0,
            columns: 64,
            rows: 32,
            behind: 1,
            ahead: 6,
            prefetch: 2,
            worker_threads: 0,
        }
    }
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            speed: 3.0,
            start_z: 0.0,
            duration_secs: 60.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            preview_path: None,
            preview_kind: "color".to_string(),
            preview_scale: 2.0,
        }
    }
}

// --- Load / Save / Reload ---

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let config = read_config(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::Write {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized = ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::Serialize)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::Write {
            path: config_path,
            source,
        })
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = read_config(&config_dir.join(CONFIG_FILE))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Returns `true` if any world input differs, meaning the terrain must be
    /// rebuilt.
    pub fn world_changed(&self, other: &Config) -> bool {
        self.world != other.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("segment_length: 50.0"));
        assert!(ron_str.contains("speed: 3.0"));
        assert!(ron_str.contains("seed: None"));
    }

    #[test]
    fn test_config_roundtrip_with_seed() {
        let mut config = Config::default();
        config.world.seed = Some("canyon-7".to_string());
        config.debug.preview_path = Some(PathBuf::from("out/preview.png"));
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(world: (seed: Some(\"abc\")), debug: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.world.seed.as_deref(), Some("abc"));
        assert_eq!(config.world.desert_bias, 1.0);
        assert_eq!(config.stream, StreamConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.world.seed = Some("persisted".to_string());
        config.world.mountain_bias = 2.5;
        config.stream.ahead = 10;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        Config::default().save(&nested).unwrap();
        assert!(nested.join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_reload_detects_world_change() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.world.ocean_threshold = 0.6;
        modified.save(dir.path()).unwrap();

        let reloaded = config.reload(dir.path()).unwrap().unwrap();
        assert_eq!(reloaded.world.ocean_threshold, 0.6);
        assert!(config.world_changed(&reloaded));
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();
        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "{{not valid}}").unwrap();
        let err = Config::load_or_create(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(err.path(), Some(dir.path().join(CONFIG_FILE).as_path()));
    }

    #[test]
    fn test_ron_comments_accepted() {
        let ron_str = "// world settings\n(\n  // nothing overridden\n)";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config, Config::default());
    }
}
