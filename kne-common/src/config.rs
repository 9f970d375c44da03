//! Configuration loading and config file resolution
//!
//! Bootstrap configuration comes from a TOML file. Missing files are not an
//! error: the engine logs a warning and runs on built-in defaults.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `KNE_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/kne/config.toml`)
//! 4. None (built-in defaults)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "KNE_CONFIG";

/// Engine bootstrap configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding pre-rendered sound assets
    pub assets_dir: PathBuf,

    /// SQLite database holding the settings table
    pub database_path: PathBuf,

    /// Optional asset variant (locale or sound pack), e.g. "es" or "soft"
    pub sound_variant: Option<String>,

    /// Interval of the background context monitor (0 disables it)
    pub context_check_interval_secs: u64,

    pub audio: AudioConfig,

    pub logging: LoggingConfig,
}

/// Audio backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Use the effects-capable graph backend when a device supports it
    pub prefer_graph_backend: bool,
    /// Low-shelf bass boost on every voice (graph backend only)
    pub bass_boost: bool,
    /// Convolution reverb on every voice (graph backend only)
    pub reverb: bool,
    /// Initial master volume (0.0-1.0)
    pub master_volume: f32,
    /// Output device name (None = system default)
    pub device: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            assets_dir: data_dir.join("sounds"),
            database_path: data_dir.join("kne.db"),
            sound_variant: None,
            context_check_interval_secs: 60,
            audio: AudioConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            prefer_graph_backend: true,
            bass_boost: false,
            reverb: false,
            master_volume: 0.8,
            device: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: EngineConfig =
            toml::from_str(text).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        config.audio.master_volume = config.audio.master_volume.clamp(0.0, 1.0);
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Resolve and load configuration, degrading to defaults
    ///
    /// A missing config file logs a warning and yields defaults. A file that
    /// exists but fails to parse is an error.
    pub fn load(cli_arg: Option<&Path>) -> Result<Self> {
        match resolve_config_path(cli_arg) {
            Some(path) if path.exists() => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(&path)
            }
            Some(path) => {
                warn!(
                    "Config file {} not found, using built-in defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                warn!("No config file location available, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Resolve the config file location following the priority order above
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: platform config directory
    dirs::config_dir().map(|d| d.join("kne").join("config.toml"))
}

/// OS-dependent default data folder
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("kne"))
        .unwrap_or_else(|| PathBuf::from("./kne_data"))
}
