//! Configuration loading and config file resolution
//!
//! All synchronizer tunables live in one TOML file. Every field has a
//! built-in default, so a missing file (or a file with only some keys)
//! still yields a complete [`SyncConfig`].
//!
//! # Config file resolution priority
//!
//! 1. Command-line argument (highest priority)
//! 2. `MVSYNC_CONFIG` environment variable
//! 3. Platform config directory (`<config_dir>/mvsync/config.toml`)
//! 4. Built-in defaults (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "MVSYNC_CONFIG";

/// How the buffer checker treats a player that reports no buffered ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingBufferPolicy {
    /// Exclude the player from the "all buffered" computation
    #[default]
    Ignore,
    /// Count the player as not buffered, stalling the session
    Stall,
}

/// Synchronizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Minimum time between timeupdate-driven synchronization passes
    pub sync_interval_ms: u64,

    /// Tolerated follower lag behind the master, in seconds
    pub sync_gap_secs: f64,

    /// Buffer checker period
    pub buffer_check_interval_ms: u64,

    /// Media that must be buffered ahead of the current position, in seconds
    pub buffer_lookahead_secs: f64,

    /// Notification channel capacity
    pub event_bus_capacity: usize,

    /// Treatment of players without buffered-range information
    pub missing_buffer_info: MissingBufferPolicy,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_interval_ms: 2000,
            sync_gap_secs: 1.0,
            buffer_check_interval_ms: 1000,
            buffer_lookahead_secs: 1.5,
            event_bus_capacity: 100,
            missing_buffer_info: MissingBufferPolicy::Ignore,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl SyncConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SyncConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    ///
    /// Unlike [`SyncConfig::load_or_default`], a missing file is an error here.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolve the config file and load it, falling back to defaults
    ///
    /// Missing config files are not fatal: a warning is logged and the
    /// built-in defaults are used. A file that exists but fails to parse or
    /// validate is reported as an error.
    pub fn load_or_default(cli_arg: Option<&Path>) -> Result<Self> {
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
                info!("No config file location available, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.sync_interval_ms == 0 {
            return Err(Error::Config("sync_interval_ms must be positive".to_string()));
        }
        if self.buffer_check_interval_ms == 0 {
            return Err(Error::Config(
                "buffer_check_interval_ms must be positive".to_string(),
            ));
        }
        if !self.sync_gap_secs.is_finite() || self.sync_gap_secs < 0.0 {
            return Err(Error::Config(format!(
                "sync_gap_secs must be a non-negative number, got {}",
                self.sync_gap_secs
            )));
        }
        if !self.buffer_lookahead_secs.is_finite() || self.buffer_lookahead_secs < 0.0 {
            return Err(Error::Config(format!(
                "buffer_lookahead_secs must be a non-negative number, got {}",
                self.buffer_lookahead_secs
            )));
        }
        if self.event_bus_capacity == 0 {
            return Err(Error::Config("event_bus_capacity must be positive".to_string()));
        }
        Ok(())
    }

    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }

    pub fn buffer_check_interval(&self) -> Duration {
        Duration::from_millis(self.buffer_check_interval_ms)
    }
}

/// Config file resolution
///
/// Returns the first candidate from the priority list; the caller decides
/// what to do if it does not exist.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path()
}

/// Get default configuration file path for the platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mvsync").join("config.toml"))
}
