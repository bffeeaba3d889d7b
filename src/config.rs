//! logreplay configuration.
//!
//! Loaded from `~/.logreplay/config.toml`. A missing file means defaults.
//!
//! The playback rate is resolved through a chain:
//!
//! 1. `--rate <multiplier>`: explicit per-command override
//! 2. `LOGREPLAY_PLAYBACK_RATE` env var: process/session level
//! 3. `playback-rate` in the config file
//! 4. `1.0`

use std::{env, fs, io, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable consulted before the config file.
pub const RATE_ENV: &str = "LOGREPLAY_PLAYBACK_RATE";

/// logreplay configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Default multiplier for real-time playback.
    pub playback_rate: f64,

    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            playback_rate: 1.0,
            log_filter: None,
        }
    }
}

impl Config {
    /// Load config from `~/.logreplay/config.toml`, or defaults if absent.
    pub fn load() -> Result<Self, String> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("invalid config at {}: {e}", path.display()))?;

        if !(config.playback_rate.is_finite() && config.playback_rate > 0.0) {
            return Err(format!(
                "playback-rate must be a positive number in {}",
                path.display()
            ));
        }

        Ok(config)
    }

    /// The config file path: `~/.logreplay/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".logreplay").join("config.toml"))
    }

    /// Resolve the playback rate from flag, environment, then this config.
    pub fn resolve_rate(&self, explicit: Option<f64>) -> Result<f64, String> {
        // 1. Explicit --rate flag.
        if let Some(rate) = explicit {
            return Ok(rate);
        }

        // 2. LOGREPLAY_PLAYBACK_RATE environment variable.
        if let Ok(raw) = env::var(RATE_ENV)
            && !raw.is_empty()
        {
            return raw
                .parse()
                .map_err(|e| format!("invalid {RATE_ENV} value {raw:?}: {e}"));
        }

        // 3. Config file, which already holds the default when unset.
        Ok(self.playback_rate)
    }
}
