//! Runtime configuration for the `cook` binary.
//!
//! Each setting is resolved in priority order:
//! 1. Command-line flag
//! 2. Environment variable (`COOK_DB_URL`, `COOK_PAGE_WIDTH`, `COOK_LOG`)
//! 3. TOML config file (`--config`, or `cook.toml` in the working directory)
//! 4. Compiled default

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;
use services::WalkerSettings;
use thiserror::Error;

pub const DEFAULT_DB_URL: &str = "sqlite://cook.sqlite3?mode=rwc";
pub const DEFAULT_CONFIG_FILE: &str = "cook.toml";
pub const DEFAULT_LOG_FILTER: &str = "cook=info,services=info,storage=warn";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid {key} value {raw:?}")]
    Invalid { key: &'static str, raw: String },
}

/// Keys accepted in `cook.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub db_url: Option<String>,
    pub page_width: Option<f64>,
    pub animation_ms: Option<i64>,
    pub log: Option<String>,
}

impl FileConfig {
    /// Load the explicit file, or `cook.toml` if it exists.
    ///
    /// A missing explicit file is an error; a missing default file is not.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Read` or `ConfigError::Parse`.
    pub fn load(explicit: Option<&Path>) -> Result<Option<Self>, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(None);
                }
                default
            }
        };

        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&raw)
            .map(Some)
            .map_err(|source| ConfigError::Parse { path, source })
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db_url: Option<String>,
    pub page_width: Option<f64>,
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_url: String,
    pub walker: WalkerSettings,
    pub log_filter: String,
}

impl AppConfig {
    /// Resolve against the process environment.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::resolve_with`].
    pub fn resolve(cli: &CliOverrides, file: Option<FileConfig>) -> Result<Self, ConfigError> {
        Self::resolve_with(cli, |key| std::env::var(key).ok(), file)
    }

    /// Resolve with an injectable environment lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for an unparsable or non-positive page
    /// width, a negative animation length, or an empty database URL.
    pub fn resolve_with(
        cli: &CliOverrides,
        env: impl Fn(&str) -> Option<String>,
        file: Option<FileConfig>,
    ) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();

        let db_url = cli
            .db_url
            .clone()
            .or_else(|| env("COOK_DB_URL"))
            .or(file.db_url)
            .unwrap_or_else(|| DEFAULT_DB_URL.to_string());
        if db_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "db_url",
                raw: db_url,
            });
        }

        let page_width = match cli.page_width {
            Some(width) => width,
            None => match env("COOK_PAGE_WIDTH") {
                Some(raw) => raw.trim().parse::<f64>().map_err(|_| ConfigError::Invalid {
                    key: "page_width",
                    raw: raw.clone(),
                })?,
                None => file.page_width.unwrap_or(WalkerSettings::DEFAULT_PAGE_WIDTH),
            },
        };
        if !page_width.is_finite() || page_width <= 0.0 {
            return Err(ConfigError::Invalid {
                key: "page_width",
                raw: page_width.to_string(),
            });
        }

        let animation = match file.animation_ms {
            Some(ms) if ms < 0 => {
                return Err(ConfigError::Invalid {
                    key: "animation_ms",
                    raw: ms.to_string(),
                });
            }
            Some(ms) => Duration::milliseconds(ms),
            None => WalkerSettings::default().animation,
        };

        let log_filter = env("COOK_LOG")
            .or(file.log)
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        Ok(Self {
            db_url,
            walker: WalkerSettings {
                page_width,
                animation,
            },
            log_filter,
        })
    }
}
