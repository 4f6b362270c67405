//! Runtime settings.
//!
//! Three layers, highest first: `FIELDSALES_*` environment variables, a TOML
//! file, built-in defaults. Each source is read into a [`Layer`] of optional
//! values and layers are stacked field by field before validation.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub reporting: ReportingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Debug)]
pub struct ReportingConfig {
    /// Flag given to events created without an explicit cell-up choice.
    pub default_include_cell_up: bool,
    pub leaderboard_limit: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unsupported log format `{other}`")),
        }
    }
}

/// Where to look for the TOML file. `None` searches the working directory.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

pub const DEFAULT_CONFIG_FILE: &str = "fieldsales.toml";
const MAX_LEADERBOARD_LIMIT: usize = 1_000;
const MAX_TIMEOUT_SECS: u64 = 300;

/// A dotted setting key and the environment variables that override it,
/// checked in order.
#[derive(Clone, Copy, Debug)]
pub struct Setting {
    pub key: &'static str,
    pub env: &'static [&'static str],
}

pub const SETTINGS: [Setting; 7] = [
    Setting { key: "database.url", env: &["FIELDSALES_DATABASE_URL"] },
    Setting { key: "database.max_connections", env: &["FIELDSALES_DATABASE_MAX_CONNECTIONS"] },
    Setting { key: "database.timeout_secs", env: &["FIELDSALES_DATABASE_TIMEOUT_SECS"] },
    Setting { key: "logging.level", env: &["FIELDSALES_LOGGING_LEVEL", "FIELDSALES_LOG_LEVEL"] },
    Setting {
        key: "logging.format",
        env: &["FIELDSALES_LOGGING_FORMAT", "FIELDSALES_LOG_FORMAT"],
    },
    Setting {
        key: "reporting.default_include_cell_up",
        env: &["FIELDSALES_REPORTING_DEFAULT_INCLUDE_CELL_UP"],
    },
    Setting {
        key: "reporting.leaderboard_limit",
        env: &["FIELDSALES_REPORTING_LEADERBOARD_LIMIT"],
    },
];

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://fieldsales.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
            reporting: ReportingConfig { default_include_cell_up: false, leaderboard_limit: 20 },
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let file = match resolve_config_path(options.config_path.as_deref()) {
            Some(path) => Layer::from_file(&path)?,
            None => Layer::default(),
        };
        let config = Layer::from_env()?.over(file).resolve();
        config.validate()?;
        Ok(config)
    }

    /// Reports every invalid setting at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        let url = self.database.url.trim();
        if !(url.starts_with("sqlite:") || url == ":memory:") {
            problems.push("database.url must be a sqlite URL (`sqlite://...`, `sqlite::memory:`)");
        }
        if self.database.max_connections == 0 {
            problems.push("database.max_connections must be greater than zero");
        }
        if !(1..=MAX_TIMEOUT_SECS).contains(&self.database.timeout_secs) {
            problems.push("database.timeout_secs must be in range 1..=300");
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            problems.push("logging.level must be one of trace|debug|info|warn|error");
        }
        if !(1..=MAX_LEADERBOARD_LIMIT).contains(&self.reporting.leaderboard_limit) {
            problems.push("reporting.leaderboard_limit must be in range 1..=1000");
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems.join("; ")))
        }
    }

    /// Effective value of a [`SETTINGS`] key, rendered for display.
    pub fn value_of(&self, key: &str) -> Option<String> {
        let value = match key {
            "database.url" => self.database.url.clone(),
            "database.max_connections" => self.database.max_connections.to_string(),
            "database.timeout_secs" => self.database.timeout_secs.to_string(),
            "logging.level" => self.logging.level.clone(),
            "logging.format" => self.logging.format.as_str().to_string(),
            "reporting.default_include_cell_up" => {
                self.reporting.default_include_cell_up.to_string()
            }
            "reporting.leaderboard_limit" => self.reporting.leaderboard_limit.to_string(),
            _ => return None,
        };
        Some(value)
    }
}

/// Config file that [`AppConfig::load`] reads. An explicit path is returned
/// as given so a missing file surfaces as a read error.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), Path::new("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

/// First non-blank value among `keys`, with the key it came from.
pub fn env_override(keys: &[&'static str]) -> Option<(&'static str, String)> {
    keys.iter().find_map(|key| {
        env::var(key).ok().filter(|value| !value.trim().is_empty()).map(|value| (*key, value))
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct Layer {
    database: DatabaseLayer,
    logging: LoggingLayer,
    reporting: ReportingLayer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DatabaseLayer {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LoggingLayer {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ReportingLayer {
    default_include_cell_up: Option<bool>,
    leaderboard_limit: Option<usize>,
}

impl Layer {
    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
        toml::from_str(&raw)
            .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
    }

    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database: DatabaseLayer {
                url: env_text("database.url"),
                max_connections: env_parsed("database.max_connections")?,
                timeout_secs: env_parsed("database.timeout_secs")?,
            },
            logging: LoggingLayer {
                level: env_text("logging.level"),
                format: env_parsed("logging.format")?,
            },
            reporting: ReportingLayer {
                default_include_cell_up: env_parsed("reporting.default_include_cell_up")?,
                leaderboard_limit: env_parsed("reporting.leaderboard_limit")?,
            },
        })
    }

    /// Field-wise stack: values set in `self` hide those in `lower`.
    fn over(self, lower: Layer) -> Layer {
        Layer {
            database: DatabaseLayer {
                url: self.database.url.or(lower.database.url),
                max_connections: self.database.max_connections.or(lower.database.max_connections),
                timeout_secs: self.database.timeout_secs.or(lower.database.timeout_secs),
            },
            logging: LoggingLayer {
                level: self.logging.level.or(lower.logging.level),
                format: self.logging.format.or(lower.logging.format),
            },
            reporting: ReportingLayer {
                default_include_cell_up: self
                    .reporting
                    .default_include_cell_up
                    .or(lower.reporting.default_include_cell_up),
                leaderboard_limit: self
                    .reporting
                    .leaderboard_limit
                    .or(lower.reporting.leaderboard_limit),
            },
        }
    }

    /// Fills whatever no layer set from [`AppConfig::default`].
    fn resolve(self) -> AppConfig {
        let defaults = AppConfig::default();
        AppConfig {
            database: DatabaseConfig {
                url: self.database.url.unwrap_or(defaults.database.url),
                max_connections: self
                    .database
                    .max_connections
                    .unwrap_or(defaults.database.max_connections),
                timeout_secs: self.database.timeout_secs.unwrap_or(defaults.database.timeout_secs),
            },
            logging: LoggingConfig {
                level: self.logging.level.unwrap_or(defaults.logging.level),
                format: self.logging.format.unwrap_or(defaults.logging.format),
            },
            reporting: ReportingConfig {
                default_include_cell_up: self
                    .reporting
                    .default_include_cell_up
                    .unwrap_or(defaults.reporting.default_include_cell_up),
                leaderboard_limit: self
                    .reporting
                    .leaderboard_limit
                    .unwrap_or(defaults.reporting.leaderboard_limit),
            },
        }
    }
}

fn setting_env(key: &str) -> &'static [&'static str] {
    SETTINGS
        .iter()
        .find(|setting| setting.key == key)
        .map(|setting| setting.env)
        .unwrap_or_default()
}

fn env_text(key: &str) -> Option<String> {
    env_override(setting_env(key)).map(|(_, value)| value)
}

fn env_parsed<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    let Some((env_key, value)) = env_override(setting_env(key)) else {
        return Ok(None);
    };
    value.trim().parse::<T>().map(Some).map_err(|_| ConfigError::InvalidEnvOverride {
        key: env_key.to_string(),
        value,
    })
}
