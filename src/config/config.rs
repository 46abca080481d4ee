use std::str::FromStr;

use config::{Config, ConfigError, File, FileFormat};
use log::{warn, LevelFilter};
use serde::Deserialize;

use crate::models::TvlKind;

/// Where the chain snapshot and custom column definitions are read from.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct InputSettings {
    /// JSON `ChainSnapshot` produced by the fetch layer.
    pub snapshot_path: String,
    #[serde(default = "default_columns_path")]
    pub columns_path: String,
}

fn default_columns_path() -> String {
    "columns.json".to_string()
}

/// Extra TVL categories folded into the headline figures.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TvlSettings {
    #[serde(default)]
    pub enabled: Vec<TvlKind>,
}

impl TvlSettings {
    /// Enabled keys that are actual toggles; anything else is logged and ignored.
    pub fn toggles(&self) -> Vec<TvlKind> {
        let mut toggles: Vec<TvlKind> = Vec::with_capacity(self.enabled.len());
        for kind in &self.enabled {
            if !kind.is_toggle() {
                warn!("Ignoring {} in tvl.enabled, not a toggleable TVL category", kind);
                continue;
            }
            if !toggles.contains(kind) {
                toggles.push(kind.clone());
            }
        }
        toggles
    }
}

/// Table sorting and TVL bounds.
#[derive(Debug, Deserialize, Clone)]
pub struct TableSettings {
    /// Alias (`fees_24h`), flattened path (`tvl_default_tvl`) or `custom:<column name>`.
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_descending")]
    pub descending: bool,
    #[serde(default)]
    pub min_tvl: Option<f64>,
    #[serde(default)]
    pub max_tvl: Option<f64>,
}

fn default_sort_by() -> String {
    "tvl".to_string()
}

fn default_descending() -> bool {
    true
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            sort_by: default_sort_by(),
            descending: default_descending(),
            min_tvl: None,
            max_tvl: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LoggingSettings {
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.level)
            .map_err(|_| ConfigError::Message(format!("Invalid log level {:?}", self.level)))
    }
}

/// Root application configuration.
///
/// Loaded from `config.yaml` at startup. Only `input.snapshot_path` is
/// required; every other section falls back to its defaults.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    pub input: InputSettings,
    #[serde(default)]
    pub tvl: TvlSettings,
    #[serde(default)]
    pub table: TableSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config"))
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(raw, FileFormat::Yaml))
            .build()?
            .try_deserialize()
    }
}
