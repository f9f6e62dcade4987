//! TOML backtest configuration.
//!
//! ```toml
//! [data]
//! path = "data/raw/with_er_daily.csv"
//! signal_column = "signal"
//!
//! [backtest]
//! resample = "W-FRI"
//! target_annual_return = 0.04
//! ```
//!
//! Everything except `data.path` has a default.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use creditlab_core::{EngineConfig, WeekAnchor};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content-addressable run identifier (BLAKE3 hex).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete configuration for one backtest run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    #[serde(default)]
    pub backtest: BacktestSection,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Where the daily series lives and which columns carry it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    pub path: PathBuf,
    #[serde(default = "default_date_column")]
    pub date_column: String,
    #[serde(default = "default_index_column")]
    pub index_column: String,
    #[serde(default = "default_signal_column")]
    pub signal_column: String,
    /// Inclusive lower date bound.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper date bound.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Gap handling for blank index levels. Signals are never filled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreprocessConfig {
    #[serde(default = "default_true")]
    pub fill_missing_index: bool,
    #[serde(default = "default_max_fill")]
    pub max_fill: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestSection {
    #[serde(default)]
    pub resample: WeekAnchor,
    #[serde(default = "default_target")]
    pub target_annual_return: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_date_column() -> String {
    "Date".into()
}

fn default_index_column() -> String {
    "cad_ig_er_index".into()
}

fn default_signal_column() -> String {
    "signal".into()
}

fn default_true() -> bool {
    true
}

fn default_max_fill() -> usize {
    5
}

fn default_target() -> f64 {
    0.04
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            fill_missing_index: true,
            max_fill: default_max_fill(),
        }
    }
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            resample: WeekAnchor::default(),
            target_annual_return: default_target(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl DataConfig {
    /// Default column names for a CSV at `path`.
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            date_column: default_date_column(),
            index_column: default_index_column(),
            signal_column: default_signal_column(),
            start_date: None,
            end_date: None,
        }
    }
}

impl BacktestConfig {
    /// Defaults everywhere except the data path.
    pub fn for_csv(path: impl Into<PathBuf>) -> Self {
        Self {
            data: DataConfig::for_path(path),
            preprocess: PreprocessConfig::default(),
            backtest: BacktestSection::default(),
            output: OutputConfig::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("data.date_column", &self.data.date_column),
            ("data.index_column", &self.data.index_column),
            ("data.signal_column", &self.data.signal_column),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{key} must not be empty")));
            }
        }
        if let (Some(start), Some(end)) = (self.data.start_date, self.data.end_date) {
            if start > end {
                return Err(ConfigError::Invalid(format!(
                    "data.start_date {start} is after data.end_date {end}"
                )));
            }
        }
        if !self.backtest.target_annual_return.is_finite() {
            return Err(ConfigError::Invalid(
                "backtest.target_annual_return must be finite".into(),
            ));
        }
        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            anchor: self.backtest.resample,
        }
    }

    /// Deterministic id over this config and the dataset it ran on.
    pub fn run_id(&self, dataset_hash: &str) -> RunId {
        let mut hasher = blake3::Hasher::new();
        // serializing plain data structs cannot fail
        let json = serde_json::to_string(self).unwrap_or_default();
        hasher.update(json.as_bytes());
        hasher.update(dataset_hash.as_bytes());
        hasher.finalize().to_hex().to_string()
    }
}
