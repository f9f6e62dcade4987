//! Backtest runner: wires loading, preprocessing and the engine together.
//!
//! Entry points:
//! - `run_from_config()`: loads the CSV named by the config, fills gaps, runs. Used by the CLI.
//! - `run_synthetic()`: same pipeline on generated data, tagged as synthetic.
//! - `run_from_daily()`: takes already-prepared daily observations. No I/O.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use creditlab_core::{run_backtest, BacktestOutcome, DailyObservation, EngineError};

use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::data_loader::{compute_dataset_hash, load_daily_csv, LoadError};
use crate::preprocess::{fill_forward, to_daily_observations};
use crate::synthetic::generate_synthetic_daily;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Where the daily data came from and what was done to it before the engine.
#[derive(Debug, Clone, Default)]
pub struct Provenance {
    pub label: String,
    pub has_synthetic: bool,
    pub filled_index_values: usize,
}

/// Complete result of one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub label: String,
    pub config: BacktestConfig,
    /// First and last daily dates fed to the engine.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_rows: usize,
    pub filled_index_values: usize,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub target_achieved: bool,
    pub data_quality_warnings: Vec<String>,
    pub outcome: BacktestOutcome,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn target_annual_return(&self) -> f64 {
        self.config.backtest.target_annual_return
    }
}

/// Load the configured CSV, fill gaps, and run.
pub fn run_from_config(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    config.validate()?;
    let mut loaded = load_daily_csv(&config.data.path, &config.data)?;

    let filled = if config.preprocess.fill_missing_index {
        fill_forward(&mut loaded.rows, config.preprocess.max_fill).filled
    } else {
        0
    };
    let daily = to_daily_observations(&loaded.rows)?;

    run_from_daily(
        &daily,
        config,
        Provenance {
            label: loaded.source,
            has_synthetic: false,
            filled_index_values: filled,
        },
    )
}

/// Run on generated data between `start` and `end`.
pub fn run_synthetic(
    config: &BacktestConfig,
    label: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    warn!(label, "generating synthetic data; results will be tagged as synthetic");
    let daily = generate_synthetic_daily(label, start, end);
    run_from_daily(
        &daily,
        config,
        Provenance {
            label: label.to_string(),
            has_synthetic: true,
            filled_index_values: 0,
        },
    )
}

/// Run the engine on prepared daily observations. No I/O.
pub fn run_from_daily(
    daily: &[DailyObservation],
    config: &BacktestConfig,
    provenance: Provenance,
) -> Result<BacktestResult, RunError> {
    let outcome = run_backtest(daily, &config.engine_config())?;
    let (start_date, end_date) = match (daily.first(), daily.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => return Err(EngineError::EmptyInput.into()),
    };

    let dataset_hash = compute_dataset_hash(daily);
    let run_id = config.run_id(&dataset_hash);
    let target = config.backtest.target_annual_return;
    let target_achieved = outcome.meets_target(target);

    let mut data_quality_warnings = Vec::new();
    if provenance.filled_index_values > 0 {
        data_quality_warnings.push(format!(
            "{} missing index levels were forward-filled",
            provenance.filled_index_values
        ));
    }
    let gap_dropped = outcome.weekly.gap_dropped();
    if gap_dropped > 0 {
        data_quality_warnings.push(format!(
            "{gap_dropped} weekly periods were dropped around weeks without data"
        ));
    }

    info!(
        run_id = %run_id,
        label = %provenance.label,
        target_achieved,
        "run complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        label: provenance.label,
        config: config.clone(),
        start_date,
        end_date,
        daily_rows: daily.len(),
        filled_index_values: provenance.filled_index_values,
        dataset_hash,
        has_synthetic: provenance.has_synthetic,
        target_achieved,
        data_quality_warnings,
        outcome,
    })
}
