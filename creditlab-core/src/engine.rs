//! Backtest engine: daily series in, weekly series + metrics + ledger out.
//!
//! Stateless: every call owns its intermediate data, so independent runs
//! never share results.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::{DailyObservation, Trade, WeekAnchor};
use crate::error::EngineError;
use crate::ledger::reconstruct_trades;
use crate::metrics::{MetricsBundle, MIN_PERIODS};
use crate::resample::{resample_weekly, WeeklySeries};

/// Engine parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Weekly bucket rule (default `W-FRI`).
    pub anchor: WeekAnchor,
}

/// Everything one engine run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestOutcome {
    pub weekly: WeeklySeries,
    pub strategy: MetricsBundle,
    pub benchmark: MetricsBundle,
    pub trades: Vec<Trade>,
}

impl BacktestOutcome {
    /// Annualized strategy return meets or beats `threshold`.
    pub fn meets_target(&self, threshold: f64) -> bool {
        self.strategy.annualized_return >= threshold
    }
}

/// Run the full pipeline: validate, resample with lag, metrics, ledger.
pub fn run_backtest(
    daily: &[DailyObservation],
    config: &EngineConfig,
) -> Result<BacktestOutcome, EngineError> {
    let weekly = resample_weekly(daily, config.anchor)?;
    if weekly.len() < MIN_PERIODS {
        return Err(EngineError::InsufficientData {
            periods: weekly.len(),
            required: MIN_PERIODS,
        });
    }

    let observations = &weekly.observations;
    let (strategy, benchmark) = rayon::join(
        || MetricsBundle::strategy(observations),
        || MetricsBundle::benchmark(observations),
    );
    let strategy = strategy?;
    let benchmark = benchmark?;
    let trades = reconstruct_trades(observations)?;

    info!(
        anchor = %config.anchor,
        periods = strategy.periods,
        trades = trades.len(),
        strategy_annualized = strategy.annualized_return,
        benchmark_annualized = benchmark.annualized_return,
        "backtest complete"
    );

    Ok(BacktestOutcome {
        weekly,
        strategy,
        benchmark,
        trades,
    })
}
