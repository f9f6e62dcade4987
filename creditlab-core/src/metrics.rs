//! Performance metrics over weekly return streams.
//!
//! Every metric is a pure function: return slice in, scalar out. The bundle
//! constructors only wire them together and apply the reporting policies:
//!
//! - annualization uses the actual valid period count ÷ 52
//! - volatility is the population standard deviation × √52
//! - a zero Sharpe/Sortino denominator yields exactly 0 and sets a flag
//! - strategy win rate divides by invested periods, benchmark by all periods

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::{Stream, WeeklyObservation};
use crate::error::EngineError;
use crate::resample::compound;

/// Rebalance periods per year.
pub const PERIODS_PER_YEAR: f64 = 52.0;

/// Denominators at or below this are treated as zero.
const ZERO_DENOMINATOR: f64 = 1e-15;

/// Minimum number of valid periods for a metrics bundle.
pub const MIN_PERIODS: usize = 2;

/// Which ratios in a bundle were forced to 0 by a zero denominator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Degeneracy {
    /// Volatility was zero; `sharpe_ratio` is the policy value 0.
    pub sharpe: bool,
    /// No negative period (or zero downside deviation); `sortino_ratio` is 0.
    pub sortino: bool,
}

impl Degeneracy {
    pub fn any(&self) -> bool {
        self.sharpe || self.sortino
    }
}

/// Scalar performance statistics for one return stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsBundle {
    pub stream: Stream,
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    /// Fraction of periods held long. Always 1.0 for the benchmark.
    pub exposure: f64,
    pub periods: usize,
    pub years: f64,
    pub degenerate: Degeneracy,
}

impl MetricsBundle {
    /// Metrics for the lagged-signal strategy stream.
    pub fn strategy(weekly: &[WeeklyObservation]) -> Result<Self, EngineError> {
        let returns: Vec<f64> = weekly.iter().map(|w| w.strategy_return).collect();
        let invested = weekly.iter().filter(|w| w.is_invested()).count();
        let winners = returns.iter().filter(|&&r| r > 0.0).count();

        let win_rate = ratio_or_zero(winners, invested);
        let exposure = ratio_or_zero(invested, weekly.len());
        Self::from_returns(Stream::Strategy, &returns, win_rate, exposure)
    }

    /// Metrics for passive buy-and-hold of the index.
    pub fn benchmark(weekly: &[WeeklyObservation]) -> Result<Self, EngineError> {
        let returns: Vec<f64> = weekly.iter().map(|w| w.benchmark_return).collect();
        let winners = returns.iter().filter(|&&r| r > 0.0).count();

        let win_rate = ratio_or_zero(winners, returns.len());
        Self::from_returns(Stream::Benchmark, &returns, win_rate, 1.0)
    }

    fn from_returns(
        stream: Stream,
        returns: &[f64],
        win_rate: f64,
        exposure: f64,
    ) -> Result<Self, EngineError> {
        if returns.len() < MIN_PERIODS {
            return Err(EngineError::InsufficientData {
                periods: returns.len(),
                required: MIN_PERIODS,
            });
        }

        let cumulative = compound(returns);
        let total_return = cumulative.last().copied().unwrap_or(f64::NAN);
        if !total_return.is_finite() {
            return Err(EngineError::UndefinedStatistic {
                stream,
                metric: "total_return",
            });
        }

        let periods = returns.len();
        let years = periods as f64 / PERIODS_PER_YEAR;
        let annualized_return = annualized_return(total_return, years);
        if !annualized_return.is_finite() {
            return Err(EngineError::UndefinedStatistic {
                stream,
                metric: "annualized_return",
            });
        }

        let volatility = annualized_volatility(returns);
        let downside = downside_deviation(returns);

        let mut degenerate = Degeneracy::default();
        let sharpe_ratio = match policy_ratio(annualized_return, Some(volatility)) {
            Some(r) => r,
            None => {
                degenerate.sharpe = true;
                0.0
            }
        };
        let sortino_ratio = match policy_ratio(annualized_return, downside) {
            Some(r) => r,
            None => {
                degenerate.sortino = true;
                0.0
            }
        };
        if degenerate.any() {
            warn!(
                %stream,
                sharpe = degenerate.sharpe,
                sortino = degenerate.sortino,
                "zero-risk denominator, ratio reported as 0"
            );
        }

        Ok(Self {
            stream,
            total_return,
            annualized_return,
            volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown: max_drawdown(&cumulative),
            win_rate,
            exposure,
            periods,
            years,
            degenerate,
        })
    }

    /// Metric name → value, using the published metric names.
    pub fn as_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("total_return", self.total_return),
            ("annualized_return", self.annualized_return),
            ("volatility", self.volatility),
            ("sharpe_ratio", self.sharpe_ratio),
            ("sortino_ratio", self.sortino_ratio),
            ("max_drawdown", self.max_drawdown),
            ("win_rate", self.win_rate),
            ("exposure", self.exposure),
            ("periods", self.periods as f64),
            ("years", self.years),
        ])
    }

    /// Invested period count implied by exposure (the strategy win-rate denominator).
    pub fn invested_periods(&self) -> usize {
        (self.exposure * self.periods as f64).round() as usize
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Geometric annualization: `(1 + total)^(1/years) − 1`.
pub fn annualized_return(total_return: f64, years: f64) -> f64 {
    if years <= 0.0 {
        return f64::NAN;
    }
    (1.0 + total_return).powf(1.0 / years) - 1.0
}

/// Population standard deviation of periodic returns × √52.
pub fn annualized_volatility(returns: &[f64]) -> f64 {
    population_std(returns).unwrap_or(0.0) * PERIODS_PER_YEAR.sqrt()
}

/// Population standard deviation of strictly negative returns × √52.
///
/// `None` when no period is negative.
pub fn downside_deviation(returns: &[f64]) -> Option<f64> {
    let negatives: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    population_std(&negatives).map(|s| s * PERIODS_PER_YEAR.sqrt())
}

/// Worst decline of `1 + cumulative` from its running peak, as a negative fraction.
///
/// The watermark starts at the first period's compounded value. Returns 0.0
/// for a non-decreasing series.
pub fn max_drawdown(cumulative: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut max_dd = 0.0_f64;

    for &cum in cumulative {
        let value = 1.0 + cum;
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let dd = value / peak - 1.0;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

// ─── Helpers ────────────────────────────────────────────────────────

/// `numerator / denominator`, or `None` when the denominator is zero.
fn policy_ratio(numerator: f64, denominator: Option<f64>) -> Option<f64> {
    match denominator {
        Some(d) if d > ZERO_DENOMINATOR => Some(numerator / d),
        _ => None,
    }
}

fn ratio_or_zero(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64
}

pub(crate) fn mean_f64(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub(crate) fn population_std(values: &[f64]) -> Option<f64> {
    let mean = mean_f64(values)?;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn weekly(returns: &[f64], lagged: &[u8]) -> Vec<WeeklyObservation> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 12).unwrap();
        let strategy: Vec<f64> = returns
            .iter()
            .zip(lagged)
            .map(|(r, &s)| r * f64::from(s))
            .collect();
        let cum_s = compound(&strategy);
        let cum_b = compound(returns);
        let mut level = 100.0;
        returns
            .iter()
            .enumerate()
            .map(|(i, &r)| {
                level *= 1.0 + r;
                WeeklyObservation {
                    period_end_date: start + Duration::weeks(i as i64),
                    index_level: level,
                    benchmark_return: r,
                    signal_raw: lagged.get(i + 1).copied().unwrap_or(0),
                    signal_lagged: lagged[i],
                    strategy_return: strategy[i],
                    cum_return_strategy: cum_s[i],
                    cum_return_benchmark: cum_b[i],
                }
            })
            .collect()
    }

    // ── Annualization ──

    #[test]
    fn one_year_of_periods_annualizes_to_total() {
        let a = annualized_return(0.05, 1.0);
        assert!((a - 0.05).abs() < 1e-12);
    }

    #[test]
    fn half_year_annualizes_geometrically() {
        let a = annualized_return(0.02, 0.5);
        assert!((a - (1.02_f64.powi(2) - 1.0)).abs() < 1e-12);
    }

    // ── Volatility ──

    #[test]
    fn volatility_uses_population_std() {
        // values 0.01, -0.01: population std = 0.01
        let v = annualized_volatility(&[0.01, -0.01]);
        assert!((v - 0.01 * 52.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn constant_returns_have_zero_volatility() {
        assert_eq!(annualized_volatility(&[0.0, 0.0, 0.0]), 0.0);
    }

    // ── Downside ──

    #[test]
    fn downside_ignores_non_negative_returns() {
        let d = downside_deviation(&[0.05, -0.01, 0.0, -0.03]).unwrap();
        // negatives -0.01, -0.03: mean -0.02, population std 0.01
        assert!((d - 0.01 * 52.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn downside_none_without_losses() {
        assert!(downside_deviation(&[0.01, 0.0, 0.02]).is_none());
    }

    // ── Drawdown ──

    #[test]
    fn drawdown_from_running_peak() {
        // growth 1.1, 1.21, 0.968, 1.0648
        let cum = compound(&[0.1, 0.1, -0.2, 0.1]);
        let dd = max_drawdown(&cum);
        assert!((dd - (-0.2)).abs() < 1e-12);
    }

    #[test]
    fn monotonic_series_has_zero_drawdown() {
        let cum = compound(&[0.01, 0.0, 0.02, 0.03]);
        assert_eq!(max_drawdown(&cum), 0.0);
    }

    #[test]
    fn watermark_starts_at_first_period() {
        // first period loss is not a drawdown from an implicit 1.0 start
        let cum = compound(&[-0.1, 0.05]);
        assert_eq!(max_drawdown(&cum), 0.0);
    }

    // ── Bundles ──

    #[test]
    fn strategy_win_rate_uses_invested_periods() {
        let w = weekly(&[0.01, -0.02, 0.03, 0.01], &[1, 1, 0, 0]);
        let m = MetricsBundle::strategy(&w).unwrap();
        assert!((m.win_rate - 0.5).abs() < 1e-12);
        assert!((m.exposure - 0.5).abs() < 1e-12);
        assert_eq!(m.invested_periods(), 2);
    }

    #[test]
    fn benchmark_win_rate_uses_all_periods() {
        let w = weekly(&[0.01, -0.02, 0.03, 0.01], &[1, 1, 0, 0]);
        let m = MetricsBundle::benchmark(&w).unwrap();
        assert!((m.win_rate - 0.75).abs() < 1e-12);
        assert_eq!(m.exposure, 1.0);
        assert_eq!(m.periods, 4);
        assert!((m.years - 4.0 / 52.0).abs() < 1e-12);
    }

    #[test]
    fn flat_strategy_is_degenerate_not_nan() {
        let w = weekly(&[0.01, -0.02, 0.03], &[0, 0, 0]);
        let m = MetricsBundle::strategy(&w).unwrap();
        assert_eq!(m.total_return, 0.0);
        assert_eq!(m.annualized_return, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.sortino_ratio, 0.0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.exposure, 0.0);
        assert!(m.degenerate.sharpe);
        assert!(m.degenerate.sortino);
    }

    #[test]
    fn sharpe_and_sortino_divide_annualized_return() {
        let returns = [0.01, -0.005, 0.02, -0.01, 0.004];
        let w = weekly(&returns, &[1, 1, 1, 1, 1]);
        let m = MetricsBundle::benchmark(&w).unwrap();
        let vol = annualized_volatility(&returns);
        let down = downside_deviation(&returns).unwrap();
        assert!((m.sharpe_ratio - m.annualized_return / vol).abs() < 1e-12);
        assert!((m.sortino_ratio - m.annualized_return / down).abs() < 1e-12);
        assert!(!m.degenerate.any());
    }

    #[test]
    fn single_period_is_insufficient() {
        let w = weekly(&[0.01], &[1]);
        assert_eq!(
            MetricsBundle::strategy(&w),
            Err(EngineError::InsufficientData {
                periods: 1,
                required: 2
            })
        );
    }

    #[test]
    fn map_exposes_published_names() {
        let w = weekly(&[0.01, 0.02], &[1, 0]);
        let map = MetricsBundle::strategy(&w).unwrap().as_map();
        let keys: Vec<&str> = map.keys().copied().collect();
        for name in [
            "total_return",
            "annualized_return",
            "volatility",
            "sharpe_ratio",
            "sortino_ratio",
            "max_drawdown",
            "win_rate",
            "exposure",
            "periods",
            "years",
        ] {
            assert!(keys.contains(&name), "missing {name}");
        }
        assert_eq!(map["periods"], 2.0);
    }
}
