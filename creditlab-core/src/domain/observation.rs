//! Daily and weekly observations, the two shapes a series takes through the engine.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of the raw daily input.
///
/// `signal` is the position (0 = flat, 1 = long) intended for the *next*
/// rebalance period. The engine validates the binary contract; the type
/// stays `u8` so that a violation is reportable rather than unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub date: NaiveDate,
    pub index_level: f64,
    pub signal: u8,
}

impl DailyObservation {
    pub fn new(date: NaiveDate, index_level: f64, signal: u8) -> Self {
        Self {
            date,
            index_level,
            signal,
        }
    }
}

/// One valid resampled period.
///
/// Only fully-defined buckets become a `WeeklyObservation`; empty calendar
/// weeks and the first (unlagged) bucket never reach this type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyObservation {
    pub period_end_date: NaiveDate,
    /// Last daily level observed in the bucket.
    pub index_level: f64,
    pub benchmark_return: f64,
    /// Last daily signal observed in the bucket.
    pub signal_raw: u8,
    /// Previous bucket's `signal_raw`: the position actually held this period.
    pub signal_lagged: u8,
    pub strategy_return: f64,
    pub cum_return_strategy: f64,
    pub cum_return_benchmark: f64,
}

impl WeeklyObservation {
    pub fn is_invested(&self) -> bool {
        self.signal_lagged == 1
    }
}
