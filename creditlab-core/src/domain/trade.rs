//! A long holding period reconstructed from lagged-signal transitions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A closed long holding period: entry → exit.
///
/// A trade still open when the series ends is closed at the final
/// observation and is not flagged differently; compare `exit_date` with the
/// series' last date to tell the two apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// 1-based, sequential by entry order.
    pub trade_id: u32,

    // ── Entry ──
    pub entry_date: NaiveDate,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_date: NaiveDate,
    pub exit_price: f64,

    /// (exit_price - entry_price) / entry_price.
    #[serde(rename = "return")]
    pub return_pct: f64,
    /// Calendar days between entry and exit, divided by 7.
    pub holding_weeks: f64,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.return_pct > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.return_pct < 0.0
    }

    /// True when this trade was force-closed because the series ended.
    pub fn closed_at_series_end(&self, final_date: NaiveDate) -> bool {
        self.exit_date == final_date
    }
}
