//! Trade ledger reconstruction from the lagged position series.
//!
//! A single chronological pass over the weekly series drives an explicit
//! two-state machine:
//!
//! ```text
//!            lagged 0 → 1                    lagged = 0
//!   Flat ───────────────▶ Long{entry} ───────────────▶ Flat   (emit trade)
//!    ▲ │ otherwise           │ lagged = 1
//!    └─┘                     └──▶ Long (no-op)
//! ```
//!
//! Entry needs an observed rise: the previous lagged value must be 0. A
//! series whose first valid period is already invested has no entry, and the
//! fall that ends that first run emits nothing. A position still open when
//! the series ends is closed at the final observation.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{Trade, WeeklyObservation};
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq)]
enum PositionState {
    Flat,
    Long { entry_date: NaiveDate, entry_price: f64 },
}

/// Incremental ledger builder. Feed observations in date order, then `finish`.
#[derive(Debug)]
pub struct LedgerBuilder {
    state: PositionState,
    trades: Vec<Trade>,
    prev_lagged: Option<u8>,
    last: Option<(NaiveDate, f64)>,
}

impl Default for LedgerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerBuilder {
    pub fn new() -> Self {
        Self {
            state: PositionState::Flat,
            trades: Vec::new(),
            prev_lagged: None,
            last: None,
        }
    }

    /// Advance the state machine by one period.
    pub fn observe(
        &mut self,
        date: NaiveDate,
        index_level: f64,
        signal_lagged: u8,
    ) -> Result<(), EngineError> {
        self.last = Some((date, index_level));

        match (self.state, self.prev_lagged, signal_lagged) {
            (PositionState::Flat, Some(0), 1) => {
                check_price(self.next_id(), "entry", date, index_level)?;
                self.state = PositionState::Long {
                    entry_date: date,
                    entry_price: index_level,
                };
            }
            (PositionState::Long { entry_date, entry_price }, _, 0) => {
                self.close(entry_date, entry_price, date, index_level)?;
            }
            _ => {}
        }
        self.prev_lagged = Some(signal_lagged);
        Ok(())
    }

    /// Close any open position at the last observed period and return the ledger.
    pub fn finish(mut self) -> Result<Vec<Trade>, EngineError> {
        if let (PositionState::Long { entry_date, entry_price }, Some((date, level))) =
            (self.state, self.last)
        {
            self.close(entry_date, entry_price, date, level)?;
        }
        Ok(self.trades)
    }

    fn next_id(&self) -> u32 {
        self.trades.len() as u32 + 1
    }

    fn close(
        &mut self,
        entry_date: NaiveDate,
        entry_price: f64,
        exit_date: NaiveDate,
        exit_price: f64,
    ) -> Result<(), EngineError> {
        let trade_id = self.next_id();
        check_price(trade_id, "exit", exit_date, exit_price)?;

        self.trades.push(Trade {
            trade_id,
            entry_date,
            entry_price,
            exit_date,
            exit_price,
            return_pct: (exit_price - entry_price) / entry_price,
            holding_weeks: (exit_date - entry_date).num_days() as f64 / 7.0,
        });
        self.state = PositionState::Flat;
        Ok(())
    }
}

/// Reconstruct the trade ledger from a weekly series.
pub fn reconstruct_trades(weekly: &[WeeklyObservation]) -> Result<Vec<Trade>, EngineError> {
    let mut builder = LedgerBuilder::new();
    for w in weekly {
        builder.observe(w.period_end_date, w.index_level, w.signal_lagged)?;
    }
    let trades = builder.finish()?;
    debug!(trades = trades.len(), "reconstructed trade ledger");
    Ok(trades)
}

fn check_price(
    trade_id: u32,
    side: &'static str,
    date: NaiveDate,
    price: f64,
) -> Result<(), EngineError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(EngineError::TradeIntegrity {
            trade_id,
            side,
            date,
            price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    }

    fn run(levels: &[f64], lagged: &[u8]) -> Result<Vec<Trade>, EngineError> {
        let mut b = LedgerBuilder::new();
        for (i, (&level, &sig)) in levels.iter().zip(lagged).enumerate() {
            b.observe(start() + Duration::weeks(i as i64), level, sig)?;
        }
        b.finish()
    }

    #[test]
    fn two_round_trips() {
        let trades = run(
            &[100.0, 101.0, 102.0, 104.0, 103.0, 105.0, 104.0],
            &[0, 0, 1, 1, 0, 1, 0],
        )
        .unwrap();

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].trade_id, 1);
        assert_eq!(trades[0].entry_price, 102.0);
        assert_eq!(trades[0].exit_price, 103.0);
        assert_eq!(trades[0].holding_weeks, 2.0);
        assert!((trades[0].return_pct - 1.0 / 102.0).abs() < 1e-12);

        assert_eq!(trades[1].trade_id, 2);
        assert_eq!(trades[1].entry_price, 105.0);
        assert_eq!(trades[1].exit_price, 104.0);
        assert!((trades[1].return_pct + 1.0 / 105.0).abs() < 1e-12);
    }

    #[test]
    fn open_position_closes_at_series_end() {
        let trades = run(&[100.0, 101.0, 102.0, 103.0], &[0, 1, 1, 1]).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].exit_date, start() + Duration::weeks(3));
        assert_eq!(trades[0].exit_price, 103.0);
    }

    #[test]
    fn invested_from_first_period_never_enters() {
        assert!(run(&[100.0, 101.0, 99.0], &[1, 1, 0]).unwrap().is_empty());
        assert!(run(&[100.0, 101.0, 102.0], &[1, 1, 1]).unwrap().is_empty());
    }

    #[test]
    fn first_rise_after_initial_run_opens_trade() {
        let trades = run(&[100.0, 101.0, 102.0, 104.0], &[1, 0, 1, 0]).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].trade_id, 1);
        assert_eq!(trades[0].entry_date, start() + Duration::weeks(2));
        assert_eq!(trades[0].entry_price, 102.0);
        assert_eq!(trades[0].exit_price, 104.0);
    }

    #[test]
    fn all_flat_yields_no_trades() {
        assert!(run(&[100.0, 101.0, 102.0], &[0, 0, 0]).unwrap().is_empty());
    }

    #[test]
    fn empty_series_yields_no_trades() {
        assert!(LedgerBuilder::new().finish().unwrap().is_empty());
    }

    #[test]
    fn entry_and_exit_on_same_last_period() {
        // Enters on the final period: closed immediately with zero holding time.
        let trades = run(&[100.0, 101.0], &[0, 1]).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].holding_weeks, 0.0);
        assert_eq!(trades[0].return_pct, 0.0);
    }

    #[test]
    fn non_positive_entry_price_is_integrity_error() {
        let err = run(&[100.0, 0.0], &[0, 1]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::TradeIntegrity {
                trade_id: 1,
                side: "entry",
                ..
            }
        ));
    }

    #[test]
    fn non_finite_exit_price_is_integrity_error() {
        let err = run(&[100.0, 101.0, f64::NAN], &[0, 1, 0]).unwrap_err();
        assert!(matches!(
            err,
            EngineError::TradeIntegrity { side: "exit", .. }
        ));
    }
}
