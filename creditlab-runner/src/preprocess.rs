//! Gap filling between loading and the engine.
//!
//! Only index levels are forward-filled. A signal is a decision and is never
//! invented for a day that did not carry one.

use creditlab_core::DailyObservation;
use tracing::warn;

use crate::data_loader::{LoadError, RawDailyRow};

/// What [`fill_forward`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillReport {
    pub filled: usize,
    /// Gaps left open: leading gaps and runs longer than the limit.
    pub unfilled: usize,
}

/// Forward-fill blank index levels, at most `max_fill` consecutive rows.
pub fn fill_forward(rows: &mut [RawDailyRow], max_fill: usize) -> FillReport {
    let mut report = FillReport::default();
    let mut last_seen: Option<f64> = None;
    let mut run = 0usize;

    for row in rows.iter_mut() {
        match row.index_level {
            Some(level) => {
                last_seen = Some(level);
                run = 0;
            }
            None => {
                run += 1;
                match last_seen {
                    Some(level) if run <= max_fill => {
                        row.index_level = Some(level);
                        report.filled += 1;
                    }
                    _ => report.unfilled += 1,
                }
            }
        }
    }

    if report.filled > 0 {
        warn!(filled = report.filled, max_fill, "forward-filled missing index levels");
    }
    report
}

/// Convert rows into engine input. Any gap still open is an error naming its row.
pub fn to_daily_observations(rows: &[RawDailyRow]) -> Result<Vec<DailyObservation>, LoadError> {
    rows.iter()
        .map(|r| {
            r.index_level
                .map(|level| DailyObservation::new(r.date, level, r.signal))
                .ok_or(LoadError::MissingIndexLevel {
                    row: r.row,
                    date: r.date,
                })
        })
        .collect()
}
