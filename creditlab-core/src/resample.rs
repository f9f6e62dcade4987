//! Weekly resampler and return compounder.
//!
//! Turns a validated daily (date, level, signal) stream into valid weekly
//! periods:
//!
//! 1. Bucket each day by its anchor week end and keep the last observation
//!    per bucket (last-observation, never an average).
//! 2. Materialize empty calendar weeks between the first and last bucket so
//!    a data gap is visible downstream.
//! 3. For each bucket `i`, derive the benchmark return against bucket `i-1`
//!    and the lagged signal from bucket `i-1`'s raw signal. The signal of
//!    bucket `i` is never read when computing bucket `i`'s return.
//! 4. Drop every bucket with an undefined field (always the first bucket,
//!    plus an empty week and the week right after it).
//! 5. Compound both return streams over the surviving periods.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{DailyObservation, WeekAnchor, WeeklyObservation};
use crate::error::EngineError;
use crate::validate::validate_daily;

/// Ordered valid weekly periods plus resampling provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySeries {
    pub anchor: WeekAnchor,
    pub observations: Vec<WeeklyObservation>,
    /// Calendar buckets between the first and last daily observation.
    pub bucket_count: usize,
    /// Buckets removed for an undefined field (includes the first bucket).
    pub dropped_buckets: usize,
}

impl WeeklySeries {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn strategy_returns(&self) -> Vec<f64> {
        self.observations.iter().map(|w| w.strategy_return).collect()
    }

    pub fn benchmark_returns(&self) -> Vec<f64> {
        self.observations.iter().map(|w| w.benchmark_return).collect()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.observations.last().map(|w| w.period_end_date)
    }

    /// Buckets lost to calendar weeks without data: an empty week and the
    /// week after it. The first bucket, which never has a lag, is not counted.
    pub fn gap_dropped(&self) -> usize {
        self.dropped_buckets.saturating_sub(1)
    }
}

/// Last observation of one calendar bucket; `None` for an empty week.
#[derive(Debug, Clone, Copy)]
struct Bucket {
    end: NaiveDate,
    last: Option<(f64, u8)>,
}

/// Resample a daily series into lagged weekly periods.
pub fn resample_weekly(
    daily: &[DailyObservation],
    anchor: WeekAnchor,
) -> Result<WeeklySeries, EngineError> {
    validate_daily(daily)?;

    let buckets = last_per_bucket(daily, anchor);
    let empty_weeks = buckets.iter().filter(|b| b.last.is_none()).count();
    if empty_weeks > 0 {
        warn!(empty_weeks, %anchor, "daily series has calendar weeks with no observation");
    }

    // (date, level, benchmark_return, signal_raw, signal_lagged, strategy_return)
    let mut rows = Vec::with_capacity(buckets.len());
    for pair in buckets.windows(2) {
        let (Some((prev_level, prev_signal)), Some((level, signal))) = (pair[0].last, pair[1].last)
        else {
            continue;
        };
        let benchmark_return = (level - prev_level) / prev_level;
        let strategy_return = benchmark_return * f64::from(prev_signal);
        rows.push((
            pair[1].end,
            level,
            benchmark_return,
            signal,
            prev_signal,
            strategy_return,
        ));
    }

    let strategy_returns: Vec<f64> = rows.iter().map(|r| r.5).collect();
    let benchmark_returns: Vec<f64> = rows.iter().map(|r| r.2).collect();
    let cum_strategy = compound(&strategy_returns);
    let cum_benchmark = compound(&benchmark_returns);

    let observations: Vec<WeeklyObservation> = rows
        .iter()
        .enumerate()
        .map(
            |(i, &(period_end_date, index_level, benchmark_return, signal_raw, signal_lagged, strategy_return))| {
                WeeklyObservation {
                    period_end_date,
                    index_level,
                    benchmark_return,
                    signal_raw,
                    signal_lagged,
                    strategy_return,
                    cum_return_strategy: cum_strategy[i],
                    cum_return_benchmark: cum_benchmark[i],
                }
            },
        )
        .collect();

    let bucket_count = buckets.len();
    let dropped_buckets = bucket_count - observations.len();
    debug!(
        daily_rows = daily.len(),
        bucket_count,
        dropped_buckets,
        valid_periods = observations.len(),
        "resampled daily series"
    );

    Ok(WeeklySeries {
        anchor,
        observations,
        bucket_count,
        dropped_buckets,
    })
}

/// Running compounded return: `∏(1 + r) − 1` at every step, starting from 1.
pub fn compound(returns: &[f64]) -> Vec<f64> {
    let mut growth = 1.0_f64;
    returns
        .iter()
        .map(|r| {
            growth *= 1.0 + r;
            growth - 1.0
        })
        .collect()
}

fn last_per_bucket(daily: &[DailyObservation], anchor: WeekAnchor) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = Vec::new();

    for obs in daily {
        let end = anchor.bucket_end(obs.date);
        match buckets.last_mut() {
            Some(current) if current.end == end => {
                current.last = Some((obs.index_level, obs.signal));
            }
            Some(current) => {
                let mut gap_end = current.end + Duration::days(7);
                while gap_end < end {
                    buckets.push(Bucket {
                        end: gap_end,
                        last: None,
                    });
                    gap_end += Duration::days(7);
                }
                buckets.push(Bucket {
                    end,
                    last: Some((obs.index_level, obs.signal)),
                });
            }
            None => buckets.push(Bucket {
                end,
                last: Some((obs.index_level, obs.signal)),
            }),
        }
    }

    buckets
}
