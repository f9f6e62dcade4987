//! Synthetic daily data for demos and tests.
//!
//! A low-volatility random walk standing in for a credit excess-return index,
//! with a binary trailing-momentum signal. Clearly fake: runs built on it are
//! tagged `has_synthetic`.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use creditlab_core::DailyObservation;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Business days in the momentum lookback.
const MOMENTUM_LOOKBACK: usize = 20;

/// Deterministic business-day series between `start` and `end` inclusive.
///
/// The same `label` always yields the same series. The signal on day `t` is 1
/// when the level is above its value `MOMENTUM_LOOKBACK` business days earlier,
/// so it only uses information available at `t`.
pub fn generate_synthetic_daily(label: &str, start: NaiveDate, end: NaiveDate) -> Vec<DailyObservation> {
    let seed: [u8; 32] = *blake3::hash(label.as_bytes()).as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut out: Vec<DailyObservation> = Vec::new();
    let mut level = 100.0_f64;
    let mut current = start;

    while current <= end {
        if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
            current += Duration::days(1);
            continue;
        }

        // small positive drift, occasional spread-widening shock
        let mut daily_return: f64 = rng.gen_range(-0.0015..0.0017);
        if rng.gen_bool(0.01) {
            daily_return -= rng.gen_range(0.002..0.01);
        }
        level *= 1.0 + daily_return;

        let signal = match out.len().checked_sub(MOMENTUM_LOOKBACK) {
            Some(back) => u8::from(level > out[back].index_level),
            None => 0,
        };
        out.push(DailyObservation::new(current, level, signal));
        current += Duration::days(1);
    }

    out
}
