//! End-to-end engine scenarios on hand-built weekly data.

use chrono::{Duration, NaiveDate};
use creditlab_core::{
    run_backtest, ContractViolation, DailyObservation, EngineConfig, EngineError,
};

fn first_friday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
}

/// One daily row per Friday, so every row is its own weekly bucket.
fn fridays(levels: &[f64], signals: &[u8]) -> Vec<DailyObservation> {
    levels
        .iter()
        .zip(signals)
        .enumerate()
        .map(|(i, (&l, &s))| DailyObservation::new(first_friday() + Duration::weeks(i as i64), l, s))
        .collect()
}

#[test]
fn reconstructs_two_trades_from_lagged_transitions() {
    // Raw signals are one bucket ahead of the lagged sequence [0,0,1,1,0,1,0];
    // the leading 99.0 bucket is consumed by the lag.
    let daily = fridays(
        &[99.0, 100.0, 101.0, 102.0, 104.0, 103.0, 105.0, 104.0],
        &[0, 0, 1, 1, 0, 1, 0, 0],
    );
    let out = run_backtest(&daily, &EngineConfig::default()).unwrap();

    let lagged: Vec<u8> = out.weekly.observations.iter().map(|w| w.signal_lagged).collect();
    assert_eq!(lagged, vec![0, 0, 1, 1, 0, 1, 0]);

    assert_eq!(out.trades.len(), 2);
    let (t1, t2) = (&out.trades[0], &out.trades[1]);

    assert_eq!(t1.trade_id, 1);
    assert_eq!(t1.entry_date, out.weekly.observations[2].period_end_date);
    assert_eq!(t1.entry_price, 102.0);
    assert_eq!(t1.exit_date, out.weekly.observations[4].period_end_date);
    assert_eq!(t1.exit_price, 103.0);
    assert!((t1.return_pct - 0.0098).abs() < 1e-4);
    assert_eq!(t1.holding_weeks, 2.0);

    assert_eq!(t2.trade_id, 2);
    assert_eq!(t2.entry_price, 105.0);
    assert_eq!(t2.exit_price, 104.0);
    assert!((t2.return_pct + 0.0095).abs() < 1e-4);
    assert_eq!(t2.holding_weeks, 1.0);
}

#[test]
fn all_flat_signal() {
    let daily = fridays(&[100.0, 101.0, 99.5, 102.0, 101.0], &[0, 0, 0, 0, 0]);
    let out = run_backtest(&daily, &EngineConfig::default()).unwrap();

    assert!(out.trades.is_empty());
    assert_eq!(out.strategy.exposure, 0.0);
    assert_eq!(out.strategy.total_return, 0.0);
    assert_eq!(out.strategy.sharpe_ratio, 0.0);
    assert_eq!(out.strategy.sortino_ratio, 0.0);
    assert!(out.strategy.degenerate.sharpe);
    assert!(out.strategy.degenerate.sortino);

    // the benchmark is unaffected by the signal
    assert!((out.benchmark.total_return - 0.01).abs() < 1e-12);
    assert!(!out.benchmark.degenerate.sharpe);
}

#[test]
fn open_trade_is_closed_at_last_date() {
    // lagged [0,1,1,1]
    let daily = fridays(&[100.0, 100.5, 101.0, 101.2, 101.9], &[0, 1, 1, 1, 0]);
    let out = run_backtest(&daily, &EngineConfig::default()).unwrap();

    let final_date = out.weekly.last_date().unwrap();
    assert_eq!(out.trades.len(), 1);
    assert_eq!(out.trades[0].exit_date, final_date);
    assert!(out.trades[0].closed_at_series_end(final_date));
    assert_eq!(out.trades[0].exit_price, 101.9);
}

#[test]
fn no_rising_edge_means_no_trades() {
    // lagged [1,1,1]: invested from the first period, never flat before it
    let daily = fridays(&[100.0, 100.4, 100.9, 101.5], &[1, 1, 1, 1]);
    let out = run_backtest(&daily, &EngineConfig::default()).unwrap();

    assert!(out.trades.is_empty());
    assert_eq!(out.strategy.exposure, 1.0);
}

#[test]
fn initial_invested_run_is_skipped() {
    // lagged [1,0,1,0]: only the later rise enters
    let daily = fridays(&[100.0, 101.0, 100.5, 102.0, 101.0], &[1, 0, 1, 0, 0]);
    let out = run_backtest(&daily, &EngineConfig::default()).unwrap();

    assert_eq!(out.trades.len(), 1);
    assert_eq!(out.trades[0].trade_id, 1);
    assert_eq!(out.trades[0].entry_date, out.weekly.observations[2].period_end_date);
    assert_eq!(out.trades[0].entry_price, 102.0);
    assert_eq!(out.trades[0].exit_price, 101.0);
}

#[test]
fn constant_strategy_returns_are_degenerate() {
    // flat index: every return is exactly 0 for both streams
    let daily = fridays(&[100.0; 6], &[1, 0, 1, 1, 0, 1]);
    let out = run_backtest(&daily, &EngineConfig::default()).unwrap();

    for m in [&out.strategy, &out.benchmark] {
        assert_eq!(m.volatility, 0.0);
        assert_eq!(m.sharpe_ratio, 0.0);
        assert_eq!(m.sortino_ratio, 0.0);
        assert!(!m.sharpe_ratio.is_nan());
        assert_eq!(m.max_drawdown, 0.0);
    }
}

#[test]
fn daily_rows_collapse_to_friday_buckets() {
    // Two business weeks of daily data plus one more Friday.
    let mut daily = Vec::new();
    let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut level = 100.0;
    for week in 0..3 {
        for day in 0..5 {
            level += 0.1;
            let signal = if week == 1 && day == 4 { 1 } else { 0 };
            daily.push(DailyObservation::new(
                monday + Duration::days(week * 7 + day),
                level,
                signal,
            ));
        }
    }
    let out = run_backtest(&daily, &EngineConfig::default()).unwrap();

    assert_eq!(out.weekly.bucket_count, 3);
    assert_eq!(out.weekly.len(), 2);
    // week 2 ended with signal 1, so week 3 is invested
    assert_eq!(out.weekly.observations[0].signal_lagged, 0);
    assert_eq!(out.weekly.observations[1].signal_lagged, 1);
    assert!((out.strategy.exposure - 0.5).abs() < 1e-12);
}

#[test]
fn unsorted_input_fails_fast() {
    let mut daily = fridays(&[100.0, 101.0, 102.0], &[0, 1, 1]);
    daily.swap(1, 2);
    let err = run_backtest(&daily, &EngineConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::InputContract {
            row: 2,
            violation: ContractViolation::UnsortedDates { .. }
        }
    ));
}

#[test]
fn empty_input_fails() {
    assert_eq!(
        run_backtest(&[], &EngineConfig::default()),
        Err(EngineError::EmptyInput)
    );
}
