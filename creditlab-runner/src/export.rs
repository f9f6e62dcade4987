//! Artifact export: JSON manifest, CSV tables, Markdown report.
//!
//! The manifest carries a `schema_version`. Newer versions are rejected on
//! load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use creditlab_core::{MetricsBundle, Trade, WeeklyObservation};
use tracing::info;

use crate::report::render_markdown;
use crate::runner::{BacktestResult, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Weekly table, one row per valid period.
///
/// Columns: Date, cad_ig_er_index, benchmark_return, signal, signal_shifted,
/// strategy_return, cum_return_strategy, cum_return_benchmark
pub fn export_weekly_csv(weekly: &[WeeklyObservation]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "Date",
        "cad_ig_er_index",
        "benchmark_return",
        "signal",
        "signal_shifted",
        "strategy_return",
        "cum_return_strategy",
        "cum_return_benchmark",
    ])?;
    for w in weekly {
        wtr.write_record([
            &w.period_end_date.to_string(),
            &format!("{:.6}", w.index_level),
            &format!("{:.8}", w.benchmark_return),
            &w.signal_raw.to_string(),
            &w.signal_lagged.to_string(),
            &format!("{:.8}", w.strategy_return),
            &format!("{:.8}", w.cum_return_strategy),
            &format!("{:.8}", w.cum_return_benchmark),
        ])?;
    }
    finish_csv(wtr)
}

/// Trade blotter.
///
/// Columns: Trade_ID, Entry_Date, Entry_Price, Exit_Date, Exit_Price, Return,
/// Holding_Weeks
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "Trade_ID",
        "Entry_Date",
        "Entry_Price",
        "Exit_Date",
        "Exit_Price",
        "Return",
        "Holding_Weeks",
    ])?;
    for t in trades {
        wtr.write_record([
            &t.trade_id.to_string(),
            &t.entry_date.to_string(),
            &format!("{:.6}", t.entry_price),
            &t.exit_date.to_string(),
            &format!("{:.6}", t.exit_price),
            &format!("{:.8}", t.return_pct),
            &format!("{:.2}", t.holding_weeks),
        ])?;
    }
    finish_csv(wtr)
}

/// Metric table with formatted values, plus Years and Weeks rows.
///
/// Columns: Metric, Strategy, Buy_and_Hold
pub fn export_metrics_csv(strategy: &MetricsBundle, benchmark: &MetricsBundle) -> Result<String> {
    let pct = |v: f64| format!("{:.2}%", v * 100.0);
    let ratio = |v: f64| format!("{v:.2}");

    let rows: [(&str, String, String); 10] = [
        ("Total Return", pct(strategy.total_return), pct(benchmark.total_return)),
        (
            "Annualized Return",
            pct(strategy.annualized_return),
            pct(benchmark.annualized_return),
        ),
        ("Volatility", pct(strategy.volatility), pct(benchmark.volatility)),
        ("Sharpe Ratio", ratio(strategy.sharpe_ratio), ratio(benchmark.sharpe_ratio)),
        ("Sortino Ratio", ratio(strategy.sortino_ratio), ratio(benchmark.sortino_ratio)),
        ("Max Drawdown", pct(strategy.max_drawdown), pct(benchmark.max_drawdown)),
        ("Win Rate", pct(strategy.win_rate), pct(benchmark.win_rate)),
        ("Exposure", pct(strategy.exposure), pct(benchmark.exposure)),
        (
            "Years",
            format!("{:.2}", strategy.years),
            format!("{:.2}", benchmark.years),
        ),
        (
            "Weeks",
            strategy.periods.to_string(),
            benchmark.periods.to_string(),
        ),
    ];

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["Metric", "Strategy", "Buy_and_Hold"])?;
    for (metric, s, b) in &rows {
        wtr.write_record([*metric, s.as_str(), b.as_str()])?;
    }
    finish_csv(wtr)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one run.
///
/// Creates `{label}_{timestamp}/` under `output_dir` containing:
/// - `manifest.json`: the full `BacktestResult`
/// - `weekly_returns.csv`
/// - `trade_blotter.csv`
/// - `backtest_metrics.csv`
/// - `report.md`
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        sanitize_label(&result.label),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let files = [
        ("manifest.json", export_json(result)?),
        (
            "weekly_returns.csv",
            export_weekly_csv(&result.outcome.weekly.observations)?,
        ),
        ("trade_blotter.csv", export_trades_csv(&result.outcome.trades)?),
        (
            "backtest_metrics.csv",
            export_metrics_csv(&result.outcome.strategy, &result.outcome.benchmark)?,
        ),
        ("report.md", render_markdown(result)),
    ];
    for (name, content) in &files {
        let path = run_dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    info!(dir = %run_dir.display(), "artifacts saved");
    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
pub fn load_artifact(run_dir: &Path) -> Result<BacktestResult> {
    let path = run_dir.join("manifest.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "run".into()
    } else {
        cleaned
    }
}
