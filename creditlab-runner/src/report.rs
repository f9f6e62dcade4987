//! Human-readable reports: console table, trade summary, Markdown.

use creditlab_core::{MetricsBundle, Trade};
use serde::{Deserialize, Serialize};

use crate::runner::BacktestResult;

const RULE_WIDTH: usize = 80;
/// Trades listed in the Markdown report.
const MARKDOWN_TRADE_LIMIT: usize = 10;

// ─── Trade summary ──────────────────────────────────────────────────

/// Aggregate view of the trade ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSummary {
    pub total: usize,
    pub winning: usize,
    pub losing: usize,
    /// Mean trade return, 0 when there are no trades.
    pub average_return: f64,
    pub average_holding_weeks: f64,
}

impl TradeSummary {
    pub fn compute(trades: &[Trade]) -> Self {
        let total = trades.len();
        if total == 0 {
            return Self {
                total: 0,
                winning: 0,
                losing: 0,
                average_return: 0.0,
                average_holding_weeks: 0.0,
            };
        }
        let n = total as f64;
        Self {
            total,
            winning: trades.iter().filter(|t| t.is_winner()).count(),
            losing: trades.iter().filter(|t| t.is_loser()).count(),
            average_return: trades.iter().map(|t| t.return_pct).sum::<f64>() / n,
            average_holding_weeks: trades.iter().map(|t| t.holding_weeks).sum::<f64>() / n,
        }
    }
}

// ─── Formatting helpers ─────────────────────────────────────────────

fn pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn ratio(value: f64) -> String {
    format!("{value:.2}")
}

/// (label, strategy, benchmark, difference) rows shared by both renderers.
fn metric_rows(s: &MetricsBundle, b: &MetricsBundle) -> Vec<(&'static str, String, String, String)> {
    let pct_row = |label, sv: f64, bv: f64| (label, pct(sv), pct(bv), pct(sv - bv));
    let ratio_row = |label, sv: f64, bv: f64| (label, ratio(sv), ratio(bv), ratio(sv - bv));
    vec![
        pct_row("Total Return", s.total_return, b.total_return),
        pct_row("Annualized Return", s.annualized_return, b.annualized_return),
        pct_row("Volatility", s.volatility, b.volatility),
        ratio_row("Sharpe Ratio", s.sharpe_ratio, b.sharpe_ratio),
        ratio_row("Sortino Ratio", s.sortino_ratio, b.sortino_ratio),
        pct_row("Max Drawdown", s.max_drawdown, b.max_drawdown),
        pct_row("Win Rate", s.win_rate, b.win_rate),
        // buy-and-hold is always fully invested
        ("Exposure", pct(s.exposure), pct(1.0), String::new()),
    ]
}

fn degeneracy_notes(result: &BacktestResult) -> Vec<String> {
    let mut notes = Vec::new();
    for bundle in [&result.outcome.strategy, &result.outcome.benchmark] {
        if bundle.degenerate.sharpe {
            notes.push(format!(
                "{} Sharpe ratio reported as 0: return volatility is zero",
                bundle.stream
            ));
        }
        if bundle.degenerate.sortino {
            notes.push(format!(
                "{} Sortino ratio reported as 0: no downside deviation",
                bundle.stream
            ));
        }
    }
    notes
}

fn target_line(result: &BacktestResult) -> String {
    let achieved = pct(result.outcome.strategy.annualized_return);
    let target = pct(result.target_annual_return());
    if result.target_achieved {
        format!("TARGET ACHIEVED: {achieved} annualized return (>= {target})")
    } else {
        format!("Target not achieved: {achieved} annualized return (< {target})")
    }
}

// ─── Console ────────────────────────────────────────────────────────

/// The side-by-side console report.
pub fn render_console(result: &BacktestResult) -> String {
    let s = &result.outcome.strategy;
    let b = &result.outcome.benchmark;
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);

    let mut out = format!(
        "{heavy}\n\
BACKTEST RESULTS\n\
{heavy}\n\
Source:      {}\n\
Data:        {} to {} ({} daily rows)\n\
Time Period: {:.2} years ({} weeks)\n\
\n\
{light}\n\
{:<30} {:>15} {:>15} {:>15}\n\
{light}\n",
        result.label,
        result.start_date,
        result.end_date,
        result.daily_rows,
        s.years,
        s.periods,
        "Metric",
        "Strategy",
        "Buy & Hold",
        "Difference"
    );
    for (label, sv, bv, diff) in metric_rows(s, b) {
        out.push_str(&format!("{label:<30} {sv:>15} {bv:>15} {diff:>15}\n"));
    }
    out.push_str(&format!("{light}\n"));

    let summary = TradeSummary::compute(&result.outcome.trades);
    out.push_str(&format!(
        "Trades: {} ({} winning, {} losing), avg return {}, avg holding {:.1} weeks\n",
        summary.total,
        summary.winning,
        summary.losing,
        pct(summary.average_return),
        summary.average_holding_weeks
    ));

    let notes = degeneracy_notes(result);
    if !notes.is_empty() || !result.data_quality_warnings.is_empty() || result.has_synthetic {
        out.push('\n');
    }
    for note in notes.iter().chain(&result.data_quality_warnings) {
        out.push_str(&format!("WARNING: {note}\n"));
    }
    if result.has_synthetic {
        out.push_str("WARNING: Results based on SYNTHETIC data\n");
    }

    out.push_str(&format!("\n{}\n{heavy}\n", target_line(result)));
    out
}

// ─── Markdown ───────────────────────────────────────────────────────

/// Markdown report: metrics table, trade summary and the first trades.
pub fn render_markdown(result: &BacktestResult) -> String {
    let s = &result.outcome.strategy;
    let b = &result.outcome.benchmark;

    let mut md = format!(
        "# Backtest Report: {}\n\n\
- Run ID: `{}`\n\
- Period: {} to {}\n\
- Time period: {:.2} years ({} weeks)\n\
- Resample: {}\n\
- Dataset hash: `{}`\n",
        result.label,
        result.run_id,
        result.start_date,
        result.end_date,
        s.years,
        s.periods,
        result.outcome.weekly.anchor,
        result.dataset_hash
    );
    if result.has_synthetic {
        md.push_str("- **Synthetic data**\n");
    }

    md.push_str("\n## Performance\n\n");
    md.push_str("| Metric | Strategy | Buy & Hold | Difference |\n");
    md.push_str("|---|---:|---:|---:|\n");
    for (label, sv, bv, diff) in metric_rows(s, b) {
        md.push_str(&format!("| {label} | {sv} | {bv} | {diff} |\n"));
    }
    md.push_str(&format!("\n**{}**\n\n", target_line(result)));

    let notes = degeneracy_notes(result);
    if !notes.is_empty() || !result.data_quality_warnings.is_empty() {
        md.push_str("## Warnings\n\n");
        for note in notes.iter().chain(&result.data_quality_warnings) {
            md.push_str(&format!("- {note}\n"));
        }
        md.push('\n');
    }

    let summary = TradeSummary::compute(&result.outcome.trades);
    md.push_str(&format!(
        "## Trades\n\n\
- Total trades: {}\n\
- Winning trades: {}\n\
- Losing trades: {}\n\
- Average return: {}\n\
- Average holding: {:.1} weeks\n",
        summary.total,
        summary.winning,
        summary.losing,
        pct(summary.average_return),
        summary.average_holding_weeks
    ));

    if !result.outcome.trades.is_empty() {
        md.push_str("\n| # | Entry | Entry Price | Exit | Exit Price | Return | Weeks |\n");
        md.push_str("|---:|---|---:|---|---:|---:|---:|\n");
        for t in result.outcome.trades.iter().take(MARKDOWN_TRADE_LIMIT) {
            md.push_str(&format!(
                "| {} | {} | {:.4} | {} | {:.4} | {} | {:.1} |\n",
                t.trade_id,
                t.entry_date,
                t.entry_price,
                t.exit_date,
                t.exit_price,
                pct(t.return_pct),
                t.holding_weeks
            ));
        }
        if result.outcome.trades.len() > MARKDOWN_TRADE_LIMIT {
            md.push_str(&format!(
                "\n_{} more trades in trade_blotter.csv_\n",
                result.outcome.trades.len() - MARKDOWN_TRADE_LIMIT
            ));
        }
    }
    md
}
