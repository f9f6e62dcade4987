//! CreditLab CLI — weekly long/flat backtests on a daily credit index.
//!
//! Commands:
//! - `run`: execute a backtest from a TOML config file, from flags, or on synthetic data
//! - `describe`: column null counts, distinct values and date range of a CSV

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use creditlab_core::WeekAnchor;
use creditlab_runner::{
    describe_csv, render_console, run_from_config, run_synthetic, save_artifacts, BacktestConfig,
    BacktestResult,
};

#[derive(Parser)]
#[command(
    name = "creditlab",
    about = "CreditLab CLI — weekly long/flat backtests on a daily credit index"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a backtest.
    Run(RunArgs),
    /// Describe the columns of a CSV file.
    Describe {
        /// CSV file to inspect.
        #[arg(long)]
        data: PathBuf,

        /// Name of the date column.
        #[arg(long, default_value = "Date")]
        date_col: String,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Path to a TOML config file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Daily CSV (required without --config or --synthetic).
    #[arg(long)]
    data: Option<PathBuf>,

    #[arg(long)]
    date_col: Option<String>,

    #[arg(long)]
    index_col: Option<String>,

    #[arg(long)]
    signal_col: Option<String>,

    /// Start date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    start: Option<String>,

    /// End date (YYYY-MM-DD), inclusive.
    #[arg(long)]
    end: Option<String>,

    /// Weekly bucket rule, e.g. W-FRI.
    #[arg(long)]
    resample: Option<String>,

    /// Annualized return target, e.g. 0.04.
    #[arg(long)]
    target: Option<f64>,

    /// Maximum consecutive index levels to forward-fill.
    #[arg(long)]
    max_fill: Option<usize>,

    /// Disable forward-filling of missing index levels.
    #[arg(long, default_value_t = false)]
    no_fill: bool,

    /// Artifact directory.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Print the report without writing artifacts.
    #[arg(long, default_value_t = false)]
    no_save: bool,

    /// Run on generated data instead of a CSV.
    #[arg(long, default_value_t = false)]
    synthetic: bool,

    /// Label (and seed) for synthetic data.
    #[arg(long, default_value = "CAD_IG_SYNTHETIC")]
    label: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_cmd(args),
        Commands::Describe { data, date_col } => describe_cmd(data, &date_col),
    }
}

fn parse_date(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("{flag} must be YYYY-MM-DD, got '{value}'"))
}

/// Config file (or defaults) with flag overrides applied.
fn build_config(args: &RunArgs) -> Result<BacktestConfig> {
    if args.synthetic && args.data.is_some() {
        bail!("--data and --synthetic are mutually exclusive");
    }

    let mut config = match (&args.config, &args.data) {
        (Some(path), _) => BacktestConfig::from_file(path)?,
        (None, Some(data)) => BacktestConfig::for_csv(data),
        (None, None) if args.synthetic => BacktestConfig::for_csv("synthetic"),
        (None, None) => bail!("one of --config, --data or --synthetic is required"),
    };

    if let Some(data) = &args.data {
        config.data.path = data.clone();
    }
    if let Some(col) = &args.date_col {
        config.data.date_column = col.clone();
    }
    if let Some(col) = &args.index_col {
        config.data.index_column = col.clone();
    }
    if let Some(col) = &args.signal_col {
        config.data.signal_column = col.clone();
    }
    if let Some(start) = &args.start {
        config.data.start_date = Some(parse_date(start, "--start")?);
    }
    if let Some(end) = &args.end {
        config.data.end_date = Some(parse_date(end, "--end")?);
    }
    if let Some(rule) = &args.resample {
        config.backtest.resample = rule.parse::<WeekAnchor>()?;
    }
    if let Some(target) = args.target {
        config.backtest.target_annual_return = target;
    }
    if let Some(max_fill) = args.max_fill {
        config.preprocess.max_fill = max_fill;
    }
    if args.no_fill {
        config.preprocess.fill_missing_index = false;
    }
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }

    config.validate()?;
    Ok(config)
}

fn run_cmd(args: RunArgs) -> Result<()> {
    let config = build_config(&args)?;
    info!(
        data = %config.data.path.display(),
        resample = %config.backtest.resample,
        synthetic = args.synthetic,
        "starting backtest"
    );

    let result = if args.synthetic {
        let start = config
            .data
            .start_date
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(2005, 1, 3).unwrap_or_default());
        let end = config
            .data
            .end_date
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        run_synthetic(&config, &args.label, start, end)?
    } else {
        run_from_config(&config)?
    };

    print_summary(&result);

    if !args.no_save {
        let run_dir = save_artifacts(&result, &config.output.dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    println!();
    print!("{}", render_console(result));
    println!("Run ID:         {}", result.run_id);
    println!("Dataset hash:   {}", result.dataset_hash);
}

fn describe_cmd(data: PathBuf, date_col: &str) -> Result<()> {
    let desc = describe_csv(&data, date_col)
        .with_context(|| format!("failed to describe {}", data.display()))?;

    println!("File:       {}", data.display());
    println!("Rows:       {}", desc.rows);
    match (desc.first_date, desc.last_date) {
        (Some(first), Some(last)) => println!("Date range: {first} to {last}"),
        _ => println!("Date range: (no parseable dates in '{date_col}')"),
    }
    println!();
    println!(
        "{:<30} {:>10} {:>10} {:>8} {:>10}",
        "Column", "Non-Null", "Null", "Null %", "Unique"
    );
    println!("{}", "-".repeat(72));
    for col in &desc.columns {
        println!(
            "{:<30} {:>10} {:>10} {:>7.2}% {:>10}",
            col.name, col.non_null, col.null_count, col.null_pct, col.unique_values
        );
    }
    Ok(())
}
