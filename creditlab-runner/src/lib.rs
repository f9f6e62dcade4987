//! CreditLab Runner — everything around the engine that touches the outside world.
//!
//! This crate builds on `creditlab-core` to provide:
//! - TOML configuration with defaults and validation
//! - Daily CSV loading, column description and dataset fingerprinting
//! - Forward-filling of missing index levels
//! - Synthetic daily data for demos
//! - A runner that produces a persisted `BacktestResult`
//! - Console and Markdown reports, CSV/JSON artifacts

pub mod config;
pub mod data_loader;
pub mod export;
pub mod preprocess;
pub mod report;
pub mod runner;
pub mod synthetic;

pub use config::{BacktestConfig, ConfigError, DataConfig, RunId};
pub use data_loader::{
    describe_csv, load_daily_csv, ColumnInfo, CsvDescription, LoadError, LoadedSeries,
    RawDailyRow,
};
pub use export::{export_json, import_json, load_artifact, save_artifacts};
pub use preprocess::{fill_forward, FillReport};
pub use report::{render_console, render_markdown, TradeSummary};
pub use runner::{
    run_from_config, run_from_daily, run_synthetic, BacktestResult, Provenance, RunError,
    SCHEMA_VERSION,
};
pub use synthetic::generate_synthetic_daily;
