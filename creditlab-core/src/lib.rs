//! CreditLab Core — weekly-rebalanced long/flat backtesting engine.
//!
//! This crate contains the engine and nothing that touches the filesystem:
//! - Domain types (daily/weekly observations, trades, week anchors)
//! - Input contract validation
//! - Weekly resampler with one-period signal lag and return compounding
//! - Performance metrics for the strategy and buy-and-hold streams
//! - Trade ledger reconstruction as an explicit Flat/Long state machine

pub mod domain;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod resample;
pub mod validate;

pub use domain::{DailyObservation, Stream, Trade, WeekAnchor, WeeklyObservation};
pub use engine::{run_backtest, BacktestOutcome, EngineConfig};
pub use error::{ContractViolation, EngineError};
pub use metrics::{Degeneracy, MetricsBundle};
pub use resample::WeeklySeries;
