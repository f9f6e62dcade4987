//! Engine errors.
//!
//! Boundary violations stop the pipeline before any statistic is computed.
//! Zero-denominator ratios are not errors; they are reported through
//! [`crate::metrics::Degeneracy`].

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::Stream;

/// What exactly was wrong with an input row.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    #[error("date {date} is not after previous date {previous}")]
    UnsortedDates { previous: NaiveDate, date: NaiveDate },

    #[error("duplicate date {0}")]
    DuplicateDate(NaiveDate),

    #[error("index level {0} is not positive")]
    NonPositiveIndex(f64),

    #[error("index level is not finite")]
    NonFiniteIndex,

    #[error("signal {0} is not binary (expected 0 or 1)")]
    NonBinarySignal(u8),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("no daily observations to resample")]
    EmptyInput,

    #[error("input contract violated at row {row}: {violation}")]
    InputContract {
        row: usize,
        violation: ContractViolation,
    },

    #[error("insufficient data: {periods} valid weekly period(s) after dropping incomplete buckets, need at least {required}")]
    InsufficientData { periods: usize, required: usize },

    #[error("{stream} {metric} is undefined")]
    UndefinedStatistic {
        stream: Stream,
        metric: &'static str,
    },

    #[error("trade {trade_id}: {side} price {price} on {date} is not a positive finite level")]
    TradeIntegrity {
        trade_id: u32,
        side: &'static str,
        date: NaiveDate,
        price: f64,
    },
}

impl EngineError {
    pub(crate) fn contract(row: usize, violation: ContractViolation) -> Self {
        EngineError::InputContract { row, violation }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_violation() {
        let err = EngineError::contract(7, ContractViolation::NonBinarySignal(2));
        let msg = err.to_string();
        assert!(msg.contains("row 7"));
        assert!(msg.contains("not binary"));
    }

    #[test]
    fn undefined_statistic_names_stream() {
        let err = EngineError::UndefinedStatistic {
            stream: Stream::Benchmark,
            metric: "total_return",
        };
        assert_eq!(err.to_string(), "benchmark total_return is undefined");
    }
}
