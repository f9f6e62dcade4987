//! Daily input contract checks.
//!
//! Runs once at the engine boundary. The first violation stops the pipeline;
//! nothing is coerced (no sorting, no dedup, no signal clamping).

use crate::domain::DailyObservation;
use crate::error::{ContractViolation, EngineError};

/// Validate ordering, level and signal contracts for a daily series.
///
/// Row numbers in errors are 1-based data rows.
pub fn validate_daily(daily: &[DailyObservation]) -> Result<(), EngineError> {
    if daily.is_empty() {
        return Err(EngineError::EmptyInput);
    }

    for (i, obs) in daily.iter().enumerate() {
        let row = i + 1;

        if i > 0 {
            let previous = daily[i - 1].date;
            if obs.date == previous {
                return Err(EngineError::contract(
                    row,
                    ContractViolation::DuplicateDate(obs.date),
                ));
            }
            if obs.date < previous {
                return Err(EngineError::contract(
                    row,
                    ContractViolation::UnsortedDates {
                        previous,
                        date: obs.date,
                    },
                ));
            }
        }

        if !obs.index_level.is_finite() {
            return Err(EngineError::contract(row, ContractViolation::NonFiniteIndex));
        }
        if obs.index_level <= 0.0 {
            return Err(EngineError::contract(
                row,
                ContractViolation::NonPositiveIndex(obs.index_level),
            ));
        }
        if obs.signal > 1 {
            return Err(EngineError::contract(
                row,
                ContractViolation::NonBinarySignal(obs.signal),
            ));
        }
    }

    Ok(())
}
