//! Return stream identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which return stream a statistic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stream {
    /// Lagged-signal long/flat strategy.
    Strategy,
    /// Passive buy-and-hold of the index.
    Benchmark,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Strategy => write!(f, "strategy"),
            Stream::Benchmark => write!(f, "benchmark"),
        }
    }
}
