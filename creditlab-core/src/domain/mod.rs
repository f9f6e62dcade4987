//! Domain types for CreditLab

pub mod anchor;
pub mod observation;
pub mod stream;
pub mod trade;

pub use anchor::{ParseAnchorError, WeekAnchor};
pub use observation::{DailyObservation, WeeklyObservation};
pub use stream::Stream;
pub use trade::Trade;
