//! Canonical domain types for the stockpulse pipeline.
//!
//! All models validate their invariants at construction time: a
//! [`Symbol`] is always a normalized ticker, a [`UtcDateTime`] is always
//! RFC3339 UTC, a [`Bar`] always has coherent OHLCV fields, and a
//! [`Pattern`] always carries a deterministic id with an ordered span.
//! Indicator absence is represented with `None` fields on
//! [`IndicatorRow`], never with zero.

mod models;
mod symbol;
mod timestamp;

pub use models::{Bar, BarSeries, IndicatorRow, Pattern, PatternType};
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
