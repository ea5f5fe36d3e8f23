//! Provider adapters.
//!
//! One adapter today: Financial Modeling Prep daily EOD history. Any
//! replacement only needs to implement
//! [`MarketDataSource`](crate::MarketDataSource).

mod fmp;

pub use fmp::{FmpAdapter, FMP_API_KEY_ENV};
