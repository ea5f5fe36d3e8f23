//! # Stockpulse Pipeline
//!
//! Batch jobs wiring provider, TA engine, and warehouse together:
//!
//! - [`SyncJob`] — idempotent, cursor-resumable backfill of daily bars
//! - [`TaMetricsJob`] — indicator computation, pattern detection, and the
//!   atomic per-symbol metrics write
//!
//! Both jobs process symbols independently under a bounded worker pool
//! with an overall run deadline, and both return a run report instead of
//! failing on partial errors: one symbol's failure never takes down the
//! run, and a re-invocation over unchanged data is a no-op.

pub mod metrics;
pub mod report;
pub mod sync;
mod worker;

pub use metrics::TaMetricsJob;
pub use report::{MetricsReport, SymbolOutcome, SymbolStatus, SyncReport};
pub use sync::SyncJob;
