//! # Stockpulse Core
//!
//! Core contracts and domain types for the stockpulse TA pipeline.
//!
//! ## Overview
//!
//! This crate provides the foundations shared by every other crate in the
//! workspace:
//!
//! - **Canonical domain models** for bars, indicator rows, and detected
//!   patterns, all validated at construction
//! - **Market-data source contract** ([`MarketDataSource`]) with a
//!   structured, retryability-aware error type
//! - **FMP adapter** for dividend-adjusted daily EOD history, with a mock
//!   mode for deterministic offline tests
//! - **Resilience primitives**: bounded retry with jittered exponential
//!   backoff, a circuit breaker, and a quota-driven throttling queue
//! - **Pipeline configuration** loaded from JSON with sane defaults
//!
//! ## Error Handling
//!
//! Construction errors are [`ValidationError`]; provider errors are
//! [`SourceError`] and carry a `retryable()` flag that separates
//! transient failures (timeouts, 5xx, rate limits) from permanent ones
//! (unknown symbol, bad request). The sync job retries the former and
//! skips-and-reports the latter.
//!
//! ## Security
//!
//! The provider API key is read from the environment only and never
//! logged or serialized.

pub mod adapters;
pub mod circuit_breaker;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod provider_policy;
pub mod retry;
pub mod source;
pub mod throttling;

pub use adapters::{FmpAdapter, FMP_API_KEY_ENV};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use config::{CrossPolicy, PipelineConfig, DEFAULT_SYMBOLS};
pub use data_source::{
    DailyBarsBatch, DailyBarsRequest, HealthState, HealthStatus, MarketDataSource, SourceError,
    SourceErrorKind,
};
pub use domain::{Bar, BarSeries, IndicatorRow, Pattern, PatternType, Symbol, UtcDateTime};
pub use error::{CoreError, ValidationError};
pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, NoopHttpClient, ReqwestHttpClient,
};
pub use provider_policy::{BackoffPolicy, ProviderPolicy};
pub use retry::{retry_source, Backoff, RetryConfig};
pub use source::ProviderId;
pub use throttling::ThrottlingQueue;
