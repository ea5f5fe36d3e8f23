//! Market-data source contract and request/response types.
//!
//! The pipeline talks to exactly one kind of upstream: a provider of
//! daily OHLCV history. [`MarketDataSource`] is the adapter contract for
//! that endpoint plus a health probe, and [`SourceError`] carries the
//! transient/permanent classification the sync job's retry policy keys
//! on: a retryable error is worth another attempt with backoff, a
//! non-retryable one means the symbol is skipped and reported.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{BarSeries, ProviderId, Symbol, UtcDateTime};

/// Request payload for the daily bar history endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyBarsRequest {
    pub symbol: Symbol,
    /// Only bars strictly newer than this are of interest. Providers that
    /// cannot filter server-side return full history; the caller filters.
    pub newer_than: Option<UtcDateTime>,
}

impl DailyBarsRequest {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            newer_than: None,
        }
    }

    pub fn newer_than(mut self, cursor: UtcDateTime) -> Self {
        self.newer_than = Some(cursor);
        self
    }
}

/// Normalized daily bar history response.
///
/// `rejected_rows` counts provider rows that failed bar validation
/// (missing fields, negative volume, incoherent OHLC) and were dropped;
/// the surviving bars are complete, validated, and ascending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBarsBatch {
    pub series: BarSeries,
    pub rejected_rows: usize,
}

/// Health state reported by a source adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Runtime source health snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub state: HealthState,
    pub rate_available: bool,
}

impl HealthStatus {
    pub const fn new(state: HealthState, rate_available: bool) -> Self {
        Self {
            state,
            rate_available,
        }
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Upstream unreachable or returned a server error; transient.
    Unavailable,
    /// Provider quota exhausted; transient.
    RateLimited,
    /// The request itself is malformed; permanent.
    InvalidRequest,
    /// The provider does not know the symbol; permanent.
    UnknownSymbol,
    /// Parse or contract failure inside the adapter; permanent.
    Internal,
}

/// Structured source error with a retryability flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn unknown_symbol(symbol: &Symbol) -> Self {
        Self {
            kind: SourceErrorKind::UnknownSymbol,
            message: format!("provider does not recognize symbol '{symbol}'"),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::UnknownSymbol => "source.unknown_symbol",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Source adapter contract.
///
/// Implementations must be `Send + Sync`; the sync job shares one adapter
/// across its worker tasks.
pub trait MarketDataSource: Send + Sync {
    /// Unique provider identifier.
    fn id(&self) -> ProviderId;

    /// Fetch the daily bar history for one symbol.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the provider is unavailable, rate
    /// limited, or does not know the symbol. Individual malformed rows do
    /// not fail the call; they are counted in
    /// [`DailyBarsBatch::rejected_rows`].
    fn daily_bars<'a>(
        &'a self,
        req: DailyBarsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<DailyBarsBatch, SourceError>> + Send + 'a>>;

    /// Current health of the source, surfaced on the service's `/health`.
    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>>;
}
