use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use time::Duration;

use crate::circuit_breaker::{CircuitBreaker, CircuitState};
use crate::data_source::{
    DailyBarsBatch, DailyBarsRequest, HealthState, HealthStatus, MarketDataSource, SourceError,
};
use crate::http_client::{HttpClient, HttpRequest, NoopHttpClient};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::ThrottlingQueue;
use crate::{Bar, BarSeries, ProviderId, Symbol, UtcDateTime};

/// Environment variable holding the FMP API credential.
pub const FMP_API_KEY_ENV: &str = "STOCKPULSE_FMP_API_KEY";

const DEFAULT_BASE_URL: &str = "https://financialmodelingprep.com/stable";

/// Financial Modeling Prep adapter for dividend-adjusted daily EOD bars.
///
/// Adjusted prices are mapped into the canonical OHLC fields so indicator
/// math is split/dividend consistent across the whole history. With a
/// mock transport the adapter serves seeded deterministic bars instead of
/// calling upstream.
#[derive(Clone)]
pub struct FmpAdapter {
    health_state: HealthState,
    rate_available: bool,
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
    circuit_breaker: Arc<CircuitBreaker>,
    throttling: ThrottlingQueue,
    use_real_api: bool,
}

impl Default for FmpAdapter {
    fn default() -> Self {
        let policy = ProviderPolicy::fmp_default();
        Self {
            health_state: HealthState::Healthy,
            rate_available: true,
            http_client: Arc::new(NoopHttpClient),
            api_key: std::env::var(FMP_API_KEY_ENV).unwrap_or_else(|_| String::from("demo")),
            base_url: String::from(DEFAULT_BASE_URL),
            circuit_breaker: Arc::new(CircuitBreaker::default()),
            throttling: ThrottlingQueue::from_policy(&policy),
            use_real_api: false,
        }
    }
}

impl FmpAdapter {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        let is_real = !http_client.is_mock();
        Self {
            http_client,
            api_key: api_key.into(),
            use_real_api: is_real,
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_circuit_breaker(circuit_breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            circuit_breaker,
            ..Self::default()
        }
    }

    fn is_real_client(&self) -> bool {
        self.use_real_api
    }

    fn guard_upstream_call(&self) -> Result<(), SourceError> {
        if !self.circuit_breaker.allow_request() {
            return Err(SourceError::unavailable("fmp circuit breaker is open"));
        }

        if let Err(delay) = self.throttling.acquire() {
            return Err(SourceError::rate_limited(format!(
                "fmp quota exhausted; retry in {:.2}s",
                delay.as_secs_f64()
            )));
        }

        Ok(())
    }

    async fn fetch_real_daily_bars(
        &self,
        req: &DailyBarsRequest,
    ) -> Result<DailyBarsBatch, SourceError> {
        self.guard_upstream_call()?;

        let endpoint = format!(
            "{}/historical-price-eod/dividend-adjusted?symbol={}&apikey={}",
            self.base_url,
            urlencoding::encode(req.symbol.as_str()),
            self.api_key
        );

        let request = HttpRequest::get(&endpoint).with_timeout_ms(30_000);
        let response = self.http_client.execute(request).await.map_err(|error| {
            self.circuit_breaker.record_failure();
            if error.retryable() {
                SourceError::unavailable(format!("fmp transport error: {}", error.message()))
            } else {
                SourceError::internal(format!("fmp transport error: {}", error.message()))
            }
        })?;

        if !response.is_success() {
            return Err(self.classify_status(&req.symbol, response.status));
        }

        self.throttling.complete_one();
        self.circuit_breaker.record_success();

        let rows: Vec<FmpEodRow> = serde_json::from_str(&response.body)
            .map_err(|e| SourceError::internal(format!("failed to parse fmp response: {e}")))?;

        Ok(normalize_rows(req, rows))
    }

    /// Map an upstream HTTP status to the transient/permanent taxonomy.
    fn classify_status(&self, symbol: &Symbol, status: u16) -> SourceError {
        match status {
            429 => {
                // Quota exhaustion is the provider's call, not a fault.
                self.circuit_breaker.record_success();
                SourceError::rate_limited("fmp returned status 429")
            }
            404 => {
                self.circuit_breaker.record_success();
                SourceError::unknown_symbol(symbol)
            }
            status if status >= 500 => {
                self.circuit_breaker.record_failure();
                SourceError::unavailable(format!("fmp returned status {status}"))
            }
            status => {
                self.circuit_breaker.record_success();
                SourceError::invalid_request(format!("fmp rejected request with status {status}"))
            }
        }
    }

    async fn fetch_mock_daily_bars(
        &self,
        req: &DailyBarsRequest,
    ) -> Result<DailyBarsBatch, SourceError> {
        self.guard_upstream_call()?;
        self.throttling.complete_one();
        self.circuit_breaker.record_success();

        // Fixed anchor keeps mock output identical across runs.
        let anchor = UtcDateTime::parse("2025-12-31T00:00:00Z")
            .map_err(|e| SourceError::internal(e.to_string()))?
            .into_inner();
        let seed = symbol_seed(&req.symbol);

        const MOCK_HISTORY_DAYS: usize = 260;
        let mut bars = Vec::with_capacity(MOCK_HISTORY_DAYS);
        for index in 0..MOCK_HISTORY_DAYS {
            let offset = Duration::days((MOCK_HISTORY_DAYS - 1 - index) as i64);
            let ts = UtcDateTime::from_offset_datetime(anchor - offset)
                .map_err(|e| SourceError::internal(e.to_string()))?;
            let base = 88.0 + ((seed + index as u64 * 5) % 500) as f64 / 10.0;

            let bar = Bar::new(
                ts,
                base,
                base + 1.10,
                base - 0.70,
                base + 0.33,
                18_000.0 + index as f64 * 20.0,
                Some(0.33),
                Some(0.33 / base * 100.0),
                Some(base + 0.12),
            )
            .map_err(|e| SourceError::internal(e.to_string()))?;
            bars.push(bar);
        }

        if let Some(cursor) = req.newer_than {
            bars.retain(|bar| bar.ts > cursor);
        }

        Ok(DailyBarsBatch {
            series: BarSeries::new(req.symbol.clone(), bars),
            rejected_rows: 0,
        })
    }
}

impl MarketDataSource for FmpAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Fmp
    }

    fn daily_bars<'a>(
        &'a self,
        req: DailyBarsRequest,
    ) -> Pin<Box<dyn Future<Output = Result<DailyBarsBatch, SourceError>> + Send + 'a>> {
        Box::pin(async move {
            if self.is_real_client() {
                self.fetch_real_daily_bars(&req).await
            } else {
                self.fetch_mock_daily_bars(&req).await
            }
        })
    }

    fn health<'a>(&'a self) -> Pin<Box<dyn Future<Output = HealthStatus> + Send + 'a>> {
        Box::pin(async move {
            let mut state = self.health_state;
            let mut rate_available = self.rate_available && self.throttling.pending_len() == 0;

            match self.circuit_breaker.state() {
                CircuitState::Closed => {}
                CircuitState::HalfOpen => {
                    if state == HealthState::Healthy {
                        state = HealthState::Degraded;
                    }
                }
                CircuitState::Open => {
                    state = HealthState::Unhealthy;
                    rate_available = false;
                }
            }

            HealthStatus::new(state, rate_available)
        })
    }
}

/// One row of the FMP dividend-adjusted EOD payload.
///
/// Every field is optional: rows missing required values are rejected
/// individually instead of failing the whole batch.
#[derive(Debug, Clone, Deserialize)]
struct FmpEodRow {
    date: Option<String>,
    #[serde(rename = "adjOpen")]
    adj_open: Option<f64>,
    #[serde(rename = "adjHigh")]
    adj_high: Option<f64>,
    #[serde(rename = "adjLow")]
    adj_low: Option<f64>,
    #[serde(rename = "adjClose")]
    adj_close: Option<f64>,
    volume: Option<f64>,
    #[serde(default)]
    change: Option<f64>,
    #[serde(rename = "changePercent", default)]
    change_percent: Option<f64>,
    #[serde(default)]
    vwap: Option<f64>,
}

fn normalize_rows(req: &DailyBarsRequest, rows: Vec<FmpEodRow>) -> DailyBarsBatch {
    let mut bars = Vec::with_capacity(rows.len());
    let mut rejected_rows = 0_usize;

    for row in rows {
        match normalize_row(row) {
            Some(bar) => bars.push(bar),
            None => rejected_rows += 1,
        }
    }

    // FMP returns newest first; the pipeline contract is oldest first.
    bars.sort_by_key(|bar| bar.ts);

    if let Some(cursor) = req.newer_than {
        bars.retain(|bar| bar.ts > cursor);
    }

    DailyBarsBatch {
        series: BarSeries::new(req.symbol.clone(), bars),
        rejected_rows,
    }
}

fn normalize_row(row: FmpEodRow) -> Option<Bar> {
    let ts = UtcDateTime::from_date_str(row.date.as_deref()?).ok()?;
    Bar::new(
        ts,
        row.adj_open?,
        row.adj_high?,
        row.adj_low?,
        row.adj_close?,
        row.volume?,
        row.change,
        row.change_percent,
        row.vwap,
    )
    .ok()
}

fn symbol_seed(symbol: &Symbol) -> u64 {
    symbol.as_str().bytes().fold(11_u64, |acc, byte| {
        acc.wrapping_mul(31).wrapping_add(byte as u64)
    })
}
