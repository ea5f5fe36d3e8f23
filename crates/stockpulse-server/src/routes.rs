//! API route handlers.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use stockpulse_core::{PatternType, Symbol, UtcDateTime};
use stockpulse_pipeline::{MetricsReport, SymbolOutcome, SyncJob, SyncReport, TaMetricsJob};
use stockpulse_warehouse::{PatternRecord, StoredBar};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
    pub run_id: String,
    pub stocks_synced: usize,
    pub records_inserted: usize,
    pub outcomes: Vec<SymbolOutcome>,
}

impl From<SyncReport> for SyncResponse {
    fn from(report: SyncReport) -> Self {
        Self {
            success: true,
            message: format!("Synced data for {} stocks", report.stocks_synced),
            run_id: report.run_id.clone(),
            stocks_synced: report.stocks_synced,
            records_inserted: report.records_inserted,
            outcomes: report.outcomes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub success: bool,
    pub message: String,
    pub run_id: String,
    pub stocks_processed: usize,
    pub patterns_found: usize,
    pub outcomes: Vec<SymbolOutcome>,
}

impl From<MetricsReport> for MetricsResponse {
    fn from(report: MetricsReport) -> Self {
        Self {
            success: true,
            message: String::from("TA metrics calculated"),
            run_id: report.run_id.clone(),
            stocks_processed: report.stocks_processed,
            patterns_found: report.patterns_found,
            outcomes: report.outcomes,
        }
    }
}

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Stockpulse Analytics Service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let provider = state.provider.health().await;
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": provider,
    }))
}

/// Trigger the sync/backfill job. Idempotent: re-invoking over an
/// unchanged provider history inserts nothing new.
pub async fn run_sync(State(state): State<AppState>) -> Json<SyncResponse> {
    let job = SyncJob::new(
        Arc::clone(&state.provider),
        state.warehouse.clone(),
        state.config.clone(),
    );
    Json(SyncResponse::from(job.run().await))
}

/// Trigger indicator computation and pattern detection. Idempotent for
/// the same stored bar range.
pub async fn run_ta_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    let job = TaMetricsJob::new(state.warehouse.clone(), state.config.clone());
    Json(MetricsResponse::from(job.run().await))
}

#[derive(Debug, Default, Deserialize)]
pub struct BarsQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

pub async fn bars(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<BarsQuery>,
) -> Result<Json<Vec<StoredBar>>, ApiError> {
    let symbol =
        Symbol::parse(&symbol).map_err(|error| ApiError::BadRequest(error.to_string()))?;
    for bound in [query.start.as_deref(), query.end.as_deref()]
        .into_iter()
        .flatten()
    {
        UtcDateTime::parse(bound).map_err(|error| ApiError::BadRequest(error.to_string()))?;
    }

    let warehouse = state.warehouse.clone();
    let rows = tokio::task::spawn_blocking(move || {
        warehouse.bars_for_symbol(symbol.as_str(), query.start.as_deref(), query.end.as_deref())
    })
    .await
    .map_err(|join_error| ApiError::Internal(join_error.to_string()))??;

    Ok(Json(rows))
}

#[derive(Debug, Default, Deserialize)]
pub struct PatternsQuery {
    pub symbol: Option<String>,
    pub pattern_type: Option<String>,
}

pub async fn patterns(
    State(state): State<AppState>,
    Query(query): Query<PatternsQuery>,
) -> Result<Json<Vec<PatternRecord>>, ApiError> {
    let symbol = query
        .symbol
        .as_deref()
        .map(Symbol::parse)
        .transpose()
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;
    let pattern_type = query
        .pattern_type
        .as_deref()
        .map(PatternType::from_str)
        .transpose()
        .map_err(|error| ApiError::BadRequest(error.to_string()))?;

    let warehouse = state.warehouse.clone();
    let rows = tokio::task::spawn_blocking(move || {
        warehouse.patterns(
            symbol.as_ref().map(Symbol::as_str),
            pattern_type.map(PatternType::as_str),
        )
    })
    .await
    .map_err(|join_error| ApiError::Internal(join_error.to_string()))??;

    Ok(Json(rows))
}

pub async fn symbols(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let warehouse = state.warehouse.clone();
    let rows = tokio::task::spawn_blocking(move || warehouse.symbols())
        .await
        .map_err(|join_error| ApiError::Internal(join_error.to_string()))??;
    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use stockpulse_core::{FmpAdapter, PipelineConfig};
    use stockpulse_warehouse::{Warehouse, WarehouseConfig};
    use tempfile::tempdir;

    use super::*;

    fn test_state(temp: &tempfile::TempDir) -> AppState {
        let home = temp.path().join("stockpulse-home");
        let warehouse = Warehouse::open(WarehouseConfig {
            db_path: home.join("warehouse.duckdb"),
            home,
            max_pool_size: 2,
        })
        .expect("warehouse open");

        let config = PipelineConfig {
            symbols: vec![
                Symbol::parse("AAPL").expect("symbol"),
                Symbol::parse("MSFT").expect("symbol"),
            ],
            ..PipelineConfig::default()
        };

        // Default adapter carries the mock transport: no network involved.
        AppState::new(warehouse, Arc::new(FmpAdapter::default()), config)
    }

    #[tokio::test]
    async fn sync_then_metrics_round_trip() {
        let temp = tempdir().expect("tempdir");
        let state = test_state(&temp);

        let sync = run_sync(State(state.clone())).await;
        assert!(sync.0.success);
        assert_eq!(sync.0.stocks_synced, 2);
        assert!(sync.0.records_inserted > 0);

        let metrics = run_ta_metrics(State(state.clone())).await;
        assert!(metrics.0.success);
        assert_eq!(metrics.0.stocks_processed, 2);

        let bars = bars(
            State(state.clone()),
            Path(String::from("aapl")),
            Query(BarsQuery::default()),
        )
        .await
        .expect("bars");
        assert!(!bars.0.is_empty());
        assert!(bars.0[0].symbol == "AAPL");

        let listed = symbols(State(state)).await.expect("symbols");
        assert_eq!(listed.0, vec![String::from("AAPL"), String::from("MSFT")]);
    }

    #[tokio::test]
    async fn invalid_symbol_is_a_bad_request() {
        let temp = tempdir().expect("tempdir");
        let state = test_state(&temp);

        let error = bars(
            State(state),
            Path(String::from("not a symbol")),
            Query(BarsQuery::default()),
        )
        .await
        .expect_err("must fail");
        assert!(matches!(error, ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn unknown_pattern_type_is_a_bad_request() {
        let temp = tempdir().expect("tempdir");
        let state = test_state(&temp);

        let error = patterns(
            State(state),
            Query(PatternsQuery {
                symbol: None,
                pattern_type: Some(String::from("cup_and_handle")),
            }),
        )
        .await
        .expect_err("must fail");
        assert!(matches!(error, ApiError::BadRequest(_)));
    }
}
