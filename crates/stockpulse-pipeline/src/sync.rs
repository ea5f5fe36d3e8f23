//! Sync/backfill job: provider history into the bar store.
//!
//! Per symbol: read the sync cursor, fetch dividend-adjusted daily
//! history (full history from the configured floor when no cursor
//! exists), and write the new bars plus the advanced cursor in one
//! transaction. Transient provider errors are retried with backoff;
//! permanent ones fail only that symbol.

use std::sync::Arc;
use std::time::Instant;

use stockpulse_core::{
    retry_source, DailyBarsRequest, MarketDataSource, PipelineConfig, RetryConfig, Symbol,
    UtcDateTime,
};
use stockpulse_warehouse::{BarRecord, Warehouse};
use uuid::Uuid;

use crate::report::{SymbolOutcome, SymbolStatus, SyncReport};
use crate::worker::run_symbol_workers;

pub struct SyncJob {
    provider: Arc<dyn MarketDataSource>,
    warehouse: Warehouse,
    config: PipelineConfig,
    retry: RetryConfig,
}

impl SyncJob {
    pub fn new(
        provider: Arc<dyn MarketDataSource>,
        warehouse: Warehouse,
        config: PipelineConfig,
    ) -> Self {
        Self {
            provider,
            warehouse,
            config,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Run the sync for the configured symbol universe.
    ///
    /// Never fails as a whole: each symbol's outcome is reported
    /// individually. Storage being unreachable surfaces earlier, when the
    /// warehouse is opened.
    pub async fn run(&self) -> SyncReport {
        let run_id = Uuid::new_v4().to_string();
        tracing::info!(
            run_id = %run_id,
            symbols = self.config.symbols.len(),
            "sync run started"
        );

        let outcomes = run_symbol_workers(
            &self.config.symbols,
            self.config.sync_concurrency,
            self.config.run_deadline(),
            |symbol| {
                let provider = Arc::clone(&self.provider);
                let warehouse = self.warehouse.clone();
                let retry = self.retry.clone();
                let history_start = self.config.history_start;
                let run_id = run_id.clone();
                Box::pin(sync_symbol(
                    provider,
                    warehouse,
                    retry,
                    history_start,
                    symbol,
                    run_id,
                ))
            },
        )
        .await;

        let stocks_synced = outcomes
            .iter()
            .filter(|outcome| outcome.status == SymbolStatus::Succeeded && outcome.records > 0)
            .count();
        let records_inserted = outcomes.iter().map(|outcome| outcome.records).sum();

        let report = SyncReport {
            run_id,
            stocks_synced,
            records_inserted,
            outcomes,
        };
        tracing::info!(
            run_id = %report.run_id,
            stocks_synced = report.stocks_synced,
            records_inserted = report.records_inserted,
            failures = report.failures().count(),
            "sync run finished"
        );
        report
    }
}

async fn sync_symbol(
    provider: Arc<dyn MarketDataSource>,
    warehouse: Warehouse,
    retry: RetryConfig,
    history_start: UtcDateTime,
    symbol: Symbol,
    run_id: String,
) -> SymbolOutcome {
    let cursor = {
        let warehouse = warehouse.clone();
        let name = symbol.to_string();
        match tokio::task::spawn_blocking(move || warehouse.sync_cursor(&name)).await {
            Ok(Ok(raw)) => raw.and_then(|value| UtcDateTime::parse(&value).ok()),
            Ok(Err(error)) => return SymbolOutcome::failed(symbol.to_string(), error.to_string()),
            Err(join_error) => {
                return SymbolOutcome::failed(symbol.to_string(), join_error.to_string())
            }
        }
    };
    let newer_than = cursor.unwrap_or(history_start);

    let request = DailyBarsRequest::new(symbol.clone()).newer_than(newer_than);
    let fetch_started = Instant::now();
    let batch = match retry_source(&retry, || provider.daily_bars(request.clone())).await {
        Ok(batch) => batch,
        Err(error) => {
            tracing::warn!(symbol = %symbol, error = %error, "symbol sync failed");
            return SymbolOutcome::failed(symbol.to_string(), error.to_string());
        }
    };
    let latency_ms = fetch_started.elapsed().as_millis() as u64;

    if batch.rejected_rows > 0 {
        tracing::warn!(
            symbol = %symbol,
            rejected = batch.rejected_rows,
            "provider rows failed validation and were dropped"
        );
    }

    if batch.series.is_empty() {
        return SymbolOutcome::succeeded(symbol.to_string(), 0);
    }

    let records: Vec<BarRecord> = batch
        .series
        .bars
        .iter()
        .map(|bar| BarRecord {
            symbol: symbol.to_string(),
            ts: bar.ts.format_rfc3339(),
            open: bar.open,
            high: bar.high,
            low: bar.low,
            close: bar.close,
            volume: bar.volume,
            change: bar.change,
            change_percent: bar.change_percent,
            vwap: bar.vwap,
        })
        .collect();

    let source = provider.id().as_str();
    let request_id = format!("sync:{run_id}:{symbol}");
    let write = {
        let warehouse = warehouse.clone();
        tokio::task::spawn_blocking(move || {
            warehouse.upsert_bars(source, &request_id, &records, latency_ms)
        })
        .await
    };

    match write {
        Ok(Ok(inserted)) => SymbolOutcome::succeeded(symbol.to_string(), inserted),
        Ok(Err(error)) => SymbolOutcome::failed(symbol.to_string(), error.to_string()),
        Err(join_error) => SymbolOutcome::failed(symbol.to_string(), join_error.to_string()),
    }
}
