//! TA-metrics job: indicators and patterns over stored bars.
//!
//! Per symbol: load the full stored bar sequence, compute indicator rows,
//! run the pattern detectors, and write both back in one transaction.
//! Because the engine and detectors are deterministic and the writer is
//! keyed, re-running over an unchanged bar range changes nothing.

use stockpulse_core::{Bar, PipelineConfig, Symbol, UtcDateTime};
use stockpulse_ta::{DetectorConfig, IndicatorEngine, PatternDetector};
use stockpulse_warehouse::{IndicatorUpdate, PatternRecord, StoredBar, Warehouse};
use uuid::Uuid;

use crate::report::{MetricsReport, SymbolOutcome, SymbolStatus};
use crate::worker::run_symbol_workers;

pub struct TaMetricsJob {
    warehouse: Warehouse,
    config: PipelineConfig,
    detector: PatternDetector,
}

impl TaMetricsJob {
    pub fn new(warehouse: Warehouse, config: PipelineConfig) -> Self {
        let detector = PatternDetector::new(DetectorConfig::from(&config));
        Self {
            warehouse,
            config,
            detector,
        }
    }

    /// Run indicator computation and pattern detection for the universe.
    pub async fn run(&self) -> MetricsReport {
        let run_id = Uuid::new_v4().to_string();
        tracing::info!(
            run_id = %run_id,
            symbols = self.config.symbols.len(),
            "ta-metrics run started"
        );

        let outcomes = run_symbol_workers(
            &self.config.symbols,
            self.config.sync_concurrency,
            self.config.run_deadline(),
            |symbol| {
                let warehouse = self.warehouse.clone();
                let detector = self.detector;
                let run_id = run_id.clone();
                Box::pin(process_symbol(warehouse, detector, symbol, run_id))
            },
        )
        .await;

        let stocks_processed = outcomes
            .iter()
            .filter(|outcome| outcome.status == SymbolStatus::Succeeded)
            .count();
        let patterns_found = outcomes.iter().map(|outcome| outcome.records).sum();

        let report = MetricsReport {
            run_id,
            stocks_processed,
            patterns_found,
            outcomes,
        };
        tracing::info!(
            run_id = %report.run_id,
            stocks_processed = report.stocks_processed,
            patterns_found = report.patterns_found,
            failures = report.failures().count(),
            "ta-metrics run finished"
        );
        report
    }
}

async fn process_symbol(
    warehouse: Warehouse,
    detector: PatternDetector,
    symbol: Symbol,
    run_id: String,
) -> SymbolOutcome {
    let stored = {
        let warehouse = warehouse.clone();
        let name = symbol.to_string();
        match tokio::task::spawn_blocking(move || warehouse.bars_for_symbol(&name, None, None))
            .await
        {
            Ok(Ok(bars)) => bars,
            Ok(Err(error)) => return SymbolOutcome::failed(symbol.to_string(), error.to_string()),
            Err(join_error) => {
                return SymbolOutcome::failed(symbol.to_string(), join_error.to_string())
            }
        }
    };

    if stored.is_empty() {
        return SymbolOutcome::skipped(symbol.to_string(), "no bars stored");
    }

    let bars = match rehydrate_bars(&stored) {
        Ok(bars) => bars,
        Err(detail) => {
            tracing::error!(symbol = %symbol, detail = %detail, "stored bars failed rehydration");
            return SymbolOutcome::failed(symbol.to_string(), detail);
        }
    };

    let rows = IndicatorEngine::compute(&bars);
    let patterns = match detector.detect(&symbol, &bars, &rows) {
        Ok(patterns) => patterns,
        Err(error) => return SymbolOutcome::failed(symbol.to_string(), error.to_string()),
    };

    let updates: Vec<IndicatorUpdate> = rows
        .iter()
        .map(|row| IndicatorUpdate {
            ts: row.ts.format_rfc3339(),
            sma_20: row.sma_20,
            sma_50: row.sma_50,
            sma_200: row.sma_200,
            ema_12: row.ema_12,
            ema_20: row.ema_20,
            ema_26: row.ema_26,
            macd_line: row.macd_line,
            macd_signal_line: row.macd_signal_line,
            macd_histogram: row.macd_histogram,
            rsi: row.rsi,
            atr: row.atr,
            bb_upper: row.bb_upper,
            bb_lower: row.bb_lower,
        })
        .collect();

    let pattern_records: Vec<PatternRecord> = patterns
        .iter()
        .map(|pattern| PatternRecord {
            pattern_id: pattern.pattern_id.clone(),
            symbol: pattern.symbol.to_string(),
            pattern_type: pattern.pattern_type.to_string(),
            start_time: pattern.start_time.format_rfc3339(),
            end_time: pattern.end_time.format_rfc3339(),
            confidence: pattern.confidence,
        })
        .collect();

    let request_id = format!("ta-metrics:{run_id}:{symbol}");
    let write = {
        let warehouse = warehouse.clone();
        let name = symbol.to_string();
        tokio::task::spawn_blocking(move || {
            warehouse.write_symbol_metrics(&name, &request_id, &updates, &pattern_records)
        })
        .await
    };

    match write {
        Ok(Ok(new_patterns)) => SymbolOutcome::succeeded(symbol.to_string(), new_patterns),
        Ok(Err(error)) => SymbolOutcome::failed(symbol.to_string(), error.to_string()),
        Err(join_error) => SymbolOutcome::failed(symbol.to_string(), join_error.to_string()),
    }
}

/// Turn stored rows back into validated domain bars. A row that fails
/// here points at storage-level corruption, which fails the symbol.
fn rehydrate_bars(stored: &[StoredBar]) -> Result<Vec<Bar>, String> {
    stored
        .iter()
        .map(|row| {
            let ts = UtcDateTime::parse(&row.ts).map_err(|error| error.to_string())?;
            Bar::new(
                ts,
                row.open,
                row.high,
                row.low,
                row.close,
                row.volume,
                row.change,
                row.change_percent,
                row.vwap,
            )
            .map_err(|error| format!("bar at {}: {error}", row.ts))
        })
        .collect()
}
