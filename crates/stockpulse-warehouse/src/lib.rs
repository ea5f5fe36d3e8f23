//! # Stockpulse Warehouse
//!
//! DuckDB-backed storage for the TA pipeline: the daily bar table (OHLCV
//! plus indicator columns), the append-only pattern table, per-symbol
//! sync cursors, and an ingest audit log.
//!
//! ## Write semantics
//!
//! Every write path is a single transaction per symbol batch:
//!
//! - [`Warehouse::upsert_bars`] inserts-or-updates bars keyed by
//!   `(symbol, ts)` and advances the symbol's sync cursor in the same
//!   transaction, so a crashed run never records a cursor ahead of its
//!   data.
//! - [`Warehouse::write_symbol_metrics`] updates one symbol's indicator
//!   columns and inserts its pattern rows atomically. Pattern inserts are
//!   insert-or-ignore on the deterministic `pattern_id`, which makes
//!   re-running the pipeline over an unchanged bar range a no-op.
//!
//! All user-reachable values travel through parameterized statements.

pub mod migrations;
pub mod pool;

use std::env;
use std::fs;
use std::path::PathBuf;

use ::duckdb::ToSql;
use serde::Serialize;
use thiserror::Error;

pub use pool::{AccessMode, ConnectionPool, PooledConnection};

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Operation was rejected before touching the database.
    #[error("operation rejected: {0}")]
    Rejected(String),
}

/// Configuration for the warehouse database.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for stockpulse data.
    pub home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of pooled connections per access mode.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        let home = resolve_home();
        let db_path = home.join("warehouse.duckdb");
        Self {
            home,
            db_path,
            max_pool_size: 4,
        }
    }
}

/// A daily OHLCV row for ingestion. Timestamps are RFC3339 strings.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRecord {
    pub symbol: String,
    pub ts: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub vwap: Option<f64>,
}

/// Indicator column values for one `(symbol, ts)` key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IndicatorUpdate {
    pub ts: String,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub ema_12: Option<f64>,
    pub ema_20: Option<f64>,
    pub ema_26: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal_line: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
}

/// A detected pattern row keyed by its deterministic id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternRecord {
    pub pattern_id: String,
    pub symbol: String,
    pub pattern_type: String,
    pub start_time: String,
    pub end_time: String,
    pub confidence: Option<f64>,
}

/// A stored bar read back with its indicator columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredBar {
    pub symbol: String,
    pub ts: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub vwap: Option<f64>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
    pub ema_12: Option<f64>,
    pub ema_20: Option<f64>,
    pub ema_26: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal_line: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
}

/// The main warehouse interface.
#[derive(Clone)]
pub struct Warehouse {
    pool: ConnectionPool,
}

impl Warehouse {
    /// Open a warehouse with default configuration.
    pub fn open_default() -> Result<Self, WarehouseError> {
        Self::open(WarehouseConfig::default())
    }

    /// Open a warehouse, creating directories and applying migrations.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let pool = ConnectionPool::new(config.db_path.clone(), config.max_pool_size);
        let warehouse = Self { pool };
        warehouse.initialize()?;
        Ok(warehouse)
    }

    /// Apply schema migrations. Idempotent.
    pub fn initialize(&self) -> Result<(), WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        migrations::apply_migrations(&connection)?;
        Ok(())
    }

    /// Insert-or-update a validated bar batch for one symbol and advance
    /// its sync cursor, all in one transaction.
    ///
    /// The update list deliberately excludes the indicator columns:
    /// re-syncing a bar must not wipe previously computed metrics.
    pub fn upsert_bars(
        &self,
        source: &str,
        request_id: &str,
        rows: &[BarRecord],
        latency_ms: u64,
    ) -> Result<usize, WarehouseError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let cursor_ts = rows
            .iter()
            .map(|row| row.ts.as_str())
            .max()
            .expect("non-empty batch has a max timestamp")
            .to_owned();
        let symbol = rows[0].symbol.clone();

        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, WarehouseError> {
            for row in rows {
                let params: [&dyn ToSql; 11] = [
                    &row.symbol,
                    &row.ts,
                    &row.open,
                    &row.high,
                    &row.low,
                    &row.close,
                    &row.volume,
                    &row.change,
                    &row.change_percent,
                    &row.vwap,
                    &source,
                ];
                connection.execute(
                    "INSERT INTO bars_1d \
                     (symbol, ts, open, high, low, close, volume, change, change_percent, vwap, source, updated_at) \
                     VALUES (?, TRY_CAST(? AS TIMESTAMP), ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP) \
                     ON CONFLICT (symbol, ts) DO UPDATE SET \
                     open = excluded.open, high = excluded.high, low = excluded.low, \
                     close = excluded.close, volume = excluded.volume, change = excluded.change, \
                     change_percent = excluded.change_percent, vwap = excluded.vwap, \
                     source = excluded.source, updated_at = CURRENT_TIMESTAMP",
                    params.as_slice(),
                )?;
            }

            let params: [&dyn ToSql; 2] = [&symbol, &cursor_ts];
            connection.execute(
                "INSERT INTO sync_cursor (symbol, last_ts, updated_at) \
                 VALUES (?, TRY_CAST(? AS TIMESTAMP), CURRENT_TIMESTAMP) \
                 ON CONFLICT (symbol) DO UPDATE SET \
                 last_ts = excluded.last_ts, updated_at = CURRENT_TIMESTAMP",
                params.as_slice(),
            )?;

            let latency = latency_ms as i64;
            let params: [&dyn ToSql; 4] = [&request_id, &symbol, &source, &latency];
            connection.execute(
                "INSERT INTO ingest_log \
                 (request_id, symbol, source, dataset, status, latency_ms, timestamp) \
                 VALUES (?, ?, ?, 'bars_1d', 'ok', ?, CURRENT_TIMESTAMP)",
                params.as_slice(),
            )?;

            Ok(rows.len())
        })();

        finalize_transaction(&connection, result)
    }

    /// Atomically write one symbol's indicator rows and pattern
    /// emissions. Returns the number of newly inserted patterns.
    ///
    /// Indicator updates target existing bar rows; patterns are
    /// insert-or-ignore so historical detections survive re-runs
    /// unchanged.
    pub fn write_symbol_metrics(
        &self,
        symbol: &str,
        request_id: &str,
        updates: &[IndicatorUpdate],
        patterns: &[PatternRecord],
    ) -> Result<usize, WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadWrite)?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, WarehouseError> {
            for update in updates {
                let params: [&dyn ToSql; 15] = [
                    &update.sma_20,
                    &update.sma_50,
                    &update.sma_200,
                    &update.ema_12,
                    &update.ema_20,
                    &update.ema_26,
                    &update.macd_line,
                    &update.macd_signal_line,
                    &update.macd_histogram,
                    &update.rsi,
                    &update.atr,
                    &update.bb_upper,
                    &update.bb_lower,
                    &symbol,
                    &update.ts,
                ];
                connection.execute(
                    "UPDATE bars_1d SET \
                     sma_20 = ?, sma_50 = ?, sma_200 = ?, \
                     ema_12 = ?, ema_20 = ?, ema_26 = ?, \
                     macd_line = ?, macd_signal_line = ?, macd_histogram = ?, \
                     rsi = ?, atr = ?, bb_upper = ?, bb_lower = ?, \
                     updated_at = CURRENT_TIMESTAMP \
                     WHERE symbol = ? AND ts = TRY_CAST(? AS TIMESTAMP)",
                    params.as_slice(),
                )?;
            }

            let mut inserted = 0_usize;
            for pattern in patterns {
                let params: [&dyn ToSql; 6] = [
                    &pattern.pattern_id,
                    &pattern.symbol,
                    &pattern.pattern_type,
                    &pattern.start_time,
                    &pattern.end_time,
                    &pattern.confidence,
                ];
                inserted += connection.execute(
                    "INSERT OR IGNORE INTO patterns \
                     (pattern_id, symbol, pattern_type, start_time, end_time, confidence, created_at) \
                     VALUES (?, ?, ?, TRY_CAST(? AS TIMESTAMP), TRY_CAST(? AS TIMESTAMP), ?, CURRENT_TIMESTAMP)",
                    params.as_slice(),
                )?;
            }

            let params: [&dyn ToSql; 2] = [&request_id, &symbol];
            connection.execute(
                "INSERT INTO ingest_log \
                 (request_id, symbol, source, dataset, status, latency_ms, timestamp) \
                 VALUES (?, ?, 'ta-engine', 'ta_metrics', 'ok', NULL, CURRENT_TIMESTAMP)",
                params.as_slice(),
            )?;

            Ok(inserted)
        })();

        finalize_transaction(&connection, result)
    }

    /// Bars for one symbol, ascending, optionally bounded by RFC3339
    /// timestamps (inclusive).
    pub fn bars_for_symbol(
        &self,
        symbol: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<StoredBar>, WarehouseError> {
        let mut sql = String::from(
            "SELECT symbol, strftime(ts, '%Y-%m-%dT%H:%M:%SZ'), open, high, low, close, volume, \
             change, change_percent, vwap, sma_20, sma_50, sma_200, ema_12, ema_20, ema_26, \
             macd_line, macd_signal_line, macd_histogram, rsi, atr, bb_upper, bb_lower \
             FROM bars_1d WHERE symbol = ?",
        );
        let mut params: Vec<&dyn ToSql> = vec![&symbol];
        if start.is_some() {
            sql.push_str(" AND ts >= TRY_CAST(? AS TIMESTAMP)");
            params.push(&start);
        }
        if end.is_some() {
            sql.push_str(" AND ts <= TRY_CAST(? AS TIMESTAMP)");
            params.push(&end);
        }
        sql.push_str(" ORDER BY ts ASC");

        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let mut statement = connection.prepare(sql.as_str())?;
        let rows = statement.query_map(params.as_slice(), |row| {
            Ok(StoredBar {
                symbol: row.get(0)?,
                ts: row.get(1)?,
                open: row.get(2)?,
                high: row.get(3)?,
                low: row.get(4)?,
                close: row.get(5)?,
                volume: row.get(6)?,
                change: row.get(7)?,
                change_percent: row.get(8)?,
                vwap: row.get(9)?,
                sma_20: row.get(10)?,
                sma_50: row.get(11)?,
                sma_200: row.get(12)?,
                ema_12: row.get(13)?,
                ema_20: row.get(14)?,
                ema_26: row.get(15)?,
                macd_line: row.get(16)?,
                macd_signal_line: row.get(17)?,
                macd_histogram: row.get(18)?,
                rsi: row.get(19)?,
                atr: row.get(20)?,
                bb_upper: row.get(21)?,
                bb_lower: row.get(22)?,
            })
        })?;

        let mut bars = Vec::new();
        for bar in rows {
            bars.push(bar?);
        }
        Ok(bars)
    }

    /// Pattern rows, optionally filtered by symbol and/or pattern type,
    /// in a stable order.
    pub fn patterns(
        &self,
        symbol: Option<&str>,
        pattern_type: Option<&str>,
    ) -> Result<Vec<PatternRecord>, WarehouseError> {
        let mut sql = String::from(
            "SELECT pattern_id, symbol, pattern_type, \
             strftime(start_time, '%Y-%m-%dT%H:%M:%SZ'), \
             strftime(end_time, '%Y-%m-%dT%H:%M:%SZ'), confidence \
             FROM patterns",
        );
        let mut clauses: Vec<&str> = Vec::new();
        let mut params: Vec<&dyn ToSql> = Vec::new();
        if symbol.is_some() {
            clauses.push("symbol = ?");
            params.push(&symbol);
        }
        if pattern_type.is_some() {
            clauses.push("pattern_type = ?");
            params.push(&pattern_type);
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY end_time ASC, pattern_id ASC");

        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let mut statement = connection.prepare(sql.as_str())?;
        let rows = statement.query_map(params.as_slice(), |row| {
            Ok(PatternRecord {
                pattern_id: row.get(0)?,
                symbol: row.get(1)?,
                pattern_type: row.get(2)?,
                start_time: row.get(3)?,
                end_time: row.get(4)?,
                confidence: row.get(5)?,
            })
        })?;

        let mut patterns = Vec::new();
        for pattern in rows {
            patterns.push(pattern?);
        }
        Ok(patterns)
    }

    /// Last successfully synced bar timestamp for a symbol.
    pub fn sync_cursor(&self, symbol: &str) -> Result<Option<String>, WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let mut statement = connection.prepare(
            "SELECT strftime(last_ts, '%Y-%m-%dT%H:%M:%SZ') FROM sync_cursor WHERE symbol = ?",
        )?;
        let mut rows = statement.query([&symbol])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Distinct symbols present in the bar store.
    pub fn symbols(&self) -> Result<Vec<String>, WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let mut statement =
            connection.prepare("SELECT DISTINCT symbol FROM bars_1d ORDER BY symbol ASC")?;
        let rows = statement.query_map([], |row| row.get::<_, String>(0))?;

        let mut symbols = Vec::new();
        for symbol in rows {
            symbols.push(symbol?);
        }
        Ok(symbols)
    }

    /// Number of stored bars for a symbol.
    pub fn bar_count(&self, symbol: &str) -> Result<i64, WarehouseError> {
        let connection = self.pool.acquire(AccessMode::ReadOnly)?;
        let count = connection.query_row(
            "SELECT COUNT(*) FROM bars_1d WHERE symbol = ?",
            [&symbol],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Finalize a transaction, committing on success or rolling back on
/// failure.
fn finalize_transaction<T>(
    connection: &PooledConnection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// Resolve the stockpulse home directory from environment or default.
fn resolve_home() -> PathBuf {
    if let Some(path) = env::var_os("STOCKPULSE_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".stockpulse");
    }

    PathBuf::from(".stockpulse")
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn open_temp() -> (tempfile::TempDir, Warehouse) {
        let temp = tempdir().expect("tempdir");
        let home = temp.path().join("stockpulse-home");
        let db_path = home.join("warehouse.duckdb");
        let warehouse = Warehouse::open(WarehouseConfig {
            home,
            db_path,
            max_pool_size: 2,
        })
        .expect("warehouse open");
        (temp, warehouse)
    }

    fn bar(symbol: &str, ts: &str, close: f64) -> BarRecord {
        BarRecord {
            symbol: symbol.to_owned(),
            ts: ts.to_owned(),
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1_000.0,
            change: None,
            change_percent: None,
            vwap: None,
        }
    }

    #[test]
    fn upsert_bars_is_idempotent_and_advances_cursor() {
        let (_guard, warehouse) = open_temp();
        let rows = vec![
            bar("AAPL", "2025-06-02T00:00:00Z", 101.0),
            bar("AAPL", "2025-06-03T00:00:00Z", 102.0),
        ];

        warehouse
            .upsert_bars("fmp", "req-1", &rows, 10)
            .expect("first upsert");
        warehouse
            .upsert_bars("fmp", "req-2", &rows, 10)
            .expect("second upsert");

        assert_eq!(warehouse.bar_count("AAPL").expect("count"), 2);
        assert_eq!(
            warehouse.sync_cursor("AAPL").expect("cursor").as_deref(),
            Some("2025-06-03T00:00:00Z")
        );
    }

    #[test]
    fn resync_preserves_indicator_columns() {
        let (_guard, warehouse) = open_temp();
        let rows = vec![bar("AAPL", "2025-06-02T00:00:00Z", 101.0)];
        warehouse
            .upsert_bars("fmp", "req-1", &rows, 10)
            .expect("upsert");

        let update = IndicatorUpdate {
            ts: "2025-06-02T00:00:00Z".to_owned(),
            rsi: Some(55.5),
            ..IndicatorUpdate::default()
        };
        warehouse
            .write_symbol_metrics("AAPL", "req-2", &[update], &[])
            .expect("metrics");

        // Re-syncing the same bar must not wipe computed metrics.
        warehouse
            .upsert_bars("fmp", "req-3", &rows, 10)
            .expect("re-upsert");

        let bars = warehouse
            .bars_for_symbol("AAPL", None, None)
            .expect("read");
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].rsi, Some(55.5));
    }

    #[test]
    fn pattern_inserts_are_append_only_and_deduplicated() {
        let (_guard, warehouse) = open_temp();
        warehouse
            .upsert_bars("fmp", "req-1", &[bar("AAPL", "2025-06-02T00:00:00Z", 101.0)], 10)
            .expect("upsert");

        let pattern = PatternRecord {
            pattern_id: "AAPL_golden_cross_2025-06-02T00:00:00Z_2025-06-02T00:00:00Z".to_owned(),
            symbol: "AAPL".to_owned(),
            pattern_type: "golden_cross".to_owned(),
            start_time: "2025-06-02T00:00:00Z".to_owned(),
            end_time: "2025-06-02T00:00:00Z".to_owned(),
            confidence: None,
        };

        let first = warehouse
            .write_symbol_metrics("AAPL", "req-2", &[], std::slice::from_ref(&pattern))
            .expect("first write");
        let second = warehouse
            .write_symbol_metrics("AAPL", "req-3", &[], std::slice::from_ref(&pattern))
            .expect("second write");

        assert_eq!(first, 1);
        assert_eq!(second, 0);

        let stored = warehouse.patterns(Some("AAPL"), None).expect("read");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].pattern_type, "golden_cross");
    }

    #[test]
    fn bars_read_back_ascending_within_bounds() {
        let (_guard, warehouse) = open_temp();
        let rows = vec![
            bar("MSFT", "2025-06-04T00:00:00Z", 103.0),
            bar("MSFT", "2025-06-02T00:00:00Z", 101.0),
            bar("MSFT", "2025-06-03T00:00:00Z", 102.0),
        ];
        warehouse
            .upsert_bars("fmp", "req-1", &rows, 10)
            .expect("upsert");

        let all = warehouse
            .bars_for_symbol("MSFT", None, None)
            .expect("read");
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|pair| pair[0].ts < pair[1].ts));

        let bounded = warehouse
            .bars_for_symbol(
                "MSFT",
                Some("2025-06-03T00:00:00Z"),
                Some("2025-06-03T00:00:00Z"),
            )
            .expect("read");
        assert_eq!(bounded.len(), 1);
        assert_eq!(bounded[0].close, 102.0);
    }

    #[test]
    fn pattern_filters_compose() {
        let (_guard, warehouse) = open_temp();
        let make = |symbol: &str, pattern_type: &str, ts: &str| PatternRecord {
            pattern_id: format!("{symbol}_{pattern_type}_{ts}_{ts}"),
            symbol: symbol.to_owned(),
            pattern_type: pattern_type.to_owned(),
            start_time: ts.to_owned(),
            end_time: ts.to_owned(),
            confidence: Some(0.5),
        };

        warehouse
            .write_symbol_metrics(
                "AAPL",
                "req-1",
                &[],
                &[
                    make("AAPL", "golden_cross", "2025-06-02T00:00:00Z"),
                    make("AAPL", "hammer", "2025-06-03T00:00:00Z"),
                ],
            )
            .expect("write");
        warehouse
            .write_symbol_metrics(
                "MSFT",
                "req-2",
                &[],
                &[make("MSFT", "golden_cross", "2025-06-02T00:00:00Z")],
            )
            .expect("write");

        assert_eq!(warehouse.patterns(None, None).expect("all").len(), 3);
        assert_eq!(
            warehouse
                .patterns(Some("AAPL"), None)
                .expect("by symbol")
                .len(),
            2
        );
        assert_eq!(
            warehouse
                .patterns(None, Some("golden_cross"))
                .expect("by type")
                .len(),
            2
        );
        assert_eq!(
            warehouse
                .patterns(Some("AAPL"), Some("hammer"))
                .expect("both")
                .len(),
            1
        );
    }

    #[test]
    fn symbols_lists_distinct_tickers() {
        let (_guard, warehouse) = open_temp();
        warehouse
            .upsert_bars("fmp", "req-1", &[bar("MSFT", "2025-06-02T00:00:00Z", 1.0)], 1)
            .expect("upsert");
        warehouse
            .upsert_bars("fmp", "req-2", &[bar("AAPL", "2025-06-02T00:00:00Z", 1.0)], 1)
            .expect("upsert");
        warehouse
            .upsert_bars("fmp", "req-3", &[bar("AAPL", "2025-06-03T00:00:00Z", 2.0)], 1)
            .expect("upsert");

        assert_eq!(
            warehouse.symbols().expect("symbols"),
            vec!["AAPL".to_owned(), "MSFT".to_owned()]
        );
    }

    #[test]
    fn missing_cursor_reads_as_none() {
        let (_guard, warehouse) = open_temp();
        assert!(warehouse.sync_cursor("NOPE").expect("cursor").is_none());
    }
}
