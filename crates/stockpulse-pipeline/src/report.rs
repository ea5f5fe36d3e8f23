use serde::Serialize;

/// Terminal state of one symbol within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolStatus {
    Succeeded,
    Failed,
    Skipped,
}

/// Per-symbol result line in a run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub status: SymbolStatus,
    /// Bars inserted (sync) or new patterns stored (ta-metrics).
    pub records: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SymbolOutcome {
    pub fn succeeded(symbol: impl Into<String>, records: usize) -> Self {
        Self {
            symbol: symbol.into(),
            status: SymbolStatus::Succeeded,
            records,
            detail: None,
        }
    }

    pub fn failed(symbol: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            status: SymbolStatus::Failed,
            records: 0,
            detail: Some(detail.into()),
        }
    }

    pub fn skipped(symbol: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            status: SymbolStatus::Skipped,
            records: 0,
            detail: Some(detail.into()),
        }
    }
}

/// Summary of one sync/backfill run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub run_id: String,
    /// Symbols that received at least one new bar.
    pub stocks_synced: usize,
    pub records_inserted: usize,
    pub outcomes: Vec<SymbolOutcome>,
}

impl SyncReport {
    pub fn failures(&self) -> impl Iterator<Item = &SymbolOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == SymbolStatus::Failed)
    }
}

/// Summary of one TA-metrics run.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub run_id: String,
    pub stocks_processed: usize,
    /// Newly stored pattern rows; a re-run over unchanged bars yields 0.
    pub patterns_found: usize,
    pub outcomes: Vec<SymbolOutcome>,
}

impl MetricsReport {
    pub fn failures(&self) -> impl Iterator<Item = &SymbolOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == SymbolStatus::Failed)
    }
}
