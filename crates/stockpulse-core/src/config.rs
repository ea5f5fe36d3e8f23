use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CoreError, Symbol, UtcDateTime, ValidationError};

/// Which moving-average pair the golden/death cross detector compares.
///
/// `Ema20Sma50` is the default so crosses can emit on histories shorter
/// than 200 bars; `Sma50Sma200` is the classical long-horizon pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossPolicy {
    #[default]
    Ema20Sma50,
    Sma50Sma200,
}

impl CrossPolicy {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ema20Sma50 => "ema20-sma50",
            Self::Sma50Sma200 => "sma50-sma200",
        }
    }
}

impl FromStr for CrossPolicy {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ema20-sma50" => Ok(Self::Ema20Sma50),
            "sma50-sma200" => Ok(Self::Sma50Sma200),
            other => Err(ValidationError::InvalidCrossPolicy {
                value: other.to_owned(),
            }),
        }
    }
}

/// Default symbol universe when no config file overrides it.
pub const DEFAULT_SYMBOLS: [&str; 20] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "META", "TSLA", "NVDA", "JPM", "V", "JNJ", "WMT", "PG", "MA",
    "UNH", "HD", "DIS", "BAC", "ADBE", "NFLX", "CRM",
];

/// Tuning knobs for the sync and TA-metrics jobs.
///
/// Loaded from a JSON file when provided; every field falls back to its
/// default when absent. The provider credential is deliberately not here:
/// it only ever comes from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub symbols: Vec<Symbol>,
    /// Floor for initial backfills when a symbol has no sync cursor yet.
    pub history_start: UtcDateTime,
    pub sync_concurrency: usize,
    pub run_deadline_secs: u64,
    pub cross_policy: CrossPolicy,
    /// Window over which Bollinger band width must be the minimum for a
    /// squeeze to be flagged.
    pub squeeze_window: usize,
    /// Bars after a squeeze in which a band breakout still counts.
    pub breakout_lookahead: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            symbols: DEFAULT_SYMBOLS
                .iter()
                .map(|raw| Symbol::parse(raw).expect("default symbols are valid"))
                .collect(),
            history_start: UtcDateTime::parse("1985-01-01T00:00:00Z")
                .expect("history floor is a valid timestamp"),
            sync_concurrency: 4,
            run_deadline_secs: 30 * 60,
            cross_policy: CrossPolicy::default(),
            squeeze_window: 20,
            breakout_lookahead: 5,
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn run_deadline(&self) -> Duration {
        Duration::from_secs(self.run_deadline_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_stock_universe() {
        let config = PipelineConfig::default();
        assert_eq!(config.symbols.len(), 20);
        assert_eq!(config.run_deadline(), Duration::from_secs(1800));
        assert_eq!(config.cross_policy, CrossPolicy::Ema20Sma50);
    }

    #[test]
    fn partial_json_overlays_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"symbols": ["aapl"], "sync_concurrency": 2}"#)
                .expect("must parse");

        assert_eq!(config.symbols.len(), 1);
        assert_eq!(config.symbols[0].as_str(), "AAPL");
        assert_eq!(config.sync_concurrency, 2);
        assert_eq!(config.squeeze_window, 20);
    }

    #[test]
    fn cross_policy_parses_both_pairings() {
        assert_eq!(
            CrossPolicy::from_str("ema20-sma50").expect("must parse"),
            CrossPolicy::Ema20Sma50
        );
        assert_eq!(
            CrossPolicy::from_str("SMA50-SMA200").expect("must parse"),
            CrossPolicy::Sma50Sma200
        );
        assert!(CrossPolicy::from_str("ema12-ema26").is_err());
    }
}
