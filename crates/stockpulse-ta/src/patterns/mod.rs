//! Pattern detection over bars and their computed indicator rows.
//!
//! Every pattern type runs as its own small state machine; detectors are
//! independent and a single bar may emit several pattern types. The
//! detector itself is stateless between runs — identical input produces
//! identical emissions with identical ids, which is what makes re-runs
//! idempotent once the warehouse applies insert-or-ignore.

mod candles;
mod crossovers;

use stockpulse_core::{Bar, CrossPolicy, IndicatorRow, Pattern, PipelineConfig, Symbol, ValidationError};

/// Detector tuning, derived from the pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    pub cross_policy: CrossPolicy,
    pub squeeze_window: usize,
    pub breakout_lookahead: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            cross_policy: CrossPolicy::default(),
            squeeze_window: 20,
            breakout_lookahead: 5,
        }
    }
}

impl From<&PipelineConfig> for DetectorConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            cross_policy: config.cross_policy,
            squeeze_window: config.squeeze_window,
            breakout_lookahead: config.breakout_lookahead,
        }
    }
}

/// Scans one symbol's bar/indicator sequence for every pattern type.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternDetector {
    config: DetectorConfig,
}

impl PatternDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Run every detector over the sequence.
    ///
    /// `bars` and `rows` must be the same length and aligned by index,
    /// ascending in time — exactly what
    /// [`IndicatorEngine::compute`](crate::IndicatorEngine::compute)
    /// returns for the same bars.
    pub fn detect(
        &self,
        symbol: &Symbol,
        bars: &[Bar],
        rows: &[IndicatorRow],
    ) -> Result<Vec<Pattern>, ValidationError> {
        let mut patterns = Vec::new();

        patterns.extend(crossovers::detect_ma_cross(
            symbol,
            rows,
            self.config.cross_policy,
        )?);
        patterns.extend(crossovers::detect_rsi_reversals(symbol, rows)?);
        patterns.extend(crossovers::detect_macd_zero_cross(symbol, rows)?);
        patterns.extend(crossovers::detect_bollinger_breakouts(
            symbol,
            bars,
            rows,
            self.config.squeeze_window,
            self.config.breakout_lookahead,
        )?);
        patterns.extend(candles::detect_candles(symbol, bars)?);

        Ok(patterns)
    }
}
