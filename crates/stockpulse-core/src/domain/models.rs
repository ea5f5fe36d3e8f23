use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Symbol, UtcDateTime, ValidationError};

/// Daily OHLCV bar record.
///
/// Construction validates every invariant the indicator engine depends
/// on; a `Bar` that exists is a bar the rest of the pipeline can trust.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ts: UtcDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub change: Option<f64>,
    pub change_percent: Option<f64>,
    pub vwap: Option<f64>,
}

impl Bar {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        ts: UtcDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        change: Option<f64>,
        change_percent: Option<f64>,
        vwap: Option<f64>,
    ) -> Result<Self, ValidationError> {
        validate_non_negative("open", open)?;
        validate_non_negative("high", high)?;
        validate_non_negative("low", low)?;
        validate_non_negative("close", close)?;
        validate_non_negative("volume", volume)?;
        validate_optional_finite("change", change)?;
        validate_optional_finite("change_percent", change_percent)?;
        validate_optional_non_negative("vwap", vwap)?;

        if high < low {
            return Err(ValidationError::InvalidBarRange);
        }

        if open < low || open > high || close < low || close > high {
            return Err(ValidationError::InvalidBarBounds);
        }

        Ok(Self {
            ts,
            open,
            high,
            low,
            close,
            volume,
            change,
            change_percent,
            vwap,
        })
    }

    /// Wilder true range against the previous bar's close.
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }

    /// Absolute size of the candle body.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Full high-to-low range of the candle.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close >= self.open
    }
}

/// Ascending-by-timestamp bar sequence for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub symbol: Symbol,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: Symbol, bars: Vec<Bar>) -> Self {
        Self { symbol, bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Latest bar timestamp, if any bars exist.
    pub fn last_ts(&self) -> Option<UtcDateTime> {
        self.bars.last().map(|bar| bar.ts)
    }
}

/// Derived indicator values for one bar.
///
/// Every field is `None` until the lookback window behind it is fully
/// satisfied; absence is never encoded as zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorRow {
    pub ts: UtcDateTime,
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

impl IndicatorRow {
    pub fn empty(ts: UtcDateTime) -> Self {
        Self {
            ts,
            sma_20: None,
            sma_50: None,
            sma_200: None,
            ema_12: None,
            ema_20: None,
            ema_26: None,
            macd_line: None,
            macd_signal_line: None,
            macd_histogram: None,
            rsi: None,
            atr: None,
            bb_upper: None,
            bb_lower: None,
        }
    }

    /// True when no indicator field is populated.
    pub fn is_blank(&self) -> bool {
        self.sma_20.is_none()
            && self.sma_50.is_none()
            && self.sma_200.is_none()
            && self.ema_12.is_none()
            && self.ema_20.is_none()
            && self.ema_26.is_none()
            && self.macd_line.is_none()
            && self.macd_signal_line.is_none()
            && self.macd_histogram.is_none()
            && self.rsi.is_none()
            && self.atr.is_none()
            && self.bb_upper.is_none()
            && self.bb_lower.is_none()
    }
}

/// Named pattern classes emitted by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    GoldenCross,
    DeathCross,
    RsiOversoldReversal,
    RsiOverboughtReversal,
    MacdBullishCross,
    MacdBearishCross,
    BollingerBreakoutUp,
    BollingerBreakoutDown,
    BullishEngulfing,
    BearishEngulfing,
    MorningStar,
    EveningStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
    Hammer,
    ShootingStar,
}

impl PatternType {
    pub const ALL: [Self; 16] = [
        Self::GoldenCross,
        Self::DeathCross,
        Self::RsiOversoldReversal,
        Self::RsiOverboughtReversal,
        Self::MacdBullishCross,
        Self::MacdBearishCross,
        Self::BollingerBreakoutUp,
        Self::BollingerBreakoutDown,
        Self::BullishEngulfing,
        Self::BearishEngulfing,
        Self::MorningStar,
        Self::EveningStar,
        Self::ThreeWhiteSoldiers,
        Self::ThreeBlackCrows,
        Self::Hammer,
        Self::ShootingStar,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GoldenCross => "golden_cross",
            Self::DeathCross => "death_cross",
            Self::RsiOversoldReversal => "rsi_oversold_reversal",
            Self::RsiOverboughtReversal => "rsi_overbought_reversal",
            Self::MacdBullishCross => "macd_bullish_cross",
            Self::MacdBearishCross => "macd_bearish_cross",
            Self::BollingerBreakoutUp => "bollinger_breakout_up",
            Self::BollingerBreakoutDown => "bollinger_breakout_down",
            Self::BullishEngulfing => "bullish_engulfing",
            Self::BearishEngulfing => "bearish_engulfing",
            Self::MorningStar => "morning_star",
            Self::EveningStar => "evening_star",
            Self::ThreeWhiteSoldiers => "three_white_soldiers",
            Self::ThreeBlackCrows => "three_black_crows",
            Self::Hammer => "hammer",
            Self::ShootingStar => "shooting_star",
        }
    }
}

impl Display for PatternType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|pattern| pattern.as_str() == normalized)
            .ok_or(ValidationError::InvalidPatternType {
                value: normalized,
            })
    }
}

/// A detected pattern over a bar range.
///
/// The id is derived from the key fields, so re-running the detector over
/// the same bar range reproduces the same ids and the warehouse's
/// insert-or-ignore keeps the table append-only without duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub pattern_id: String,
    pub symbol: Symbol,
    pub pattern_type: PatternType,
    pub start_time: UtcDateTime,
    pub end_time: UtcDateTime,
    pub confidence: Option<f64>,
}

impl Pattern {
    pub fn new(
        symbol: Symbol,
        pattern_type: PatternType,
        start_time: UtcDateTime,
        end_time: UtcDateTime,
        confidence: Option<f64>,
    ) -> Result<Self, ValidationError> {
        if start_time > end_time {
            return Err(ValidationError::PatternSpanInverted);
        }
        if let Some(value) = confidence {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::ConfidenceOutOfRange { value });
            }
        }

        let pattern_id = format!(
            "{}_{}_{}_{}",
            symbol.as_str(),
            pattern_type.as_str(),
            start_time.format_rfc3339(),
            end_time.format_rfc3339(),
        );

        Ok(Self {
            pattern_id,
            symbol,
            pattern_type,
            start_time,
            end_time,
            confidence,
        })
    }

    /// Single-bar pattern where start and end coincide.
    pub fn at(
        symbol: Symbol,
        pattern_type: PatternType,
        ts: UtcDateTime,
        confidence: Option<f64>,
    ) -> Result<Self, ValidationError> {
        Self::new(symbol, pattern_type, ts, ts, confidence)
    }
}

fn validate_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue { field });
    }
    if value < 0.0 {
        return Err(ValidationError::NegativeValue { field });
    }
    Ok(())
}

fn validate_optional_non_negative(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        validate_non_negative(field, value)?;
    }
    Ok(())
}

fn validate_optional_finite(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ValidationError> {
    if let Some(value) = value {
        if !value.is_finite() {
            return Err(ValidationError::NonFiniteValue { field });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(date: &str) -> UtcDateTime {
        UtcDateTime::from_date_str(date).expect("date")
    }

    #[test]
    fn rejects_negative_volume() {
        let err = Bar::new(ts("2025-03-03"), 10.0, 12.0, 9.0, 11.0, -1.0, None, None, None)
            .expect_err("must fail");
        assert!(matches!(
            err,
            ValidationError::NegativeValue { field: "volume" }
        ));
    }

    #[test]
    fn rejects_close_outside_range() {
        let err = Bar::new(ts("2025-03-03"), 10.0, 12.0, 9.0, 12.5, 100.0, None, None, None)
            .expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidBarBounds));
    }

    #[test]
    fn true_range_covers_gap_days() {
        let bar = Bar::new(ts("2025-03-04"), 10.0, 11.0, 9.5, 10.5, 100.0, None, None, None)
            .expect("bar");
        // Gap down from a prior close of 13: |high - prev_close| dominates.
        assert!((bar.true_range(13.0) - 3.5).abs() < 1e-12);
    }

    #[test]
    fn pattern_id_is_deterministic() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let first = Pattern::at(symbol.clone(), PatternType::GoldenCross, ts("2025-03-03"), None)
            .expect("pattern");
        let second = Pattern::at(symbol, PatternType::GoldenCross, ts("2025-03-03"), None)
            .expect("pattern");
        assert_eq!(first.pattern_id, second.pattern_id);
        assert_eq!(
            first.pattern_id,
            "AAPL_golden_cross_2025-03-03T00:00:00Z_2025-03-03T00:00:00Z"
        );
    }

    #[test]
    fn pattern_rejects_inverted_span() {
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let err = Pattern::new(
            symbol,
            PatternType::BollingerBreakoutUp,
            ts("2025-03-05"),
            ts("2025-03-03"),
            None,
        )
        .expect_err("must fail");
        assert!(matches!(err, ValidationError::PatternSpanInverted));
    }

    #[test]
    fn pattern_type_round_trips_snake_case() {
        for pattern in PatternType::ALL {
            let parsed: PatternType = pattern.as_str().parse().expect("must parse");
            assert_eq!(parsed, pattern);
        }
    }
}
