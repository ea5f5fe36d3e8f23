//! Indicator-driven pattern state machines.
//!
//! Each detector is an independent scan over the indicator rows; none of
//! them excludes another, and every emission carries a deterministic id
//! via [`Pattern`] construction.

use stockpulse_core::{
    Bar, CrossPolicy, IndicatorRow, Pattern, PatternType, Symbol, ValidationError,
};

const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;

/// Golden/death cross: sign flips of the fast-minus-slow MA spread.
///
/// A flip from non-positive to positive emits a golden cross at that bar;
/// the mirror flip emits a death cross. Rows where either average is
/// still undefined carry no sign.
pub(crate) fn detect_ma_cross(
    symbol: &Symbol,
    rows: &[IndicatorRow],
    policy: CrossPolicy,
) -> Result<Vec<Pattern>, ValidationError> {
    let mut out = Vec::new();
    let mut prev_spread: Option<f64> = None;

    for row in rows {
        let pair = match policy {
            CrossPolicy::Ema20Sma50 => (row.ema_20, row.sma_50),
            CrossPolicy::Sma50Sma200 => (row.sma_50, row.sma_200),
        };
        let (Some(fast), Some(slow)) = pair else {
            continue;
        };
        let spread = fast - slow;

        if let Some(prev) = prev_spread {
            if spread > 0.0 && prev <= 0.0 {
                out.push(Pattern::at(
                    symbol.clone(),
                    PatternType::GoldenCross,
                    row.ts,
                    None,
                )?);
            } else if spread < 0.0 && prev >= 0.0 {
                out.push(Pattern::at(
                    symbol.clone(),
                    PatternType::DeathCross,
                    row.ts,
                    None,
                )?);
            }
        }
        prev_spread = Some(spread);
    }

    Ok(out)
}

/// RSI reversal arming machine: dipping below 30 arms the oversold side,
/// and the close back above 30 emits the buy-side reversal. Symmetric for
/// the 70 line.
pub(crate) fn detect_rsi_reversals(
    symbol: &Symbol,
    rows: &[IndicatorRow],
) -> Result<Vec<Pattern>, ValidationError> {
    let mut out = Vec::new();
    let mut armed_oversold = false;
    let mut armed_overbought = false;

    for row in rows {
        let Some(rsi) = row.rsi else {
            continue;
        };

        if rsi < RSI_OVERSOLD {
            armed_oversold = true;
        } else if armed_oversold {
            out.push(Pattern::at(
                symbol.clone(),
                PatternType::RsiOversoldReversal,
                row.ts,
                None,
            )?);
            armed_oversold = false;
        }

        if rsi > RSI_OVERBOUGHT {
            armed_overbought = true;
        } else if armed_overbought {
            out.push(Pattern::at(
                symbol.clone(),
                PatternType::RsiOverboughtReversal,
                row.ts,
                None,
            )?);
            armed_overbought = false;
        }
    }

    Ok(out)
}

/// MACD histogram zero-cross: each sign flip is a bullish or bearish
/// confirmation at the flip bar.
pub(crate) fn detect_macd_zero_cross(
    symbol: &Symbol,
    rows: &[IndicatorRow],
) -> Result<Vec<Pattern>, ValidationError> {
    let mut out = Vec::new();
    let mut prev_histogram: Option<f64> = None;

    for row in rows {
        let Some(histogram) = row.macd_histogram else {
            continue;
        };

        if let Some(prev) = prev_histogram {
            if histogram > 0.0 && prev <= 0.0 {
                out.push(Pattern::at(
                    symbol.clone(),
                    PatternType::MacdBullishCross,
                    row.ts,
                    None,
                )?);
            } else if histogram < 0.0 && prev >= 0.0 {
                out.push(Pattern::at(
                    symbol.clone(),
                    PatternType::MacdBearishCross,
                    row.ts,
                    None,
                )?);
            }
        }
        prev_histogram = Some(histogram);
    }

    Ok(out)
}

/// Bollinger squeeze plus breakout.
///
/// A squeeze is flagged when the band width is the minimum of the
/// trailing `squeeze_window` widths (requires a full window of defined
/// bands). The pattern is only emitted if, within `breakout_lookahead`
/// bars after the squeeze, the close crosses outside a band; the span
/// runs squeeze bar to breakout bar.
pub(crate) fn detect_bollinger_breakouts(
    symbol: &Symbol,
    bars: &[Bar],
    rows: &[IndicatorRow],
    squeeze_window: usize,
    breakout_lookahead: usize,
) -> Result<Vec<Pattern>, ValidationError> {
    let mut out = Vec::new();
    if squeeze_window == 0 || breakout_lookahead == 0 {
        return Ok(out);
    }

    let widths: Vec<Option<f64>> = rows
        .iter()
        .map(|row| match (row.bb_upper, row.bb_lower) {
            (Some(upper), Some(lower)) => Some(upper - lower),
            _ => None,
        })
        .collect();

    for i in 0..rows.len() {
        let Some(width) = widths[i] else {
            continue;
        };
        if i + 1 < squeeze_window {
            continue;
        }

        let window = &widths[i + 1 - squeeze_window..=i];
        if window.iter().any(Option::is_none) {
            continue;
        }
        let is_rolling_min = window
            .iter()
            .flatten()
            .all(|&other| width <= other);
        if !is_rolling_min {
            continue;
        }

        for j in (i + 1)..rows.len().min(i + 1 + breakout_lookahead) {
            let (Some(upper), Some(lower)) = (rows[j].bb_upper, rows[j].bb_lower) else {
                continue;
            };
            if bars[j].close > upper {
                out.push(Pattern::new(
                    symbol.clone(),
                    PatternType::BollingerBreakoutUp,
                    rows[i].ts,
                    rows[j].ts,
                    None,
                )?);
                break;
            }
            if bars[j].close < lower {
                out.push(Pattern::new(
                    symbol.clone(),
                    PatternType::BollingerBreakoutDown,
                    rows[i].ts,
                    rows[j].ts,
                    None,
                )?);
                break;
            }
        }
    }

    Ok(out)
}
