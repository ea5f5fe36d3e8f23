//! Indicator engine: SMA, EMA, MACD, RSI, ATR, Bollinger Bands.
//!
//! The engine consumes one symbol's ascending bar sequence and produces
//! one [`IndicatorRow`] per bar. A field stays `None` until its lookback
//! window is fully satisfied. Gaps in the calendar (non-trading days) are
//! invisible here: indices, not dates, drive every window.
//!
//! Bollinger bands use the population standard deviation (divide by n)
//! so a given close window always maps to the same band width.

use stockpulse_core::{Bar, IndicatorRow};

const SMA_SHORT: usize = 20;
const SMA_MID: usize = 50;
const SMA_LONG: usize = 200;
const EMA_FAST: usize = 12;
const EMA_SHORT: usize = 20;
const EMA_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;
const RSI_PERIOD: usize = 14;
const ATR_PERIOD: usize = 14;
const BOLLINGER_PERIOD: usize = 20;
const BOLLINGER_WIDTH: f64 = 2.0;

/// Deterministic indicator computation over one symbol's bars.
pub struct IndicatorEngine;

impl IndicatorEngine {
    /// Compute an indicator row for every bar.
    ///
    /// Identical input always yields identical output; the only state is
    /// the bar sequence itself.
    pub fn compute(bars: &[Bar]) -> Vec<IndicatorRow> {
        if bars.is_empty() {
            return Vec::new();
        }

        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();

        let sma_20 = sma_series(&closes, SMA_SHORT);
        let sma_50 = sma_series(&closes, SMA_MID);
        let sma_200 = sma_series(&closes, SMA_LONG);
        let ema_12 = ema_series(&closes, EMA_FAST);
        let ema_20 = ema_series(&closes, EMA_SHORT);
        let ema_26 = ema_series(&closes, EMA_SLOW);

        let macd_line: Vec<Option<f64>> = ema_12
            .iter()
            .zip(&ema_26)
            .map(|(fast, slow)| match (fast, slow) {
                (Some(fast), Some(slow)) => Some(fast - slow),
                _ => None,
            })
            .collect();
        let macd_signal = ema_of_defined(&macd_line, MACD_SIGNAL);
        let macd_histogram: Vec<Option<f64>> = macd_line
            .iter()
            .zip(&macd_signal)
            .map(|(line, signal)| match (line, signal) {
                (Some(line), Some(signal)) => Some(line - signal),
                _ => None,
            })
            .collect();

        let rsi = rsi_series(&closes, RSI_PERIOD);
        let atr = atr_series(bars, ATR_PERIOD);
        let (bb_upper, bb_lower) = bollinger_series(&closes, BOLLINGER_PERIOD, BOLLINGER_WIDTH);

        bars.iter()
            .enumerate()
            .map(|(i, bar)| IndicatorRow {
                ts: bar.ts,
                sma_20: sma_20[i],
                sma_50: sma_50[i],
                sma_200: sma_200[i],
                ema_12: ema_12[i],
                ema_20: ema_20[i],
                ema_26: ema_26[i],
                macd_line: macd_line[i],
                macd_signal_line: macd_signal[i],
                macd_histogram: macd_histogram[i],
                rsi: rsi[i],
                atr: atr[i],
                bb_upper: bb_upper[i],
                bb_lower: bb_lower[i],
            })
            .collect()
    }
}

/// Arithmetic mean of the trailing `period` values, via a rolling sum.
fn sma_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let mut window_sum: f64 = values[..period].iter().sum();
    out[period - 1] = Some(window_sum / period as f64);
    for i in period..values.len() {
        window_sum += values[i] - values[i - period];
        out[i] = Some(window_sum / period as f64);
    }
    out
}

/// EMA seeded with the SMA of the first `period` values, then
/// `ema[t] = value[t] * k + ema[t-1] * (1 - k)` with `k = 2 / (period + 1)`.
fn ema_series(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed: f64 = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..values.len() {
        prev = values[i] * k + prev * (1.0 - k);
        out[i] = Some(prev);
    }
    out
}

/// EMA over the defined suffix of a partially-defined series, keeping
/// alignment with the input. Used for the MACD signal line, whose input
/// (the MACD line) only becomes defined once EMA(26) has seeded.
fn ema_of_defined(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    let Some(first_defined) = values.iter().position(Option::is_some) else {
        return out;
    };

    let defined: Vec<f64> = values[first_defined..]
        .iter()
        .map(|value| value.expect("values are contiguous once defined"))
        .collect();
    let inner = ema_series(&defined, period);
    for (offset, value) in inner.into_iter().enumerate() {
        out[first_defined + offset] = value;
    }
    out
}

/// Wilder RSI: simple-average seed over the first `period` changes, then
/// smoothed recurrence `avg = (avg * (period - 1) + current) / period`.
fn rsi_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period + 1 {
        return out;
    }

    let gain_of = |i: usize| (closes[i] - closes[i - 1]).max(0.0);
    let loss_of = |i: usize| (closes[i - 1] - closes[i]).max(0.0);

    let mut avg_gain: f64 = (1..=period).map(gain_of).sum::<f64>() / period as f64;
    let mut avg_loss: f64 = (1..=period).map(loss_of).sum::<f64>() / period as f64;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    for i in (period + 1)..closes.len() {
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain_of(i)) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss_of(i)) / period as f64;
        out[i] = Some(rsi_value(avg_gain, avg_loss));
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    if avg_gain == 0.0 {
        return 0.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Wilder ATR over true ranges; the first bar's true range is its
/// high-low span (no previous close to gap against).
fn atr_series(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; bars.len()];
    if period == 0 || bars.len() < period {
        return out;
    }

    let mut true_ranges = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let tr = if i == 0 {
            bar.high - bar.low
        } else {
            bar.true_range(bars[i - 1].close)
        };
        true_ranges.push(tr);
    }

    let seed: f64 = true_ranges[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..bars.len() {
        prev = (prev * (period as f64 - 1.0) + true_ranges[i]) / period as f64;
        out[i] = Some(prev);
    }
    out
}

/// Bollinger bands: SMA(period) +/- width * population stddev.
fn bollinger_series(
    closes: &[f64],
    period: usize,
    width: f64,
) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let mut upper = vec![None; closes.len()];
    let mut lower = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return (upper, lower);
    }

    for i in (period - 1)..closes.len() {
        let window = &closes[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance =
            window.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / period as f64;
        let stddev = variance.sqrt();
        upper[i] = Some(mean + width * stddev);
        lower[i] = Some(mean - width * stddev);
    }
    (upper, lower)
}
