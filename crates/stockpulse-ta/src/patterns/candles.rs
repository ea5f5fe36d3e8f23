//! Candlestick shape detectors over 1-3 bar windows.
//!
//! Thresholds are body/shadow ratios against the candle's own range, with
//! engulfing strength additionally normalized against the two-candle body
//! sum. Confidence, where modeled, is that normalized strength in [0, 1];
//! detectors without a meaningful strength measure emit `None`.

use stockpulse_core::{Bar, Pattern, PatternType, Symbol, ValidationError};

/// Maximum body share of the range for a hammer/shooting-star body.
const SMALL_BODY_MAX: f64 = 0.3;
/// Minimum dominant-shadow share of the range for hammer/shooting-star.
const LONG_SHADOW_MIN: f64 = 0.6;
/// Maximum opposite-shadow share of the range for hammer/shooting-star.
const OPPOSITE_SHADOW_MAX: f64 = 0.1;
/// Star middle-candle body must stay below this share of the first body.
const STAR_BODY_MAX_RATIO: f64 = 0.5;

fn upper_shadow(bar: &Bar) -> f64 {
    bar.high - bar.open.max(bar.close)
}

fn lower_shadow(bar: &Bar) -> f64 {
    bar.open.min(bar.close) - bar.low
}

fn clamp_confidence(value: f64) -> Option<f64> {
    Some(value.clamp(0.0, 1.0))
}

pub(crate) fn detect_candles(
    symbol: &Symbol,
    bars: &[Bar],
) -> Result<Vec<Pattern>, ValidationError> {
    let mut out = Vec::new();

    for i in 0..bars.len() {
        if let Some((pattern_type, confidence)) = match_single(&bars[i]) {
            out.push(Pattern::at(
                symbol.clone(),
                pattern_type,
                bars[i].ts,
                confidence,
            )?);
        }

        if i >= 1 {
            if let Some((pattern_type, confidence)) = match_engulfing(&bars[i - 1], &bars[i]) {
                out.push(Pattern::new(
                    symbol.clone(),
                    pattern_type,
                    bars[i - 1].ts,
                    bars[i].ts,
                    confidence,
                )?);
            }
        }

        if i >= 2 {
            let window = (&bars[i - 2], &bars[i - 1], &bars[i]);
            for matched in [match_star(window), match_three_soldiers_crows(window)]
                .into_iter()
                .flatten()
            {
                let (pattern_type, confidence) = matched;
                out.push(Pattern::new(
                    symbol.clone(),
                    pattern_type,
                    bars[i - 2].ts,
                    bars[i].ts,
                    confidence,
                )?);
            }
        }
    }

    Ok(out)
}

/// Hammer / shooting star: small body at one end of a long-shadow candle.
fn match_single(bar: &Bar) -> Option<(PatternType, Option<f64>)> {
    let range = bar.range();
    if range <= 0.0 {
        return None;
    }

    let body_share = bar.body() / range;
    let upper_share = upper_shadow(bar) / range;
    let lower_share = lower_shadow(bar) / range;

    if body_share <= SMALL_BODY_MAX
        && lower_share >= LONG_SHADOW_MIN
        && upper_share <= OPPOSITE_SHADOW_MAX
    {
        return Some((PatternType::Hammer, clamp_confidence(lower_share)));
    }

    if body_share <= SMALL_BODY_MAX
        && upper_share >= LONG_SHADOW_MIN
        && lower_share <= OPPOSITE_SHADOW_MAX
    {
        return Some((PatternType::ShootingStar, clamp_confidence(upper_share)));
    }

    None
}

/// Engulfing: the second body fully covers the first, in the opposite
/// direction. Confidence grows with how dominant the engulfing body is.
fn match_engulfing(first: &Bar, second: &Bar) -> Option<(PatternType, Option<f64>)> {
    let first_body = first.body();
    let second_body = second.body();
    if first_body <= 0.0 || second_body <= first_body {
        return None;
    }

    let first_hi = first.open.max(first.close);
    let first_lo = first.open.min(first.close);
    let second_hi = second.open.max(second.close);
    let second_lo = second.open.min(second.close);
    if !(second_lo <= first_lo && second_hi >= first_hi) {
        return None;
    }

    let dominance = (second_body / (second_body + first_body) - 0.5) * 2.0;

    if !first.is_bullish() && second.is_bullish() {
        return Some((PatternType::BullishEngulfing, clamp_confidence(dominance)));
    }
    if first.is_bullish() && !second.is_bullish() {
        return Some((PatternType::BearishEngulfing, clamp_confidence(dominance)));
    }

    None
}

/// Morning / evening star: long first candle, small-bodied middle, third
/// closing past the midpoint of the first body. Confidence is the
/// penetration depth into the first body.
fn match_star(window: (&Bar, &Bar, &Bar)) -> Option<(PatternType, Option<f64>)> {
    let (first, middle, third) = window;
    let first_body = first.body();
    if first_body <= 0.0 {
        return None;
    }
    if middle.body() > first_body * STAR_BODY_MAX_RATIO {
        return None;
    }

    let midpoint = (first.open + first.close) / 2.0;
    let half_body = first_body / 2.0;

    if !first.is_bullish() && third.is_bullish() && third.close > midpoint {
        let penetration = (third.close - midpoint) / half_body;
        return Some((PatternType::MorningStar, clamp_confidence(penetration)));
    }

    if first.is_bullish() && !third.is_bullish() && third.close < midpoint {
        let penetration = (midpoint - third.close) / half_body;
        return Some((PatternType::EveningStar, clamp_confidence(penetration)));
    }

    None
}

/// Three white soldiers / black crows: three same-direction candles, each
/// opening within the previous body and closing beyond its close.
fn match_three_soldiers_crows(window: (&Bar, &Bar, &Bar)) -> Option<(PatternType, Option<f64>)> {
    let (first, second, third) = window;

    let advancing = |prev: &Bar, next: &Bar| {
        next.is_bullish()
            && next.open >= prev.open
            && next.open <= prev.close
            && next.close > prev.close
    };
    if first.is_bullish() && advancing(first, second) && advancing(second, third) {
        return Some((PatternType::ThreeWhiteSoldiers, None));
    }

    let declining = |prev: &Bar, next: &Bar| {
        !next.is_bullish()
            && next.open <= prev.open
            && next.open >= prev.close
            && next.close < prev.close
    };
    if !first.is_bullish() && declining(first, second) && declining(second, third) {
        return Some((PatternType::ThreeBlackCrows, None));
    }

    None
}
