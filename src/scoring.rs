// =============================================================================
// Confidence Scorer
// =============================================================================
//
// For confirmed breakouts:
//
//   breakout%   = (price - high) / high * 100          (bullish)
//               = (low - price)  / low  * 100          (bearish)
//   confidence  = clamp(base + (ratio - 1) * vw + breakout% * bw, min, max)
//
// Entry is the broken boundary, the stop is the opposite boundary, and the
// targets sit one and two risk units beyond the entry. Every other kind is
// non-actionable with a fixed confidence.
// =============================================================================

use crate::runtime_config::BreakoutParams;
use crate::types::{SignalKind, TradeLevels};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub confidence: f64,
    pub breakout_percent: f64,
    pub levels: TradeLevels,
}

/// Distance beyond the broken boundary in percent. Zero for non-breakouts.
pub fn breakout_percent(kind: SignalKind, price: f64, range_high: f64, range_low: f64) -> f64 {
    let pct = match kind {
        SignalKind::BreakoutBullish if range_high > 0.0 => (price - range_high) / range_high * 100.0,
        SignalKind::BreakoutBearish if range_low > 0.0 => (range_low - price) / range_low * 100.0,
        _ => 0.0,
    };
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}

pub fn score(
    params: &BreakoutParams,
    kind: SignalKind,
    price: f64,
    range_high: f64,
    range_low: f64,
    volume_ratio: f64,
) -> Score {
    match kind {
        SignalKind::BreakoutBullish | SignalKind::BreakoutBearish => {
            let pct = breakout_percent(kind, price, range_high, range_low);
            let raw = params.base_confidence
                + (volume_ratio - 1.0) * params.volume_weight
                + pct * params.breakout_weight;
            let confidence = if raw.is_finite() {
                raw.clamp(params.min_confidence, params.max_confidence)
            } else {
                params.min_confidence
            };

            let (entry, stop_loss) = if kind == SignalKind::BreakoutBullish {
                (range_high, range_low)
            } else {
                (range_low, range_high)
            };
            let mut levels = TradeLevels {
                entry,
                stop_loss,
                ..TradeLevels::default()
            };
            let direction = if kind == SignalKind::BreakoutBullish { 1.0 } else { -1.0 };
            let step = direction * levels.risk();
            levels.target1 = entry + step;
            levels.target2 = entry + 2.0 * step;

            Score {
                confidence,
                breakout_percent: pct,
                levels,
            }
        }
        SignalKind::RangeForming => Score {
            confidence: params.forming_confidence,
            breakout_percent: 0.0,
            levels: TradeLevels::non_actionable(price),
        },
        SignalKind::NoBreakout | SignalKind::MarketClosed => Score {
            confidence: 0.0,
            breakout_percent: 0.0,
            levels: TradeLevels::non_actionable(price),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullish_scenario_levels() {
        let s = score(&BreakoutParams::default(), SignalKind::BreakoutBullish, 103.0, 102.0, 100.0, 1.5);
        assert_eq!(s.levels.entry, 102.0);
        assert_eq!(s.levels.stop_loss, 100.0);
        assert_eq!(s.levels.target1, 104.0);
        assert_eq!(s.levels.target2, 106.0);
        assert!((5.0..=10.0).contains(&s.confidence));
        // 5 + 0.5*3 + 0.98*10 clamps to 10.
        assert_eq!(s.confidence, 10.0);
    }

    #[test]
    fn bearish_levels_mirror() {
        let s = score(&BreakoutParams::default(), SignalKind::BreakoutBearish, 99.9, 102.0, 100.0, 1.3);
        assert_eq!(s.levels.entry, 100.0);
        assert_eq!(s.levels.stop_loss, 102.0);
        assert_eq!(s.levels.target1, 98.0);
        assert_eq!(s.levels.target2, 96.0);
        // 5 + 0.3*3 + 0.1*10 = 6.9
        assert!((s.confidence - 6.9).abs() < 1e-9);
    }

    #[test]
    fn confidence_stays_in_bounds() {
        let params = BreakoutParams::default();
        for &(kind, price, ratio) in &[
            (SignalKind::BreakoutBullish, 102.0001, 0.0),
            (SignalKind::BreakoutBullish, 500.0, 50.0),
            (SignalKind::BreakoutBearish, 1.0, 1000.0),
            (SignalKind::BreakoutBearish, 99.999, -5.0),
            (SignalKind::BreakoutBullish, f64::INFINITY, 1.5),
            (SignalKind::RangeForming, 101.0, 1.0),
            (SignalKind::NoBreakout, 101.0, 1.0),
            (SignalKind::MarketClosed, 101.0, 1.0),
        ] {
            let s = score(&params, kind, price, 102.0, 100.0, ratio);
            assert!((0.0..=10.0).contains(&s.confidence), "{kind} -> {}", s.confidence);
        }
    }

    #[test]
    fn validated_params_keep_confidence_in_bounds() {
        // Tightest legal bounds still produce a clamp, never a panic.
        let params = BreakoutParams {
            min_confidence: 10.0,
            max_confidence: 10.0,
            ..BreakoutParams::default()
        };
        params.validate().unwrap();
        let s = score(&params, SignalKind::BreakoutBullish, 103.0, 102.0, 100.0, 1.5);
        assert_eq!(s.confidence, 10.0);
        assert_eq!(s.levels.risk(), 2.0);
    }

    #[test]
    fn non_actionable_kinds() {
        let params = BreakoutParams::default();
        let forming = score(&params, SignalKind::RangeForming, 101.0, 102.0, 100.0, 2.0);
        assert_eq!(forming.confidence, 5.0);
        assert_eq!(forming.levels, TradeLevels::non_actionable(101.0));

        let flat = score(&params, SignalKind::NoBreakout, 101.0, 102.0, 100.0, 2.0);
        assert_eq!(flat.confidence, 0.0);
        assert_eq!(flat.levels.entry, 101.0);
        assert_eq!(flat.levels.stop_loss, 0.0);
        assert_eq!(flat.levels.target2, 0.0);
    }
}
