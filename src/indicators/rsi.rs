// =============================================================================
// Relative Strength Index (RSI)
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Take the trailing `period` price deltas.
// Step 2 — average gain = sum(gains) / period
//          average loss = sum(losses) / period
// Step 3 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Thresholds:  RSI > 70 => OVERBOUGHT,  RSI < 30 => OVERSOLD.
// =============================================================================

/// RSI reported when there are not enough closes.
pub const NEUTRAL_RSI: f64 = 50.0;

/// Compute the current RSI over the trailing `period` deltas.
///
/// # Edge cases
/// - `closes.len() < period + 1` or `period == 0` => 50.0 (neutral)
/// - average loss is zero => 100.0
/// - a non-finite result => 50.0
pub fn calculate_rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let window = &closes[closes.len() - period - 1..];
    let (sum_gain, sum_loss) = window
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((0.0_f64, 0.0_f64), |(g, l), d| {
            if d > 0.0 {
                (g + d, l)
            } else {
                (g, l - d)
            }
        });

    let period_f = period as f64;
    rsi_from_averages(sum_gain / period_f, sum_loss / period_f).unwrap_or(NEUTRAL_RSI)
}

/// Human-readable zone for an RSI value.
pub fn rsi_label(value: f64) -> &'static str {
    if value > 70.0 {
        "OVERBOUGHT"
    } else if value < 30.0 {
        "OVERSOLD"
    } else {
        "NEUTRAL"
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// - If average loss is zero, RSI is 100.0 (this includes a flat window).
/// - Returns `None` when the result is non-finite.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    if rsi.is_finite() {
        Some(rsi)
    } else {
        None
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rsi_empty_input_is_neutral() {
        assert_eq!(calculate_rsi(&[], 14), 50.0);
    }

    #[test]
    fn rsi_period_zero_is_neutral() {
        assert_eq!(calculate_rsi(&[1.0, 2.0, 3.0], 0), 50.0);
    }

    #[test]
    fn rsi_fourteen_points_is_neutral() {
        let closes: Vec<f64> = (1..=14).map(|x| x as f64).collect();
        assert_eq!(calculate_rsi(&closes, 14), 50.0);
    }

    #[test]
    fn rsi_all_gains() {
        let closes: Vec<f64> = (1..=15).map(|x| x as f64).collect();
        assert!((calculate_rsi(&closes, 14) - 100.0).abs() < 1e-10);

        let longer: Vec<f64> = (1..=60).map(|x| x as f64 * 1.5).collect();
        assert!((calculate_rsi(&longer, 14) - 100.0).abs() < 1e-10);
    }

    #[test]
    fn rsi_all_losses() {
        let closes: Vec<f64> = (1..=30).rev().map(|x| x as f64).collect();
        assert!(calculate_rsi(&closes, 14).abs() < 1e-10);
    }

    #[test]
    fn rsi_only_uses_trailing_window() {
        // A crash far in the past must not affect the trailing 14 deltas.
        let mut closes = vec![500.0, 100.0];
        closes.extend((1..=20).map(|x| 100.0 + x as f64));
        assert!((calculate_rsi(&closes, 14) - 100.0).abs() < 1e-10);
    }

    #[test]
    fn rsi_known_mixture() {
        // 7 deltas of +2 and 7 of -1 => avg gain 1.0, avg loss 0.5, RS 2.
        let mut closes = vec![100.0];
        for i in 0..14 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 2.0 } else { last - 1.0 });
        }
        let expected = 100.0 - 100.0 / 3.0;
        assert!((calculate_rsi(&closes, 14) - expected).abs() < 1e-10);
    }

    #[test]
    fn rsi_range_check() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            44.18, 44.22, 44.57, 43.42, 42.66, 43.13,
        ];
        let v = calculate_rsi(&closes, 14);
        assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
    }

    #[test]
    fn labels() {
        assert_eq!(rsi_label(75.0), "OVERBOUGHT");
        assert_eq!(rsi_label(25.0), "OVERSOLD");
        assert_eq!(rsi_label(50.0), "NEUTRAL");
    }
}
