// =============================================================================
// Average True Range (ATR)
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// ATR is the mean of the trailing `period` TR values. Each TR needs the
// previous bar's close, so `period + 1` bars are required.
//
// Default period: 14
// =============================================================================

use crate::market_data::Candle;

/// True range of `bar` given the previous bar's close.
pub fn true_range(bar: &Candle, prev_close: f64) -> f64 {
    let hl = bar.high - bar.low;
    let hc = (bar.high - prev_close).abs();
    let lc = (bar.low - prev_close).abs();
    hl.max(hc).max(lc)
}

/// Compute the current ATR from a slice of OHLCV candles (oldest first).
///
/// Returns 0.0 when `period` is zero, when there are fewer than `period + 1`
/// candles, or when the result is non-finite.
pub fn calculate_atr(candles: &[Candle], period: usize) -> f64 {
    if period == 0 || candles.len() < period + 1 {
        return 0.0;
    }

    let window = &candles[candles.len() - period - 1..];
    let sum: f64 = window
        .windows(2)
        .map(|pair| true_range(&pair[1], pair[0].close))
        .sum();

    let atr = sum / period as f64;
    if atr.is_finite() {
        atr
    } else {
        0.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    /// Build a test candle with the given OHLC values; `i` orders timestamps.
    fn candle(i: i64, open: f64, high: f64, low: f64, close: f64) -> Candle {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::days(i);
        Candle::new(ts, open, high, low, close, 100)
    }

    #[test]
    fn atr_period_zero() {
        let candles: Vec<Candle> = (0..20).map(|i| candle(i, 100.0, 105.0, 95.0, 102.0)).collect();
        assert_eq!(calculate_atr(&candles, 0), 0.0);
    }

    #[test]
    fn atr_fourteen_bars_is_zero() {
        let candles: Vec<Candle> = (0..14).map(|i| candle(i, 100.0, 105.0, 95.0, 102.0)).collect();
        assert_eq!(calculate_atr(&candles, 14), 0.0);
    }

    #[test]
    fn atr_constant_range() {
        // H-L = 10 and close at the midpoint: every TR is exactly 10.
        let candles: Vec<Candle> = (0..15).map(|i| candle(i, 100.0, 105.0, 95.0, 100.0)).collect();
        assert!((calculate_atr(&candles, 14) - 10.0).abs() < 1e-12);
    }

    #[test]
    fn atr_true_range_uses_prev_close() {
        let prev = candle(0, 100.0, 105.0, 95.0, 95.0);
        let gap = candle(1, 110.0, 115.0, 108.0, 112.0);
        // |115 - 95| = 20 > 115 - 108 = 7
        assert!((true_range(&gap, prev.close) - 20.0).abs() < 1e-12);
    }

    #[test]
    fn atr_uses_trailing_window_only() {
        // An early wide bar falls outside the trailing 3 TRs.
        let candles = vec![
            candle(0, 100.0, 150.0, 50.0, 100.0),
            candle(1, 100.0, 101.0, 99.0, 100.0),
            candle(2, 100.0, 101.0, 99.0, 100.0),
            candle(3, 100.0, 101.0, 99.0, 100.0),
            candle(4, 100.0, 101.0, 99.0, 100.0),
        ];
        assert!((calculate_atr(&candles, 3) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn atr_result_is_positive() {
        let candles: Vec<Candle> = (0..50)
            .map(|i| {
                let base = 100.0 + (i as f64 * 0.5).sin() * 10.0;
                candle(i, base - 0.5, base + 2.0, base - 2.0, base + 0.5)
            })
            .collect();
        assert!(calculate_atr(&candles, 14) > 0.0);
    }
}
