// =============================================================================
// Opening Range
// =============================================================================
//
// The opening range is the high/low band traced by the first few 5-minute
// candles of the session. Its size grows with elapsed time:
//
//   range_size = clamp(floor(minutes_since_open / 5), 3, 6)
//
// so 15 minutes in uses 3 candles and anything from 30 minutes on uses 6.
// At least 3 session candles are required.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::market_data::Candle;

pub const CANDLE_MINUTES: f64 = 5.0;
pub const MIN_RANGE_CANDLES: usize = 3;
pub const MAX_RANGE_CANDLES: usize = 6;

/// Number of session candles that make up the range after `minutes_since_open`.
pub fn range_size(minutes_since_open: f64) -> usize {
    let raw = (minutes_since_open / CANDLE_MINUTES).floor();
    if !raw.is_finite() || raw < MIN_RANGE_CANDLES as f64 {
        MIN_RANGE_CANDLES
    } else if raw > MAX_RANGE_CANDLES as f64 {
        MAX_RANGE_CANDLES
    } else {
        raw as usize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningRange {
    pub high: f64,
    pub low: f64,
    /// Open of the first range candle.
    pub open: f64,
    /// Close of the last range candle.
    pub close: f64,
    pub volume: u64,
    pub width: f64,
    pub width_percent: f64,
    pub range_candle_count: usize,
    pub minutes_to_establish: f64,
}

impl OpeningRange {
    /// Build the range from today's session candles (oldest first).
    ///
    /// Uses `min(range_size(minutes), candles.len())` leading candles.
    pub fn build(session_candles: &[Candle], minutes_since_open: f64) -> EngineResult<Self> {
        if session_candles.len() < MIN_RANGE_CANDLES {
            return Err(EngineError::InsufficientData {
                required: MIN_RANGE_CANDLES,
                available: session_candles.len(),
            });
        }

        let count = range_size(minutes_since_open).min(session_candles.len());
        let bars = &session_candles[..count];

        let high = bars.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let low = bars.iter().map(|c| c.low).fold(f64::MAX, f64::min);
        let volume = bars.iter().map(|c| c.volume).sum();
        let width = high - low;
        let width_percent = if low > 0.0 { width / low * 100.0 } else { 0.0 };

        Ok(Self {
            high,
            low,
            open: bars[0].open,
            close: bars[count - 1].close,
            volume,
            width,
            width_percent,
            range_candle_count: count,
            minutes_to_establish: count as f64 * CANDLE_MINUTES,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars(n: usize) -> Vec<Candle> {
        let open = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();
        (0..n)
            .map(|i| {
                let base = 100.0 + i as f64 * 0.25;
                Candle::new(
                    open + Duration::minutes(5 * i as i64),
                    base,
                    base + 0.5,
                    base - 0.5,
                    base + 0.1,
                    1_000 + i as u64,
                )
            })
            .collect()
    }

    #[test]
    fn range_size_follows_elapsed_minutes() {
        let sizes: Vec<usize> = [15.0, 20.0, 25.0, 30.0, 45.0]
            .iter()
            .map(|&m| range_size(m))
            .collect();
        assert_eq!(sizes, vec![3, 4, 5, 6, 6]);
    }

    #[test]
    fn range_size_clamps_low() {
        assert_eq!(range_size(0.0), 3);
        assert_eq!(range_size(-10.0), 3);
        assert_eq!(range_size(f64::NAN), 3);
    }

    #[test]
    fn too_few_candles_is_insufficient() {
        let err = OpeningRange::build(&bars(2), 45.0).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientData {
                required: 3,
                available: 2
            }
        );
    }

    #[test]
    fn never_uses_more_candles_than_exist() {
        let range = OpeningRange::build(&bars(4), 60.0).unwrap();
        assert_eq!(range.range_candle_count, 4);
        assert_eq!(range.minutes_to_establish, 20.0);
    }

    #[test]
    fn range_fields() {
        let candles = bars(10);
        let range = OpeningRange::build(&candles, 30.0).unwrap();

        assert_eq!(range.range_candle_count, 6);
        assert!((range.high - (101.25 + 0.5)).abs() < 1e-12);
        assert!((range.low - 99.5).abs() < 1e-12);
        assert_eq!(range.open, candles[0].open);
        assert_eq!(range.close, candles[5].close);
        assert_eq!(range.volume, (0..6).map(|i| 1_000 + i).sum::<u64>());
        assert!((range.width - (range.high - range.low)).abs() < 1e-12);
        assert!((range.width_percent - range.width / range.low * 100.0).abs() < 1e-12);
    }
}
