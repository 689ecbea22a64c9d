// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the technical indicators reported
// alongside every research result. Every function is total: short or empty
// input yields a documented neutral value instead of an error.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod volume;

use serde::{Deserialize, Serialize};

use crate::market_data::Candle;

pub use bollinger::BollingerBands;
pub use macd::MacdResult;

pub const RSI_PERIOD: usize = 14;
pub const ATR_PERIOD: usize = 14;
pub const BOLLINGER_PERIOD: usize = 20;
pub const BOLLINGER_STD_DEV: f64 = 2.0;
pub const VOLUME_WINDOW: usize = 20;

/// Indicator snapshot computed from a daily bar series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalIndicators {
    pub rsi14: f64,
    pub macd: MacdResult,
    pub sma20: f64,
    pub sma50: f64,
    pub sma200: f64,
    pub bollinger: BollingerBands,
    pub atr14: f64,
    pub volume_ratio: f64,
}

impl TechnicalIndicators {
    /// Compute every indicator from `candles` (oldest first).
    pub fn from_candles(candles: &[Candle]) -> Self {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let volumes: Vec<u64> = candles.iter().map(|c| c.volume).collect();

        Self {
            rsi14: rsi::calculate_rsi(&closes, RSI_PERIOD),
            macd: macd::calculate_macd(&closes),
            sma20: sma::calculate_sma(&closes, 20),
            sma50: sma::calculate_sma(&closes, 50),
            sma200: sma::calculate_sma(&closes, 200),
            bollinger: bollinger::calculate_bollinger(&closes, BOLLINGER_PERIOD, BOLLINGER_STD_DEV),
            atr14: atr::calculate_atr(candles, ATR_PERIOD),
            volume_ratio: volume::volume_ratio(&volumes, VOLUME_WINDOW),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn daily(closes: &[f64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2023, 1, 3, 21, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Candle::new(start + Duration::days(i as i64), c, c + 1.0, c - 1.0, c, 1_000)
            })
            .collect()
    }

    #[test]
    fn empty_series_is_neutral() {
        let t = TechnicalIndicators::from_candles(&[]);
        assert_eq!(t.rsi14, 50.0);
        assert_eq!(t.macd, MacdResult::default());
        assert_eq!(t.sma20, 0.0);
        assert_eq!(t.atr14, 0.0);
        assert_eq!(t.volume_ratio, 1.0);
    }

    #[test]
    fn rising_year_of_bars() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + i as f64 * 0.5).collect();
        let t = TechnicalIndicators::from_candles(&daily(&closes));

        assert!((t.rsi14 - 100.0).abs() < 1e-10);
        assert!(t.macd.value > 0.0);
        assert!(t.sma20 > t.sma50 && t.sma50 > t.sma200);
        assert!(t.bollinger.upper > t.bollinger.middle);
        assert!((t.bollinger.middle - t.sma20).abs() < 1e-12);
        assert!((t.atr14 - 2.0).abs() < 1e-9);
        assert!((t.volume_ratio - 1.0).abs() < 1e-12);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(TechnicalIndicators::default()).unwrap();
        assert!(json.get("volumeRatio").is_some());
        assert!(json.get("rsi14").is_some());
        assert!(json["bollinger"].get("upper").is_some());
    }
}
