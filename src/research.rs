// =============================================================================
// Research — quote snapshot and rule-based market analysis
// =============================================================================
//
// A research result combines a quote built from the daily bar series, the
// indicator snapshot, a deterministic narrative analysis and (during the
// session) the ORB signal.
//
// Sentiment:
//   RSI > 60 and price > SMA50  => bullish
//   RSI < 40 and price < SMA50  => bearish
//   otherwise                   => neutral
//
// Price targets bracket the price by 2 * ATR, capped by the 52-week extremes.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::indicators::{rsi, TechnicalIndicators};
use crate::market_data::Candle;
use crate::types::Signal;

/// Minimum daily bars for a research result (about one trading month).
pub const MIN_DAILY_BARS: usize = 20;

/// Bars in a trading year, used for the 52-week extremes.
const TRADING_YEAR_BARS: usize = 252;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub previous_close: f64,
    pub volume: u64,
    pub average_volume: f64,
    pub fifty_two_week_high: f64,
    pub fifty_two_week_low: f64,
}

impl Quote {
    /// Build a quote from daily bars (oldest first); the last bar is today.
    pub fn from_daily(symbol: &str, daily: &[Candle]) -> EngineResult<Self> {
        let [.., prev, last] = daily else {
            return Err(EngineError::InsufficientData {
                required: 2,
                available: daily.len(),
            });
        };

        let price = last.close;
        let previous_close = prev.close;
        let change = price - previous_close;
        let change_percent = if previous_close > 0.0 {
            change / previous_close * 100.0
        } else {
            0.0
        };

        let recent_volume = &daily[daily.len().saturating_sub(20)..];
        let average_volume = recent_volume.iter().map(|c| c.volume as f64).sum::<f64>()
            / recent_volume.len() as f64;

        let year = &daily[daily.len().saturating_sub(TRADING_YEAR_BARS)..];
        let fifty_two_week_high = year.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let fifty_two_week_low = year.iter().map(|c| c.low).fold(f64::MAX, f64::min);

        Ok(Self {
            symbol: symbol.to_string(),
            price,
            change,
            change_percent,
            open: last.open,
            high: last.high,
            low: last.low,
            previous_close,
            volume: last.volume,
            average_volume,
            fifty_two_week_high,
            fifty_two_week_low,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Bearish,
    Neutral,
}

impl Sentiment {
    pub fn from_technicals(quote: &Quote, technicals: &TechnicalIndicators) -> Self {
        if technicals.rsi14 > 60.0 && quote.price > technicals.sma50 {
            Self::Bullish
        } else if technicals.rsi14 < 40.0 && quote.price < technicals.sma50 {
            Self::Bearish
        } else {
            Self::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTargets {
    pub support: f64,
    pub resistance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub summary: String,
    pub sentiment: Sentiment,
    pub key_points: Vec<String>,
    pub risks: Vec<String>,
    pub opportunities: Vec<String>,
    pub price_targets: PriceTargets,
    pub recommendation: String,
}

impl MarketAnalysis {
    /// Deterministic analysis derived from the quote and indicators alone.
    pub fn rule_based(quote: &Quote, t: &TechnicalIndicators) -> Self {
        let sentiment = Sentiment::from_technicals(quote, t);
        let rsi_zone = rsi::rsi_label(t.rsi14).to_lowercase();

        let summary = format!(
            "{} is trading at ${:.2}, {} {:.2}%. RSI at {:.1} suggests {} conditions.",
            quote.symbol,
            quote.price,
            if quote.change_percent >= 0.0 { "up" } else { "down" },
            quote.change_percent.abs(),
            t.rsi14,
            rsi_zone,
        );

        let above_200 = quote.price > t.sma200;
        let key_points = vec![
            format!(
                "Price {} 200-day SMA (long-term {})",
                if above_200 { "above" } else { "below" },
                if above_200 { "uptrend" } else { "downtrend" },
            ),
            format!(
                "RSI(14) at {:.1} indicates {}",
                t.rsi14,
                if t.rsi14 > 70.0 {
                    "overbought, potential pullback"
                } else if t.rsi14 < 30.0 {
                    "oversold, potential bounce"
                } else {
                    "neutral momentum"
                },
            ),
            format!(
                "MACD {} with histogram at {:.3}",
                if t.macd.histogram > 0.0 { "bullish" } else { "bearish" },
                t.macd.histogram,
            ),
        ];

        let risks = vec![
            if t.rsi14 > 70.0 {
                "Overbought conditions may lead to profit-taking".to_string()
            } else {
                "Breaking below key support could accelerate selling".to_string()
            },
            if t.volume_ratio < 0.5 {
                "Low volume may indicate lack of conviction".to_string()
            } else {
                "High volatility increases risk".to_string()
            },
        ];

        let opportunities = vec![
            if quote.price < t.bollinger.lower {
                "Price near lower Bollinger Band, potential mean reversion".to_string()
            } else {
                "Monitor for breakout above resistance".to_string()
            },
            if t.macd.histogram > 0.0 && t.rsi14 < 60.0 {
                "Bullish momentum building without overbought conditions".to_string()
            } else {
                "Watch for trend confirmation".to_string()
            },
        ];

        let buffer = t.atr14 * 2.0;
        let price_targets = PriceTargets {
            support: (quote.price - buffer).max(quote.fifty_two_week_low),
            resistance: (quote.price + buffer).min(quote.fifty_two_week_high),
        };

        let recommendation = match sentiment {
            Sentiment::Bullish => format!(
                "Consider entries above ${:.2} with stop at ${:.2}",
                t.sma20,
                quote.price - t.atr14 * 1.5
            ),
            Sentiment::Bearish => format!(
                "Wait for stabilization. Potential support at ${:.2}",
                t.bollinger.lower
            ),
            Sentiment::Neutral => format!(
                "Range-bound trading. Buy near ${:.2}, sell near ${:.2}",
                t.bollinger.lower, t.bollinger.upper
            ),
        };

        Self {
            summary,
            sentiment,
            key_points,
            risks,
            opportunities,
            price_targets,
            recommendation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResult {
    pub symbol: String,
    pub quote: Quote,
    pub technicals: TechnicalIndicators,
    pub analysis: MarketAnalysis,
    /// Present only when today's session produced an opening range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<Signal>,
    pub generated_at: DateTime<Utc>,
}

impl ResearchResult {
    /// Assemble a result from today's daily series and an optional signal.
    pub fn build(
        symbol: &str,
        daily: &[Candle],
        signal: Option<Signal>,
        generated_at: DateTime<Utc>,
    ) -> EngineResult<Self> {
        if daily.len() < MIN_DAILY_BARS {
            return Err(EngineError::InsufficientData {
                required: MIN_DAILY_BARS,
                available: daily.len(),
            });
        }

        let quote = Quote::from_daily(symbol, daily)?;
        let technicals = TechnicalIndicators::from_candles(daily);
        let analysis = MarketAnalysis::rule_based(&quote, &technicals);
        let signal = signal.filter(|s| s.opening_range.is_some());

        Ok(Self {
            symbol: symbol.to_string(),
            quote,
            technicals,
            analysis,
            signal,
            generated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn daily(closes: &[f64]) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2023, 1, 3, 21, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Candle::new(
                    start + Duration::days(i as i64),
                    c,
                    c + 1.0,
                    c - 1.0,
                    c,
                    1_000 + i as u64,
                )
            })
            .collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 15, 0, 0).unwrap()
    }

    #[test]
    fn quote_from_last_two_bars() {
        let q = Quote::from_daily("AAPL", &daily(&[100.0, 102.0, 101.0])).unwrap();
        assert_eq!(q.price, 101.0);
        assert_eq!(q.previous_close, 102.0);
        assert!((q.change + 1.0).abs() < 1e-12);
        assert!((q.change_percent - (-1.0 / 102.0 * 100.0)).abs() < 1e-12);
        assert_eq!(q.fifty_two_week_high, 103.0);
        assert_eq!(q.fifty_two_week_low, 99.0);
        assert_eq!(q.volume, 1_002);
        assert!((q.average_volume - 1_001.0).abs() < 1e-12);
    }

    #[test]
    fn quote_needs_two_bars() {
        assert!(matches!(
            Quote::from_daily("AAPL", &daily(&[100.0])),
            Err(EngineError::InsufficientData { required: 2, available: 1 })
        ));
    }

    #[test]
    fn fifty_two_week_window_is_252_bars() {
        let mut closes = vec![1_000.0];
        closes.extend(std::iter::repeat(100.0).take(252));
        let q = Quote::from_daily("SPY", &daily(&closes)).unwrap();
        assert_eq!(q.fifty_two_week_high, 101.0);
    }

    #[test]
    fn rising_series_is_bullish() {
        let closes: Vec<f64> = (0..120).map(|i| 100.0 + i as f64).collect();
        let result = ResearchResult::build("NVDA", &daily(&closes), None, now()).unwrap();

        assert_eq!(result.analysis.sentiment, Sentiment::Bullish);
        assert!(result.analysis.recommendation.starts_with("Consider entries above"));
        assert!(result.analysis.summary.contains("overbought"));
        assert!(result.analysis.price_targets.resistance <= result.quote.fifty_two_week_high);
        assert!(result.analysis.price_targets.support < result.quote.price);
        assert_eq!(result.analysis.key_points.len(), 3);
        assert!(result.signal.is_none());
    }

    #[test]
    fn falling_series_is_bearish() {
        let closes: Vec<f64> = (0..120).map(|i| 300.0 - i as f64).collect();
        let result = ResearchResult::build("TSLA", &daily(&closes), None, now()).unwrap();
        assert_eq!(result.analysis.sentiment, Sentiment::Bearish);
        assert!(result.analysis.recommendation.starts_with("Wait for stabilization"));
        assert!(result.analysis.price_targets.support >= result.quote.fifty_two_week_low);
    }

    #[test]
    fn short_history_is_insufficient() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + i as f64).collect();
        assert!(matches!(
            ResearchResult::build("AAPL", &daily(&closes), None, now()),
            Err(EngineError::InsufficientData { required: 20, available: 10 })
        ));
    }

    #[test]
    fn signal_without_range_is_dropped() {
        use crate::session::SessionClock;
        let status = SessionClock::us_equities().status_at(now());
        let signal = Signal::wait("AAPL", &status, now(), 100.0, vec![]);
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let result = ResearchResult::build("AAPL", &daily(&closes), Some(signal), now()).unwrap();
        assert!(result.signal.is_none());
    }

    #[test]
    fn sentiment_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Sentiment::Neutral).unwrap(), "\"neutral\"");
    }
}
