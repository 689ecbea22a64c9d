use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// A single OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// `low <= min(open, close) <= max(open, close) <= high`, all finite and
    /// positive.
    pub fn is_consistent(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return false;
        }
        self.low <= self.open.min(self.close) && self.open.max(self.close) <= self.high
    }
}

/// Bar width requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    FiveMinute,
    Daily,
}

impl Interval {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FiveMinute => "5m",
            Self::Daily => "1d",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Drop bars that break the OHLC ordering invariant and any bar whose
/// timestamp does not strictly follow the previous kept bar.
pub fn normalize_sequence(raw: Vec<Candle>) -> Vec<Candle> {
    let total = raw.len();
    let mut out: Vec<Candle> = Vec::with_capacity(total);

    for candle in raw {
        if !candle.is_consistent() {
            debug!(timestamp = %candle.timestamp, "dropping inconsistent candle");
            continue;
        }
        if let Some(prev) = out.last() {
            if candle.timestamp <= prev.timestamp {
                debug!(timestamp = %candle.timestamp, "dropping out-of-order candle");
                continue;
            }
        }
        out.push(candle);
    }

    if out.len() != total {
        debug!(kept = out.len(), total, "candle sequence normalized");
    }
    out
}

/// Keep only candles from the current session (`timestamp >= session_open`).
/// Prior-day and pre-market bars must never reach the opening range.
pub fn session_candles(candles: &[Candle], session_open: DateTime<Utc>) -> Vec<Candle> {
    candles
        .iter()
        .filter(|c| c.timestamp >= session_open)
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
