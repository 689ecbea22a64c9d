// =============================================================================
// Candle Source — the contract the engine needs from a market-data provider
// =============================================================================

use async_trait::async_trait;
use chrono::Duration;

use crate::error::EngineResult;
use crate::market_data::{Candle, Interval};

/// Fetches fixed-interval OHLCV bars for one symbol.
///
/// Implementations return candles oldest-first, already passed through
/// [`normalize_sequence`](crate::market_data::normalize_sequence), and fail
/// with `EngineError::DataUnavailable` when the upstream cannot be reached or
/// answers with an unusable payload.
#[async_trait]
pub trait CandleSource: Send + Sync {
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        lookback: Duration,
    ) -> EngineResult<Vec<Candle>>;
}
