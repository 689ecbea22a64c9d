// =============================================================================
// Yahoo Finance Chart Client — public OHLCV bars over REST
// =============================================================================
//
// GET {base}/v8/finance/chart/{symbol}?period1&period2&interval&includePrePost
//
// The response carries parallel arrays (timestamp, open, high, low, close,
// volume) in which any element may be null.  Points missing any OHLC value
// are dropped; a null volume is read as zero.  A payload whose every point
// lacks OHLC is treated as malformed.
// =============================================================================

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::error::{EngineError, EngineResult};
use crate::market_data::{normalize_sequence, Candle, CandleSource, Interval};
use crate::runtime_config::ProviderConfig;
use crate::session::Clock;

/// Currency pairs the provider lists with an `=X` suffix.
const FOREX_PAIRS: &[&str] = &[
    "EURUSD", "USDJPY", "GBPUSD", "AUDUSD", "USDCHF", "USDCAD", "NZDUSD",
];

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartBody,
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    #[serde(default)]
    indicators: Option<ChartIndicators>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteArrays>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteArrays {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Market-data client for the Yahoo Finance chart endpoint.
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl YahooClient {
    pub fn new(config: &ProviderConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .context("failed to build reqwest client")?;

        debug!(base_url = %config.base_url, "YahooClient initialised");

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            clock,
        })
    }

    /// Chart URL for `symbol` covering `[now - lookback, now]`.
    fn chart_url(&self, symbol: &str, interval: Interval, lookback: Duration) -> String {
        let now = self.clock.now();
        let period1 = (now - lookback).timestamp();
        let period2 = now.timestamp();
        format!(
            "{}/v8/finance/chart/{}?period1={}&period2={}&interval={}&includePrePost=false",
            self.base_url,
            provider_symbol(symbol),
            period1,
            period2,
            interval
        )
    }

    async fn get_chart(&self, symbol: &str, interval: Interval, lookback: Duration) -> Result<Vec<Candle>> {
        let url = self.chart_url(symbol, interval, lookback);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .context("GET /v8/finance/chart request failed")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("failed to read chart response body")?;

        if !status.is_success() {
            let snippet: String = body.chars().take(200).collect();
            anyhow::bail!("chart endpoint returned {status}: {snippet}");
        }

        parse_chart(&body)
    }
}

#[async_trait]
impl CandleSource for YahooClient {
    #[instrument(skip(self), name = "yahoo::fetch_candles")]
    async fn fetch_candles(
        &self,
        symbol: &str,
        interval: Interval,
        lookback: Duration,
    ) -> EngineResult<Vec<Candle>> {
        match self.get_chart(symbol, interval, lookback).await {
            Ok(candles) => {
                debug!(symbol, %interval, count = candles.len(), "candles fetched");
                Ok(candles)
            }
            Err(e) => {
                warn!(symbol, %interval, error = %format!("{e:#}"), "candle fetch failed");
                Err(EngineError::data_unavailable(symbol, format!("{e:#}")))
            }
        }
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Map a ticker onto the provider's naming (forex pairs take `=X`).
pub fn provider_symbol(symbol: &str) -> String {
    let upper = symbol.to_uppercase();
    if FOREX_PAIRS.contains(&upper.as_str()) {
        format!("{upper}=X")
    } else {
        upper
    }
}

/// Parse a chart response body into a normalized candle sequence.
fn parse_chart(body: &str) -> Result<Vec<Candle>> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).context("failed to parse chart JSON")?;

    if let Some(err) = envelope.chart.error {
        anyhow::bail!(
            "provider error {}: {}",
            err.code.unwrap_or_default(),
            err.description.unwrap_or_default()
        );
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .context("chart response has no result")?;

    // No timestamps means no bars in the requested window (e.g. a holiday).
    let timestamps = match result.timestamp {
        Some(ts) => ts,
        None => return Ok(Vec::new()),
    };

    let quote = result
        .indicators
        .and_then(|i| i.quote.into_iter().next())
        .context("chart response missing indicators.quote")?;

    let at = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten();

    let mut candles = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            at(&quote.open, i),
            at(&quote.high, i),
            at(&quote.low, i),
            at(&quote.close, i),
        ) else {
            continue;
        };
        let Some(timestamp) = DateTime::<Utc>::from_timestamp(ts, 0) else {
            continue;
        };
        let volume = at(&quote.volume, i)
            .filter(|v| v.is_finite() && *v > 0.0)
            .map(|v| v.round() as u64)
            .unwrap_or(0);

        candles.push(Candle::new(timestamp, open, high, low, close, volume));
    }

    if !timestamps.is_empty() && candles.is_empty() {
        anyhow::bail!(
            "malformed chart payload: all {} points missing OHLC",
            timestamps.len()
        );
    }

    Ok(normalize_sequence(candles))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
