// =============================================================================
// ORB Engine
// =============================================================================
//
// Ties the pieces together:
//
//   symbol -> validate -> session gate -> fetch 5m bars -> session filter
//          -> opening range -> breakout state machine -> confidence -> Signal
//
//   research = daily bars -> quote + indicators + analysis (+ signal), cached
//   scan     = analyze over many symbols, bounded fan-out, failures isolated
//
// The only shared mutable state is the research cache.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Utc};
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::breakout::{session_volume_profile, BreakoutDetector, BreakoutInput};
use crate::cache::ResearchCache;
use crate::error::{EngineError, EngineResult};
use crate::market_data::{session_candles, Candle, CandleSource, Interval};
use crate::opening_range::OpeningRange;
use crate::research::ResearchResult;
use crate::runtime_config::{BreakoutParams, EngineConfig};
use crate::scanner::sort_by_confidence;
use crate::scoring::{self, Score};
use crate::session::{Clock, SessionClock, SessionStatus};
use crate::types::{Signal, SignalKind, VolumeProfile};

pub const MAX_SYMBOL_LEN: usize = 10;

/// Normalise and validate a ticker: trimmed, uppercased, 1-10 characters from
/// `A-Z 0-9 . ^ = -`.
pub fn validate_symbol(raw: &str) -> EngineResult<String> {
    let symbol = raw.trim().to_uppercase();
    let valid = !symbol.is_empty()
        && symbol.len() <= MAX_SYMBOL_LEN
        && symbol
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '^' | '=' | '-'));

    if valid {
        Ok(symbol)
    } else {
        Err(EngineError::InvalidSymbol(raw.to_string()))
    }
}

pub struct Engine {
    source: Arc<dyn CandleSource>,
    clock: Arc<dyn Clock>,
    session: SessionClock,
    detector: BreakoutDetector,
    cache: ResearchCache,
    fetch_timeout: Duration,
    intraday_lookback: chrono::Duration,
    daily_lookback: chrono::Duration,
    scan_concurrency: usize,
    default_symbols: Vec<String>,
}

impl Engine {
    pub fn new(
        config: &EngineConfig,
        source: Arc<dyn CandleSource>,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let session = config.session.session_clock()?;
        config
            .breakout
            .validate()
            .context("invalid breakout parameters")?;
        Ok(Self {
            source,
            session,
            detector: BreakoutDetector::new(config.breakout.clone()),
            cache: ResearchCache::new(config.cache_ttl(), clock.clone()),
            clock,
            fetch_timeout: config.provider.timeout(),
            intraday_lookback: chrono::Duration::days(config.provider.intraday_lookback_days.max(1)),
            daily_lookback: chrono::Duration::days(config.provider.daily_lookback_days.max(1)),
            scan_concurrency: config.scan_concurrency.max(1),
            default_symbols: config.symbols.clone(),
        })
    }

    /// Override the per-fetch timeout.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn default_symbols(&self) -> &[String] {
        &self.default_symbols
    }

    pub fn params(&self) -> &BreakoutParams {
        self.detector.params()
    }

    pub fn session_status(&self) -> SessionStatus {
        self.session.status_at(self.clock.now())
    }

    // -------------------------------------------------------------------------
    // Fetching
    // -------------------------------------------------------------------------

    async fn fetch(
        &self,
        symbol: &str,
        interval: Interval,
        lookback: chrono::Duration,
    ) -> EngineResult<Vec<Candle>> {
        match tokio::time::timeout(
            self.fetch_timeout,
            self.source.fetch_candles(symbol, interval, lookback),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                warn!(symbol, %interval, timeout_ms = self.fetch_timeout.as_millis() as u64, "candle fetch timed out");
                Err(EngineError::data_unavailable(
                    symbol,
                    format!("request timed out after {:?}", self.fetch_timeout),
                ))
            }
        }
    }

    // -------------------------------------------------------------------------
    // analyze
    // -------------------------------------------------------------------------

    /// ORB signal for one symbol right now.
    ///
    /// Outside the session this returns MARKET_CLOSED without fetching. Too
    /// few session candles produce a WAIT signal rather than an error.
    #[instrument(skip(self, raw_symbol), fields(symbol = %raw_symbol))]
    pub async fn analyze(&self, raw_symbol: &str) -> EngineResult<Signal> {
        let symbol = validate_symbol(raw_symbol)?;
        let now = self.clock.now();
        let status = self.session.status_at(now);

        if !status.is_open {
            debug!(symbol = %symbol, local_time = %status.local_time, "market closed, skipping fetch");
            return Ok(Signal::market_closed(&symbol, &status, now));
        }

        let candles = self
            .fetch(&symbol, Interval::FiveMinute, self.intraday_lookback)
            .await?;
        let signal = self.build_signal(&symbol, &status, now, &candles);

        info!(
            symbol = %symbol,
            kind = %signal.kind,
            confidence = signal.confidence,
            price = signal.current_price,
            volume_ratio = signal.volume_ratio,
            "ORB signal generated"
        );
        Ok(signal)
    }

    /// Pure signal construction from already-fetched bars.
    pub fn build_signal(
        &self,
        symbol: &str,
        status: &SessionStatus,
        now: DateTime<Utc>,
        candles: &[Candle],
    ) -> Signal {
        let today = session_candles(candles, status.session_open);
        let current_price = today.last().map(|c| c.close).unwrap_or_default();

        let range = match OpeningRange::build(&today, status.minutes_since_open) {
            Ok(range) => range,
            Err(err) => {
                debug!(symbol, session_candles = today.len(), "opening range unavailable");
                return Signal::wait(
                    symbol,
                    status,
                    now,
                    current_price,
                    vec![
                        format!("Waiting for opening range data: {err}"),
                        format!(
                            "{:.0} min into session | {:.0} min until close",
                            status.minutes_since_open.floor(),
                            status.minutes_until_close.floor()
                        ),
                    ],
                );
            }
        };

        let profile = session_volume_profile(&today, range.volume);
        let kind = self.detector.classify(&BreakoutInput {
            minutes_since_open: status.minutes_since_open,
            session_minutes: status.session_minutes,
            current_price,
            range_high: range.high,
            range_low: range.low,
            volume_ratio: profile.volume_ratio,
        });
        let score = scoring::score(
            self.params(),
            kind,
            current_price,
            range.high,
            range.low,
            profile.volume_ratio,
        );
        let reasoning = self.reasoning(kind, &range, current_price, &profile, &score, status);

        Signal {
            symbol: symbol.to_string(),
            kind,
            action: kind.action(),
            confidence: score.confidence,
            entry_price: score.levels.entry,
            stop_loss: score.levels.stop_loss,
            target1: score.levels.target1,
            target2: score.levels.target2,
            reasoning,
            opening_range: Some(range),
            current_price,
            session_minutes_elapsed: status.minutes_since_open,
            minutes_until_close: status.minutes_until_close,
            local_time: status.local_time.clone(),
            volume_ratio: profile.volume_ratio,
            volume_profile: profile,
            market_open: status.is_open,
            generated_at: now,
        }
    }

    fn reasoning(
        &self,
        kind: SignalKind,
        range: &OpeningRange,
        price: f64,
        profile: &VolumeProfile,
        score: &Score,
        status: &SessionStatus,
    ) -> Vec<String> {
        let params = self.params();
        let elapsed = status.minutes_since_open.floor();
        let remaining = status.minutes_until_close.floor();
        let band = format!(
            "{:.2} - {:.2} ({:.2}%)",
            range.low, range.high, range.width_percent
        );
        let levels = &score.levels;

        match kind {
            SignalKind::RangeForming => vec![
                format!("Opening range forming ({elapsed:.0} min into session)"),
                format!("Current range: {band}"),
                format!(
                    "{:.0} minutes until the range is established",
                    (params.range_established_minutes - status.minutes_since_open).max(0.0)
                ),
                format!(
                    "Wait for a break above {:.2} or below {:.2}",
                    range.high, range.low
                ),
            ],
            SignalKind::BreakoutBullish | SignalKind::BreakoutBearish => {
                let bullish = kind == SignalKind::BreakoutBullish;
                vec![
                    if bullish {
                        format!("Bullish breakout: price {price:.2} > range high {:.2}", range.high)
                    } else {
                        format!("Bearish breakout: price {price:.2} < range low {:.2}", range.low)
                    },
                    format!(
                        "Opening range ({:.0} min): {band}",
                        range.minutes_to_establish
                    ),
                    format!(
                        "Volume confirmation: {:.2}x average (threshold {:.1}x)",
                        profile.volume_ratio, params.volume_threshold
                    ),
                    format!(
                        "Breakout strength: {:.2}% {} range {}",
                        score.breakout_percent,
                        if bullish { "above" } else { "below" },
                        if bullish { "high" } else { "low" }
                    ),
                    format!("Entry: {:.2} | Stop: {:.2}", levels.entry, levels.stop_loss),
                    format!(
                        "Target 1 (1:1): {:.2} | Target 2 (2:1): {:.2}",
                        levels.target1, levels.target2
                    ),
                    format!("{elapsed:.0} min into session | {remaining:.0} min until close"),
                ]
            }
            SignalKind::NoBreakout => {
                let mut lines = vec![
                    "No breakout: price within opening range or volume unconfirmed".to_string(),
                    format!("Opening range: {band}"),
                    format!("Current price: {price:.2}"),
                    format!("Volume: {:.2}x average", profile.volume_ratio),
                ];
                if profile.volume_ratio <= params.volume_threshold {
                    lines.push(format!(
                        "Insufficient volume for a high-probability setup (need {:.1}x, have {:.2}x)",
                        params.volume_threshold, profile.volume_ratio
                    ));
                } else {
                    lines.push(format!(
                        "Watch for a break above {:.2} (bullish) or below {:.2} (bearish)",
                        range.high, range.low
                    ));
                }
                lines.push(format!(
                    "{elapsed:.0} min into session | {remaining:.0} min until close"
                ));
                lines
            }
            SignalKind::MarketClosed => vec![format!("Market closed ({})", status.local_time)],
        }
    }

    // -------------------------------------------------------------------------
    // research
    // -------------------------------------------------------------------------

    /// Quote, indicators, analysis and (during the session) the ORB signal.
    /// Served from the cache while fresh.
    #[instrument(skip(self, raw_symbol), fields(symbol = %raw_symbol))]
    pub async fn research(&self, raw_symbol: &str) -> EngineResult<ResearchResult> {
        let symbol = validate_symbol(raw_symbol)?;

        if let Some(hit) = self.cache.get(&symbol) {
            debug!(symbol = %symbol, "research cache hit");
            return Ok(hit);
        }

        let (daily, signal) = tokio::join!(
            self.fetch(&symbol, Interval::Daily, self.daily_lookback),
            self.analyze(&symbol),
        );
        let daily = daily?;
        let signal = match signal {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!(symbol = %symbol, error = %err, "intraday analysis failed, research continues without a signal");
                None
            }
        };

        let result = ResearchResult::build(&symbol, &daily, signal, self.clock.now())?;
        self.cache.insert(&symbol, result.clone());

        info!(
            symbol = %symbol,
            price = result.quote.price,
            sentiment = ?result.analysis.sentiment,
            has_signal = result.signal.is_some(),
            "research generated"
        );
        Ok(result)
    }

    // -------------------------------------------------------------------------
    // scan
    // -------------------------------------------------------------------------

    /// Analyze every valid symbol with at most `scan_concurrency` in flight.
    ///
    /// Invalid symbols are skipped. Data failures become WAIT signals. The
    /// result is sorted by confidence, highest first.
    #[instrument(skip(self, symbols), fields(requested = symbols.len()))]
    pub async fn scan(&self, symbols: &[String]) -> Vec<Signal> {
        let valid: Vec<String> = symbols
            .iter()
            .filter_map(|raw| match validate_symbol(raw) {
                Ok(symbol) => Some(symbol),
                Err(err) => {
                    warn!(error = %err, "skipping symbol in scan");
                    None
                }
            })
            .collect();

        let mut signals: Vec<Signal> = stream::iter(valid)
            .map(|symbol| async move {
                match self.analyze(&symbol).await {
                    Ok(signal) => signal,
                    Err(err) => {
                        warn!(symbol = %symbol, error = %err, "scan analysis failed");
                        let now = self.clock.now();
                        Signal::from_error(&symbol, &self.session.status_at(now), now, &err)
                    }
                }
            })
            .buffer_unordered(self.scan_concurrency)
            .collect()
            .await;

        sort_by_confidence(&mut signals);

        info!(
            scanned = signals.len(),
            actionable = signals.iter().filter(|s| s.is_actionable()).count(),
            "scan complete"
        );
        signals
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("session", &self.session)
            .field("detector", &self.detector)
            .field("cache", &self.cache)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("scan_concurrency", &self.scan_concurrency)
            .finish()
    }
}
