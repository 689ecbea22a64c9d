// =============================================================================
// Shared types used across the ORB engine
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::opening_range::OpeningRange;
use crate::session::SessionStatus;

/// Outcome of the breakout state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    RangeForming,
    BreakoutBullish,
    BreakoutBearish,
    NoBreakout,
    MarketClosed,
}

impl SignalKind {
    pub fn action(self) -> SignalAction {
        match self {
            Self::BreakoutBullish => SignalAction::Buy,
            Self::BreakoutBearish => SignalAction::Sell,
            _ => SignalAction::Wait,
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RangeForming => write!(f, "RANGE_FORMING"),
            Self::BreakoutBullish => write!(f, "BREAKOUT_BULLISH"),
            Self::BreakoutBearish => write!(f, "BREAKOUT_BEARISH"),
            Self::NoBreakout => write!(f, "NO_BREAKOUT"),
            Self::MarketClosed => write!(f, "MARKET_CLOSED"),
        }
    }
}

/// What a trader should do with a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
    Wait,
}

impl Default for SignalAction {
    fn default() -> Self {
        Self::Wait
    }
}

impl std::fmt::Display for SignalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Wait => write!(f, "WAIT"),
        }
    }
}

/// Session volume context behind a signal's volume ratio.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeProfile {
    pub opening_range_volume: u64,
    pub current_volume: u64,
    pub average_volume: f64,
    pub volume_ratio: f64,
}

/// Entry / stop / targets for a signal. All zero except `entry` when the
/// signal is not actionable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeLevels {
    pub entry: f64,
    pub stop_loss: f64,
    pub target1: f64,
    pub target2: f64,
}

impl TradeLevels {
    pub fn non_actionable(current_price: f64) -> Self {
        Self {
            entry: current_price,
            ..Self::default()
        }
    }

    /// Distance between entry and stop.
    pub fn risk(&self) -> f64 {
        (self.entry - self.stop_loss).abs()
    }
}

/// A trading signal for one symbol at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signal {
    pub symbol: String,
    pub kind: SignalKind,
    pub action: SignalAction,
    /// Heuristic score in [0, 10].
    pub confidence: f64,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub target1: f64,
    pub target2: f64,
    pub reasoning: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_range: Option<OpeningRange>,
    pub current_price: f64,
    pub session_minutes_elapsed: f64,
    pub minutes_until_close: f64,
    pub local_time: String,
    pub volume_ratio: f64,
    pub volume_profile: VolumeProfile,
    pub market_open: bool,
    pub generated_at: DateTime<Utc>,
}

impl Signal {
    /// Skeleton signal with zero levels and no range; callers fill the rest.
    fn base(symbol: &str, kind: SignalKind, session: &SessionStatus, now: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.to_string(),
            kind,
            action: kind.action(),
            confidence: 0.0,
            entry_price: 0.0,
            stop_loss: 0.0,
            target1: 0.0,
            target2: 0.0,
            reasoning: Vec::new(),
            opening_range: None,
            current_price: 0.0,
            session_minutes_elapsed: session.minutes_since_open,
            minutes_until_close: session.minutes_until_close,
            local_time: session.local_time.clone(),
            volume_ratio: 0.0,
            volume_profile: VolumeProfile::default(),
            market_open: session.is_open,
            generated_at: now,
        }
    }

    /// Outside regular hours. Produced without touching the data source.
    pub fn market_closed(symbol: &str, session: &SessionStatus, now: DateTime<Utc>) -> Self {
        let mut signal = Self::base(symbol, SignalKind::MarketClosed, session, now);
        signal.market_open = false;
        if session.minutes_since_open < 0.0 {
            let wait = (-session.minutes_since_open).floor() as i64;
            signal.reasoning.push("Market closed: regular session has not opened yet".into());
            signal.reasoning.push(format!("Local time: {}", session.local_time));
            signal
                .reasoning
                .push(format!("Time until open: {}h {}m", wait / 60, wait % 60));
        } else {
            signal.reasoning.push("Market closed: regular session has ended".into());
            signal.reasoning.push(format!("Local time: {}", session.local_time));
            signal
                .reasoning
                .push("Opening range analysis resumes at the next session open".into());
        }
        signal
    }

    /// Non-actionable NO_BREAKOUT signal carrying `reasoning` verbatim.
    pub fn wait(
        symbol: &str,
        session: &SessionStatus,
        now: DateTime<Utc>,
        current_price: f64,
        reasoning: Vec<String>,
    ) -> Self {
        let mut signal = Self::base(symbol, SignalKind::NoBreakout, session, now);
        signal.current_price = current_price;
        signal.entry_price = current_price;
        signal.reasoning = reasoning;
        signal
    }

    /// WAIT signal standing in for a failed analysis.
    pub fn from_error(
        symbol: &str,
        session: &SessionStatus,
        now: DateTime<Utc>,
        err: &EngineError,
    ) -> Self {
        Self::wait(symbol, session, now, 0.0, vec![format!("Error: {err}")])
    }

    pub fn is_actionable(&self) -> bool {
        self.action != SignalAction::Wait
    }
}
