// =============================================================================
// Breakout Detector
// =============================================================================
//
// Stateless state machine evaluated once per analysis. Guards apply in order:
//
//   outside the session                         => MARKET_CLOSED
//   inside the range-forming window             => RANGE_FORMING
//   price > range high  AND  volume confirmed   => BREAKOUT_BULLISH
//   price < range low   AND  volume confirmed   => BREAKOUT_BEARISH
//   otherwise                                   => NO_BREAKOUT
//
// "Volume confirmed" means the current candle's volume relative to the mean of
// all session candles strictly exceeds the configured threshold.
// =============================================================================

use crate::market_data::Candle;
use crate::runtime_config::BreakoutParams;
use crate::session::SessionPhase;
use crate::types::{SignalKind, VolumeProfile};

/// Everything the state machine looks at.
#[derive(Debug, Clone, Copy)]
pub struct BreakoutInput {
    pub minutes_since_open: f64,
    pub session_minutes: i64,
    pub current_price: f64,
    pub range_high: f64,
    pub range_low: f64,
    pub volume_ratio: f64,
}

#[derive(Debug, Clone, Default)]
pub struct BreakoutDetector {
    params: BreakoutParams,
}

impl BreakoutDetector {
    pub fn new(params: BreakoutParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &BreakoutParams {
        &self.params
    }

    pub fn phase(&self, minutes_since_open: f64, session_minutes: i64) -> SessionPhase {
        SessionPhase::from_minutes(
            minutes_since_open,
            session_minutes,
            self.params.range_established_minutes,
        )
    }

    pub fn classify(&self, input: &BreakoutInput) -> SignalKind {
        match self.phase(input.minutes_since_open, input.session_minutes) {
            SessionPhase::PreOpen | SessionPhase::AfterClose => SignalKind::MarketClosed,
            SessionPhase::RangeForming => SignalKind::RangeForming,
            SessionPhase::Regular => {
                let confirmed = input.volume_ratio > self.params.volume_threshold;
                if confirmed && input.current_price > input.range_high {
                    SignalKind::BreakoutBullish
                } else if confirmed && input.current_price < input.range_low {
                    SignalKind::BreakoutBearish
                } else {
                    SignalKind::NoBreakout
                }
            }
        }
    }
}

/// Volume profile of today's session: the last candle against the mean of all
/// session candles. The ratio is 0 when the mean is 0.
pub fn session_volume_profile(session_candles: &[Candle], opening_range_volume: u64) -> VolumeProfile {
    let Some(last) = session_candles.last() else {
        return VolumeProfile {
            opening_range_volume,
            ..VolumeProfile::default()
        };
    };

    let average_volume = session_candles.iter().map(|c| c.volume as f64).sum::<f64>()
        / session_candles.len() as f64;
    let volume_ratio = if average_volume > 0.0 {
        last.volume as f64 / average_volume
    } else {
        0.0
    };

    VolumeProfile {
        opening_range_volume,
        current_volume: last.volume,
        average_volume,
        volume_ratio,
    }
}
