// =============================================================================
// MACD — Moving Average Convergence / Divergence
// =============================================================================
//
//   MACD_i    = EMA12[i + 14] - EMA26[i]     (aligned on the EMA26 suffix)
//   signal    = EMA9 over the MACD series
//   histogram = MACD - signal
//
// The reported values are the last elements of each series.
// =============================================================================

use serde::{Deserialize, Serialize};

use super::ema::calculate_ema;

pub const FAST_PERIOD: usize = 12;
pub const SLOW_PERIOD: usize = 26;
pub const SIGNAL_PERIOD: usize = 9;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacdResult {
    pub value: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Standard 12/26/9 MACD. All zeros with fewer than 26 closes.
pub fn calculate_macd(closes: &[f64]) -> MacdResult {
    calculate_macd_with(closes, FAST_PERIOD, SLOW_PERIOD, SIGNAL_PERIOD)
}

/// MACD with explicit periods.
///
/// While the MACD series is still shorter than `signal_period` the signal line
/// has no seed yet and is reported equal to the MACD value (histogram 0).
pub fn calculate_macd_with(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> MacdResult {
    if fast == 0 || slow <= fast || closes.len() < slow {
        return MacdResult::default();
    }

    let fast_series = calculate_ema(closes, fast);
    let slow_series = calculate_ema(closes, slow);
    if slow_series.is_empty() || fast_series.len() < slow_series.len() {
        return MacdResult::default();
    }

    let offset = fast_series.len() - slow_series.len();
    let macd_series: Vec<f64> = slow_series
        .iter()
        .enumerate()
        .map(|(i, slow_ema)| fast_series[i + offset] - slow_ema)
        .collect();

    let Some(&value) = macd_series.last() else {
        return MacdResult::default();
    };
    let signal = calculate_ema(&macd_series, signal_period)
        .last()
        .copied()
        .unwrap_or(value);

    MacdResult {
        value,
        signal,
        histogram: value - signal,
    }
}
