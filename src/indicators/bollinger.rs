// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), σ being the population standard deviation of
// the same window. Upper minus lower is therefore exactly 2k*σ.

use serde::{Deserialize, Serialize};

use super::sma::calculate_sma;

/// Result of a Bollinger Band calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Calculate Bollinger Bands for the given closing prices.
///
/// Uses the last `period` closes, or all of them when fewer are available.
/// An empty series yields all-zero bands.
pub fn calculate_bollinger(closes: &[f64], period: usize, num_std: f64) -> BollingerBands {
    if closes.is_empty() || period == 0 {
        return BollingerBands::default();
    }

    let window = &closes[closes.len().saturating_sub(period)..];
    let middle = calculate_sma(closes, period);
    let std_dev = population_std_dev(window, middle);

    BollingerBands {
        upper: middle + num_std * std_dev,
        middle,
        lower: middle - num_std * std_dev,
    }
}

/// Population standard deviation of `window` around `mean`.
pub fn population_std_dev(window: &[f64], mean: f64) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / window.len() as f64;
    variance.sqrt()
}
