// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================

/// Arithmetic mean of the last `period` values.
///
/// With fewer than `period` values the whole series is averaged instead, so a
/// thin intraday window still yields a usable number. An empty series or a
/// zero period yields 0.0.
pub fn calculate_sma(values: &[f64], period: usize) -> f64 {
    if values.is_empty() || period == 0 {
        return 0.0;
    }
    let window = &values[values.len().saturating_sub(period)..];
    window.iter().sum::<f64>() / window.len() as f64
}
