// =============================================================================
// Relative Volume
// =============================================================================

/// `current / mean(sample)`, or `None` for an empty or zero-volume sample.
pub fn relative_volume(current: u64, sample: &[u64]) -> Option<f64> {
    if sample.is_empty() {
        return None;
    }
    let mean = sample.iter().map(|&v| v as f64).sum::<f64>() / sample.len() as f64;
    if mean > 0.0 {
        Some(current as f64 / mean)
    } else {
        None
    }
}

/// Last volume relative to the mean of the trailing `window` volumes.
///
/// Neutral 1.0 when there is nothing to compare against.
pub fn volume_ratio(volumes: &[u64], window: usize) -> f64 {
    let Some(&current) = volumes.last() else {
        return 1.0;
    };
    let sample = &volumes[volumes.len().saturating_sub(window)..];
    relative_volume(current, sample).unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_volume_basic() {
        assert_eq!(relative_volume(150, &[100, 100, 100]), Some(1.5));
    }

    #[test]
    fn relative_volume_zero_mean() {
        assert_eq!(relative_volume(10, &[0, 0]), None);
        assert_eq!(relative_volume(10, &[]), None);
    }

    #[test]
    fn volume_ratio_trailing_window() {
        let mut volumes = vec![1_000_000; 5];
        volumes.extend(std::iter::repeat(100).take(19));
        volumes.push(200);
        // Window of 20: nineteen 100s and the 200 => mean 105.
        let ratio = volume_ratio(&volumes, 20);
        assert!((ratio - 200.0 / 105.0).abs() < 1e-12);
    }

    #[test]
    fn volume_ratio_empty_is_neutral() {
        assert_eq!(volume_ratio(&[], 20), 1.0);
        assert_eq!(volume_ratio(&[0, 0, 0], 20), 1.0);
    }
}
