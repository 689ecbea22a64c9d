// =============================================================================
// Scan summary
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::types::{Signal, SignalAction, SignalKind};

/// Confidence at or above which a signal counts as high-confidence.
pub const HIGH_CONFIDENCE: f64 = 7.0;
/// Actionable signals listed in a summary.
pub const TOP_SIGNALS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub total_scanned: usize,
    pub buy_signals: usize,
    pub sell_signals: usize,
    pub wait_signals: usize,
    pub range_forming_signals: usize,
    pub high_confidence_signals: usize,
    pub top_signals: Vec<Signal>,
}

impl ScanSummary {
    /// Summarise `signals`, which are expected sorted by confidence descending.
    pub fn from_signals(signals: &[Signal]) -> Self {
        let count = |pred: fn(&Signal) -> bool| signals.iter().filter(|s| pred(s)).count();

        Self {
            total_scanned: signals.len(),
            buy_signals: count(|s| s.action == SignalAction::Buy),
            sell_signals: count(|s| s.action == SignalAction::Sell),
            wait_signals: count(|s| s.action == SignalAction::Wait),
            range_forming_signals: count(|s| s.kind == SignalKind::RangeForming),
            high_confidence_signals: count(|s| s.confidence >= HIGH_CONFIDENCE),
            top_signals: signals
                .iter()
                .filter(|s| s.is_actionable())
                .take(TOP_SIGNALS)
                .cloned()
                .collect(),
        }
    }
}

/// Sort by confidence descending; ties fall back to the symbol for a stable
/// order regardless of completion order.
pub fn sort_by_confidence(signals: &mut [Signal]) {
    signals.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });
}

/// Summary plus every signal, as returned by a scan request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    pub summary: ScanSummary,
    pub signals: Vec<Signal>,
}

impl ScanReport {
    pub fn new(signals: Vec<Signal>) -> Self {
        Self {
            summary: ScanSummary::from_signals(&signals),
            signals,
        }
    }
}
