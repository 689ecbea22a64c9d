// =============================================================================
// Engine Errors
// =============================================================================
//
// Three kinds reach callers of `analyze` / `research`:
//   - InvalidSymbol    — rejected before any fetch.
//   - DataUnavailable  — upstream unreachable, timed out, or unusable payload.
//   - InsufficientData — too few candles for a computation. The engine turns
//                        this into a WAIT signal instead of failing the call.
// =============================================================================

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid symbol: {0:?}")]
    InvalidSymbol(String),

    #[error("market data unavailable for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("insufficient data: need {required} candles, have {available}")]
    InsufficientData { required: usize, available: usize },
}

impl EngineError {
    pub fn data_unavailable(symbol: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::DataUnavailable {
            symbol: symbol.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable tag used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSymbol(_) => "InvalidSymbol",
            Self::DataUnavailable { .. } => "DataUnavailable",
            Self::InsufficientData { .. } => "InsufficientData",
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_symbol_and_reason() {
        let err = EngineError::data_unavailable("AAPL", "timeout after 10s");
        assert_eq!(
            err.to_string(),
            "market data unavailable for AAPL: timeout after 10s"
        );
        assert_eq!(err.kind(), "DataUnavailable");
    }

    #[test]
    fn insufficient_data_message() {
        let err = EngineError::InsufficientData {
            required: 3,
            available: 1,
        };
        assert!(err.to_string().contains("need 3"));
        assert_eq!(err.kind(), "InsufficientData");
    }
}
