// =============================================================================
// ORB Engine — library root
// =============================================================================
//
// Opening Range Breakout signals and technical indicators for US equities,
// served over a small JSON API by the `orb-engine` binary.
// =============================================================================

pub mod api;
pub mod app_state;
pub mod breakout;
pub mod cache;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod market_data;
pub mod opening_range;
pub mod research;
pub mod runtime_config;
pub mod scanner;
pub mod scoring;
pub mod session;
pub mod types;

pub use engine::{validate_symbol, Engine};
pub use error::{EngineError, EngineResult};
pub use indicators::TechnicalIndicators;
pub use market_data::{Candle, CandleSource, Interval, YahooClient};
pub use opening_range::OpeningRange;
pub use research::{MarketAnalysis, Quote, ResearchResult};
pub use runtime_config::EngineConfig;
pub use scanner::{ScanReport, ScanSummary};
pub use session::{Clock, ManualClock, SessionClock, SystemClock};
pub use types::{Signal, SignalAction, SignalKind};
