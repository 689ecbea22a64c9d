pub mod candle;
pub mod source;
pub mod yahoo;

// Re-export the Candle struct for convenient access (e.g. `use crate::market_data::Candle`).
pub use candle::{normalize_sequence, session_candles, Candle, Interval};
pub use source::CandleSource;
pub use yahoo::YahooClient;
