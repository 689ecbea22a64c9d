// =============================================================================
// Runtime Configuration — engine settings with atomic save
// =============================================================================
//
// Every tunable parameter of the ORB engine lives here: the exchange session,
// the breakout / confidence constants, the market-data provider and the
// scanner / cache limits.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash.  All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.
//
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::session::SessionClock;

/// Upper end of the confidence scale.
const CONFIDENCE_CEILING: f64 = 10.0;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbols() -> Vec<String> {
    [
        "AAPL", "TSLA", "NVDA", "MSFT", "GOOGL", "AMZN", "META", "NFLX", "AMD", "PLTR", "LCID",
        "RIVN", "SPY", "QQQ", "IWM", "DIA",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    120
}

fn default_scan_concurrency() -> usize {
    4
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

fn default_open_time() -> String {
    "09:30".to_string()
}

fn default_close_time() -> String {
    "16:00".to_string()
}

fn default_range_established_minutes() -> f64 {
    30.0
}

fn default_volume_threshold() -> f64 {
    1.2
}

fn default_base_confidence() -> f64 {
    5.0
}

fn default_volume_weight() -> f64 {
    3.0
}

fn default_breakout_weight() -> f64 {
    10.0
}

fn default_min_confidence() -> f64 {
    1.0
}

fn default_max_confidence() -> f64 {
    10.0
}

fn default_forming_confidence() -> f64 {
    5.0
}

fn default_provider_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_intraday_lookback_days() -> i64 {
    2
}

fn default_daily_lookback_days() -> i64 {
    365
}

// =============================================================================
// SessionConfig
// =============================================================================

/// Exchange session: IANA timezone plus fixed local open/close wall-clock times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Local open time, `HH:MM`.
    #[serde(default = "default_open_time")]
    pub open: String,

    /// Local close time, `HH:MM`.
    #[serde(default = "default_close_time")]
    pub close: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            open: default_open_time(),
            close: default_close_time(),
        }
    }
}

impl SessionConfig {
    /// Resolve the timezone name and wall-clock times into a [`SessionClock`].
    pub fn session_clock(&self) -> Result<SessionClock> {
        let tz: Tz = self
            .timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("unknown timezone {:?}: {e}", self.timezone))?;
        let open = NaiveTime::parse_from_str(&self.open, "%H:%M")
            .with_context(|| format!("invalid session open time {:?}", self.open))?;
        let close = NaiveTime::parse_from_str(&self.close, "%H:%M")
            .with_context(|| format!("invalid session close time {:?}", self.close))?;
        if close <= open {
            anyhow::bail!("session close {} must be after open {}", self.close, self.open);
        }
        Ok(SessionClock::new(tz, open, close))
    }
}

// =============================================================================
// BreakoutParams
// =============================================================================

/// Breakout detection and confidence scoring constants.
///
/// The defaults reproduce the production values exactly; they have no stated
/// derivation and are exposed here so they can be tuned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakoutParams {
    /// Minutes after the open during which the range is still forming.
    #[serde(default = "default_range_established_minutes")]
    pub range_established_minutes: f64,

    /// Current volume / session average volume must exceed this to confirm.
    #[serde(default = "default_volume_threshold")]
    pub volume_threshold: f64,

    #[serde(default = "default_base_confidence")]
    pub base_confidence: f64,

    /// Confidence added per 1.0 of volume ratio above 1.0.
    #[serde(default = "default_volume_weight")]
    pub volume_weight: f64,

    /// Confidence added per 1% of breakout distance.
    #[serde(default = "default_breakout_weight")]
    pub breakout_weight: f64,

    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    #[serde(default = "default_max_confidence")]
    pub max_confidence: f64,

    /// Confidence reported while the range is forming.
    #[serde(default = "default_forming_confidence")]
    pub forming_confidence: f64,
}

impl Default for BreakoutParams {
    fn default() -> Self {
        Self {
            range_established_minutes: default_range_established_minutes(),
            volume_threshold: default_volume_threshold(),
            base_confidence: default_base_confidence(),
            volume_weight: default_volume_weight(),
            breakout_weight: default_breakout_weight(),
            min_confidence: default_min_confidence(),
            max_confidence: default_max_confidence(),
            forming_confidence: default_forming_confidence(),
        }
    }
}

impl BreakoutParams {
    /// Reject constants that would break the scorer: confidence bounds must
    /// satisfy 0 <= min <= max <= 10, and the thresholds must be positive.
    pub fn validate(&self) -> Result<()> {
        let scale = 0.0..=CONFIDENCE_CEILING;
        if !scale.contains(&self.min_confidence) {
            anyhow::bail!("min_confidence {} must be within [0, 10]", self.min_confidence);
        }
        if !scale.contains(&self.max_confidence) {
            anyhow::bail!("max_confidence {} must be within [0, 10]", self.max_confidence);
        }
        if self.min_confidence > self.max_confidence {
            anyhow::bail!(
                "min_confidence {} exceeds max_confidence {}",
                self.min_confidence,
                self.max_confidence
            );
        }
        if !scale.contains(&self.forming_confidence) {
            anyhow::bail!("forming_confidence {} must be within [0, 10]", self.forming_confidence);
        }
        if !(self.volume_threshold > 0.0 && self.volume_threshold.is_finite()) {
            anyhow::bail!("volume_threshold {} must be positive", self.volume_threshold);
        }
        if !(self.range_established_minutes > 0.0 && self.range_established_minutes.is_finite()) {
            anyhow::bail!(
                "range_established_minutes {} must be positive",
                self.range_established_minutes
            );
        }
        for (name, value) in [
            ("base_confidence", self.base_confidence),
            ("volume_weight", self.volume_weight),
            ("breakout_weight", self.breakout_weight),
        ] {
            if !value.is_finite() {
                anyhow::bail!("{name} must be a finite number, got {value}");
            }
        }
        Ok(())
    }
}

// =============================================================================
// ProviderConfig
// =============================================================================

/// Upstream market-data provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_url")]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout. A timed-out fetch is a `DataUnavailable` failure.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// How far back 5-minute bars are requested.
    #[serde(default = "default_intraday_lookback_days")]
    pub intraday_lookback_days: i64,

    /// How far back daily bars are requested for research.
    #[serde(default = "default_daily_lookback_days")]
    pub daily_lookback_days: i64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            intraday_lookback_days: default_intraday_lookback_days(),
            daily_lookback_days: default_daily_lookback_days(),
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Top-level configuration for the ORB engine.
///
/// Every field has a serde default so that older JSON files missing new fields
/// will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Symbols scanned when a scan request names none.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Research cache time-to-live.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum symbols analysed concurrently by a scan.
    #[serde(default = "default_scan_concurrency")]
    pub scan_concurrency: usize,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub breakout: BreakoutParams,

    #[serde(default)]
    pub provider: ProviderConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            bind_addr: default_bind_addr(),
            cache_ttl_secs: default_cache_ttl_secs(),
            scan_concurrency: default_scan_concurrency(),
            session: SessionConfig::default(),
            breakout: BreakoutParams::default(),
            provider: ProviderConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse engine config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbols = config.symbols.len(),
            timezone = %config.session.timezone,
            "engine config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise engine config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "engine config saved (atomic)");
        Ok(())
    }

    /// Apply `ORB_*` environment overrides on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(syms) = std::env::var("ORB_SYMBOLS") {
            let parsed: Vec<String> = syms
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !parsed.is_empty() {
                self.symbols = parsed;
            }
        }
        if let Ok(addr) = std::env::var("ORB_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Ok(url) = std::env::var("ORB_PROVIDER_URL") {
            self.provider.base_url = url;
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
