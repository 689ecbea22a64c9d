// =============================================================================
// Research Cache
// =============================================================================
//
// TTL cache of research results keyed by uppercased symbol. An entry is a hit
// while `now < expires_at`; expired entries are removed on lookup and there is
// no background sweeper. Recomputed results overwrite the previous entry.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::debug;

use crate::research::ResearchResult;
use crate::session::Clock;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: ResearchResult,
    expires_at: DateTime<Utc>,
}

pub struct ResearchCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResearchCache {
    pub fn new(ttl: std::time::Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(120)),
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn key(symbol: &str) -> String {
        symbol.trim().to_uppercase()
    }

    pub fn get(&self, symbol: &str) -> Option<ResearchResult> {
        let key = Self::key(symbol);
        let now = self.clock.now();

        {
            let entries = self.entries.read();
            match entries.get(&key) {
                Some(entry) if now < entry.expires_at => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: re-check under the write lock, a fresh insert may have raced us.
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get(&key) {
            if now < entry.expires_at {
                return Some(entry.value.clone());
            }
            entries.remove(&key);
            debug!(symbol = %key, "research cache entry expired");
        }
        None
    }

    pub fn insert(&self, symbol: &str, value: ResearchResult) {
        let expires_at = self.clock.now() + self.ttl;
        self.entries
            .write()
            .insert(Self::key(symbol), CacheEntry { value, expires_at });
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for ResearchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::Candle;
    use crate::session::ManualClock;
    use chrono::TimeZone;

    fn result(symbol: &str, now: DateTime<Utc>) -> ResearchResult {
        let candles: Vec<Candle> = (0..30)
            .map(|i| {
                let c = 100.0 + i as f64;
                Candle::new(now - Duration::days(30 - i), c, c + 1.0, c - 1.0, c, 1_000)
            })
            .collect();
        ResearchResult::build(symbol, &candles, None, now).unwrap()
    }

    fn setup() -> (Arc<ManualClock>, ResearchCache) {
        let start = Utc.with_ymd_and_hms(2024, 3, 5, 15, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let cache = ResearchCache::new(std::time::Duration::from_secs(120), clock.clone());
        (clock, cache)
    }

    #[test]
    fn hit_within_ttl_case_insensitive() {
        let (clock, cache) = setup();
        let value = result("AAPL", clock.now());
        cache.insert("aapl", value.clone());

        clock.advance(Duration::seconds(119));
        assert_eq!(cache.get("AAPL"), Some(value));
    }

    #[test]
    fn expired_entry_is_removed_on_lookup() {
        let (clock, cache) = setup();
        cache.insert("MSFT", result("MSFT", clock.now()));
        assert_eq!(cache.len(), 1);

        clock.advance(Duration::seconds(120));
        assert_eq!(cache.get("MSFT"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_overwrites_and_resets_expiry() {
        let (clock, cache) = setup();
        cache.insert("SPY", result("SPY", clock.now()));
        clock.advance(Duration::seconds(100));

        let fresh = result("SPY", clock.now());
        cache.insert("SPY", fresh.clone());
        clock.advance(Duration::seconds(100));

        assert_eq!(cache.get("SPY"), Some(fresh));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn miss_on_unknown_symbol() {
        let (_clock, cache) = setup();
        assert_eq!(cache.get("QQQ"), None);
    }
}
