// =============================================================================
// Central Application State — ORB Engine service
// =============================================================================
//
// Shared across all request handlers via `Arc<AppState>`. The engine manages
// its own interior mutability (the research cache); the state adds request
// accounting for the health endpoint.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::engine::Engine;

pub struct AppState {
    pub engine: Arc<Engine>,
    started_at: Instant,
    /// Analysis requests served (analyze, quick, research, scan).
    requests_served: AtomicU64,
}

/// Body of `GET /api/v1/health`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub requests_served: u64,
    pub market_open: bool,
    pub local_time: String,
    pub server_time: i64,
}

impl AppState {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            started_at: Instant::now(),
            requests_served: AtomicU64::new(0),
        }
    }

    pub fn record_request(&self) -> u64 {
        self.requests_served.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn requests_served(&self) -> u64 {
        self.requests_served.load(Ordering::Relaxed)
    }

    pub fn health(&self) -> HealthSnapshot {
        let session = self.engine.session_status();
        HealthSnapshot {
            status: "ok",
            uptime_secs: self.started_at.elapsed().as_secs(),
            requests_served: self.requests_served(),
            market_open: session.is_open,
            local_time: session.local_time,
            server_time: chrono::Utc::now().timestamp_millis(),
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("engine", &self.engine)
            .field("requests_served", &self.requests_served())
            .finish()
    }
}
