// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`:
//
//   GET /health                 liveness + session snapshot
//   GET /orb/analyze/:symbol    full ORB signal
//   GET /orb/quick/:symbol      core fields and the top reasons
//   GET /orb/scan?symbols=A,B   scan (configured symbols when omitted)
//   GET /research/:symbol       quote, indicators, analysis, signal
//
// CORS is configured permissively for development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api::ApiError;
use crate::app_state::AppState;
use crate::opening_range::OpeningRange;
use crate::scanner::ScanReport;
use crate::types::{SignalAction, SignalKind};

/// Reasons included in a quick signal.
const QUICK_REASONS: usize = 4;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/orb/analyze/:symbol", get(analyze))
        .route("/api/v1/orb/quick/:symbol", get(quick))
        .route("/api/v1/orb/scan", get(scan))
        .route("/api/v1/research/:symbol", get(research))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.health())
}

// =============================================================================
// ORB signals
// =============================================================================

async fn analyze(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.record_request();
    let signal = state.engine.analyze(&symbol).await?;
    Ok(Json(signal))
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuickSignal {
    symbol: String,
    kind: SignalKind,
    action: SignalAction,
    confidence: f64,
    entry_price: f64,
    stop_loss: f64,
    target1: f64,
    target2: f64,
    current_price: f64,
    market_open: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    opening_range: Option<OpeningRange>,
    reasoning: Vec<String>,
}

async fn quick(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.record_request();
    let signal = state.engine.analyze(&symbol).await?;

    Ok(Json(QuickSignal {
        symbol: signal.symbol,
        kind: signal.kind,
        action: signal.action,
        confidence: signal.confidence,
        entry_price: signal.entry_price,
        stop_loss: signal.stop_loss,
        target1: signal.target1,
        target2: signal.target2,
        current_price: signal.current_price,
        market_open: signal.market_open,
        opening_range: signal.opening_range,
        reasoning: signal.reasoning.into_iter().take(QUICK_REASONS).collect(),
    }))
}

#[derive(Debug, Default, Deserialize)]
struct ScanParams {
    /// Comma-separated symbol list.
    symbols: Option<String>,
}

async fn scan(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ScanParams>,
) -> impl IntoResponse {
    state.record_request();

    let requested: Vec<String> = params
        .symbols
        .as_deref()
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let symbols = if requested.is_empty() {
        state.engine.default_symbols().to_vec()
    } else {
        requested
    };

    let report = ScanReport::new(state.engine.scan(&symbols).await);
    info!(
        scanned = report.summary.total_scanned,
        buy = report.summary.buy_signals,
        sell = report.summary.sell_signals,
        "Scan served via API"
    );
    Json(report)
}

// =============================================================================
// Research
// =============================================================================

async fn research(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state.record_request();
    let result = state.engine.research(&symbol).await?;
    Ok(Json(result))
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{daily_bars, engine_at, session_bars, utc, FakeSource};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app_at(now: chrono::DateTime<chrono::Utc>) -> Router {
        let mut source = FakeSource::default();
        source.intraday.insert("AAPL".into(), session_bars(103.0, 2_000));
        source.daily.insert("AAPL".into(), daily_bars(60));
        source.daily.insert("THIN".into(), daily_bars(5));
        let engine = engine_at(now, Arc::new(source));
        router(Arc::new(AppState::new(Arc::new(engine))))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_reports_session() {
        let (status, body) = get_json(app_at(utc(15, 2)), "/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["marketOpen"], true);
    }

    #[tokio::test]
    async fn analyze_returns_signal() {
        let (status, body) = get_json(app_at(utc(15, 2)), "/api/v1/orb/analyze/aapl").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "AAPL");
        assert_eq!(body["kind"], "BREAKOUT_BULLISH");
        assert_eq!(body["action"], "BUY");
        assert_eq!(body["entryPrice"], 102.0);
        assert_eq!(body["openingRange"]["rangeCandleCount"], 6);
    }

    #[tokio::test]
    async fn quick_trims_reasoning() {
        let (status, body) = get_json(app_at(utc(15, 2)), "/api/v1/orb/quick/AAPL").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reasoning"].as_array().unwrap().len(), 4);
        assert!(body.get("volumeProfile").is_none());
    }

    #[tokio::test]
    async fn invalid_symbol_is_400() {
        let (status, body) =
            get_json(app_at(utc(15, 2)), "/api/v1/orb/analyze/WAY_TOO_LONG_SYMBOL").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "InvalidSymbol");
    }

    #[tokio::test]
    async fn unavailable_data_is_502() {
        let (status, body) = get_json(app_at(utc(15, 2)), "/api/v1/orb/analyze/MSFT").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "DataUnavailable");
    }

    #[tokio::test]
    async fn short_history_is_422() {
        let (status, body) = get_json(app_at(utc(22, 0)), "/api/v1/research/THIN").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "InsufficientData");
    }

    #[tokio::test]
    async fn research_includes_signal_during_session() {
        let (status, body) = get_json(app_at(utc(15, 2)), "/api/v1/research/AAPL").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["quote"]["symbol"], "AAPL");
        assert!(body["technicals"].get("rsi14").is_some());
        assert_eq!(body["signal"]["kind"], "BREAKOUT_BULLISH");
    }

    #[tokio::test]
    async fn scan_with_explicit_symbols() {
        let (status, body) =
            get_json(app_at(utc(15, 2)), "/api/v1/orb/scan?symbols=aapl,MSFT,bad%20one").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["totalScanned"], 2);
        assert_eq!(body["summary"]["buySignals"], 1);
        assert_eq!(body["signals"][0]["symbol"], "AAPL");
        assert!(body["signals"][1]["reasoning"][0]
            .as_str()
            .unwrap()
            .starts_with("Error: "));
    }

    #[tokio::test]
    async fn scan_defaults_to_configured_symbols() {
        let (status, body) = get_json(app_at(utc(3, 0)), "/api/v1/orb/scan").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["totalScanned"], 16);
        assert_eq!(body["summary"]["waitSignals"], 16);
    }
}
