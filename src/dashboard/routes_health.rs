//! # Health & Observability Endpoints
//!
//! | Endpoint | Purpose |
//! |----------|---------|
//! | `GET /healthz` | Liveness — process is alive |
//! | `GET /readyz` | Readiness — document and queue store reachable |
//! | `GET /metrics` | Prometheus scraping endpoint |
//!
//! Readiness pings both stores concurrently with a 2-second timeout and
//! answers 503 naming the store that is down.

use super::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::sync::Arc;
use std::time::Duration;

const READY_TIMEOUT: Duration = Duration::from_secs(2);

/// Liveness probe: no dependencies checked.
pub async fn handler_healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn handler_readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (documents, queues) = tokio::join!(
        tokio::time::timeout(READY_TIMEOUT, state.documents.ping()),
        tokio::time::timeout(READY_TIMEOUT, state.queues.ping()),
    );

    match (documents, queues) {
        (Ok(Ok(())), Ok(Ok(()))) => (StatusCode::OK, "ok"),
        (Ok(Err(_)), _) => (StatusCode::SERVICE_UNAVAILABLE, "document store unreachable"),
        (Err(_), _) => (StatusCode::SERVICE_UNAVAILABLE, "document store timeout"),
        (_, Ok(Err(_))) => (StatusCode::SERVICE_UNAVAILABLE, "queue store unreachable"),
        (_, Err(_)) => (StatusCode::SERVICE_UNAVAILABLE, "queue store timeout"),
    }
}

/// Prometheus metrics in text exposition format.
pub async fn handler_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = state.prom_metrics.encode();
    (
        StatusCode::OK,
        [(
            "content-type",
            "application/openmetrics-text; version=1.0.0; charset=utf-8",
        )],
        body,
    )
}
