//! # Dashboard — HTTP Server for the Tracing Subsystem
//!
//! Runs an Axum HTTP server exposing queue depth, tracer slices, and the
//! aggregated dashboard payload, plus health probes and Prometheus metrics.

mod routes_health;
mod routes_tracer;

use crate::config::Settings;
use crate::db::Database;
use crate::prom_metrics;
use crate::queue::RedisQueue;
use crate::service::TracerService;
use crate::store::memory::{MemoryDocumentStore, MemoryQueueStore};
use crate::store::{DocumentStore, QueueStore};
use anyhow::Result;
use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Instrument};

pub struct AppState {
    pub service: TracerService,
    pub documents: Arc<dyn DocumentStore>,
    pub queues: Arc<dyn QueueStore>,
    pub default_page_size: i64,
    pub prom_metrics: prom_metrics::Metrics,
}

impl AppState {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        queues: Arc<dyn QueueStore>,
        settings: &Settings,
    ) -> Arc<Self> {
        Arc::new(AppState {
            service: TracerService::new(
                documents.clone(),
                queues.clone(),
                settings.queues.clone(),
                settings.query_timeout(),
            ),
            documents,
            queues,
            default_page_size: settings.default_page_size,
            prom_metrics: prom_metrics::Metrics::new(),
        })
    }
}

/// Connect the stores named in `settings`.
pub async fn connect_stores(
    settings: &Settings,
) -> Result<(Arc<dyn DocumentStore>, Arc<dyn QueueStore>)> {
    let database_url = settings.database_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!("DATABASE_URL is required (set via --database-url, env, or config)")
    })?;
    let redis_url = settings.redis_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!("REDIS_URL is required (set via --redis-url, env, or config)")
    })?;
    let db = Database::connect(database_url, settings.max_connections).await?;
    let queue = RedisQueue::connect(redis_url).await?;
    Ok((Arc::new(db), Arc::new(queue)))
}

/// In-process stores for local runs without PostgreSQL or Redis.
pub fn memory_stores() -> (Arc<dyn DocumentStore>, Arc<dyn QueueStore>) {
    (
        Arc::new(MemoryDocumentStore::new()),
        Arc::new(MemoryQueueStore::new()),
    )
}

/// Records request duration, generates (or propagates) a request ID, and runs
/// the request inside a tracing span.
async fn metrics_middleware(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> axum::response::Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let method = req.method().to_string();
    let raw_path = req.uri().path().to_string();
    let norm_path = normalize_path(&raw_path);
    let start = std::time::Instant::now();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %raw_path,
    );
    let mut response = next.run(req).instrument(span).await;

    state
        .prom_metrics
        .http_request_duration
        .get_or_create(&prom_metrics::HttpLabel {
            method,
            path: norm_path,
        })
        .observe(start.elapsed().as_secs_f64());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Collapse numeric and UUID path segments into placeholders so histogram
/// labels stay bounded.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|seg| {
            if seg.is_empty() {
                seg.to_string()
            } else if seg.chars().all(|c| c.is_ascii_digit()) {
                ":id".to_string()
            } else if seg.len() == 36 && seg.chars().filter(|c| *c == '-').count() == 4 {
                ":uuid".to_string()
            } else {
                seg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/tracer/queue-status/author",
            get(routes_tracer::handler_author_queue),
        )
        .route(
            "/api/tracer/queue-status/video",
            get(routes_tracer::handler_video_queue),
        )
        .route(
            "/api/tracer/tasks/exists",
            get(routes_tracer::handler_exists_tasks),
        )
        .route(
            "/api/tracer/tasks/progress",
            get(routes_tracer::handler_progress_tasks),
        )
        .route(
            "/api/tracer/tasks/spider",
            get(routes_tracer::handler_spider_tasks),
        )
        .route(
            "/api/tracer/dashboard",
            get(routes_tracer::handler_dashboard),
        )
        .route("/healthz", get(routes_health::handler_healthz))
        .route("/readyz", get(routes_health::handler_readyz))
        .route("/metrics", get(routes_health::handler_metrics))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CatchPanicLayer::new())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .with_state(state)
}

pub async fn run(
    settings: &Settings,
    documents: Arc<dyn DocumentStore>,
    queues: Arc<dyn QueueStore>,
) -> Result<()> {
    let state = AppState::new(documents, queues, settings);
    let app = build_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "tracer dashboard listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("tracer dashboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("received SIGINT, shutting down"),
                    _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                ctrl_c.await.ok();
                info!("received SIGINT, shutting down");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("received SIGINT, shutting down");
    }
}
