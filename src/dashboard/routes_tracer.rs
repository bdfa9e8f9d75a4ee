//! Queue status, tracer slice, and dashboard handlers.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use std::sync::Arc;

use super::AppState;
use crate::aggregator::DashboardData;
use crate::error::TracerError;
use crate::queue::QueueLength;
use crate::repository::TracerPage;
use crate::service::Envelope;
use crate::task_status::SpiderTaskMode;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SliceQuery {
    page: Option<i64>,
    page_size: Option<i64>,
    mode: Option<String>,
}

impl SliceQuery {
    fn page(&self) -> i64 {
        self.page.unwrap_or(0)
    }

    fn page_size(&self, state: &AppState) -> i64 {
        self.page_size.unwrap_or(state.default_page_size)
    }
}

pub(super) async fn handler_author_queue(
    State(state): State<Arc<AppState>>,
) -> Result<Envelope<QueueLength>, TracerError> {
    let reply = state.service.author_queue_status().await?;
    state
        .prom_metrics
        .observe_queue(&state.service.queue_names().author, reply.payload.length);
    Ok(reply)
}

pub(super) async fn handler_video_queue(
    State(state): State<Arc<AppState>>,
) -> Result<Envelope<QueueLength>, TracerError> {
    let reply = state.service.video_queue_status().await?;
    state
        .prom_metrics
        .observe_queue(&state.service.queue_names().video, reply.payload.length);
    Ok(reply)
}

pub(super) async fn handler_exists_tasks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SliceQuery>,
) -> Result<Envelope<TracerPage>, TracerError> {
    state
        .service
        .slice_exists_task(params.page(), params.page_size(&state))
        .await
}

pub(super) async fn handler_progress_tasks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SliceQuery>,
) -> Result<Envelope<TracerPage>, TracerError> {
    state
        .service
        .slice_progress_task(params.page(), params.page_size(&state))
        .await
}

pub(super) async fn handler_spider_tasks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SliceQuery>,
) -> Result<Envelope<TracerPage>, TracerError> {
    let mode = SpiderTaskMode::parse(params.mode.as_deref());
    state
        .service
        .slice_spider_task(params.page(), params.page_size(&state), mode)
        .await
}

pub(super) async fn handler_dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let reply: Envelope<DashboardData> = state.service.dashboard_data().await;
    state.prom_metrics.observe_dashboard(&reply.payload.failed);
    reply
}
