//! # Tracer Service — Public Query Façade
//!
//! Entry point used by the HTTP handlers and the CLI. Each operation delegates
//! to the queue reporter, the tracer repository, or the dashboard aggregator
//! and wraps the result in an [`Envelope`] carrying the response status.
//!
//! Single-purpose queries propagate [`crate::error::TracerError`]. The
//! dashboard never fails as a whole; missing sub-results are marked inside the
//! payload.

use crate::aggregator::{DashboardAggregator, DashboardData};
use crate::error::Result;
use crate::queue::{QueueLength, QueueNames, QueueStatusReporter};
use crate::repository::{Pagination, TracerPage, TracerRepository};
use crate::store::{DocumentStore, QueueStore};
use crate::task_status::{SpiderTaskMode, EXISTS_TASK, PROGRESS_TASK, SPIDER_TASK};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// A payload paired with the status it should be answered with.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub status: StatusCode,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn ok(payload: T) -> Self {
        Envelope {
            status: StatusCode::OK,
            payload,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.payload)).into_response()
    }
}

pub struct TracerService {
    tracers: TracerRepository,
    queues: QueueStatusReporter,
    dashboard: DashboardAggregator,
}

impl TracerService {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        queues: Arc<dyn QueueStore>,
        queue_names: QueueNames,
        query_timeout: Duration,
    ) -> Self {
        TracerService {
            tracers: TracerRepository::new(documents.clone(), query_timeout),
            queues: QueueStatusReporter::new(queues, queue_names, query_timeout),
            dashboard: DashboardAggregator::new(documents, query_timeout),
        }
    }

    pub fn queue_names(&self) -> &QueueNames {
        self.queues.names()
    }

    pub async fn author_queue_status(&self) -> Result<Envelope<QueueLength>> {
        Ok(Envelope::ok(self.queues.author_queue_length().await?))
    }

    pub async fn video_queue_status(&self) -> Result<Envelope<QueueLength>> {
        Ok(Envelope::ok(self.queues.video_queue_length().await?))
    }

    /// Existence-check tasks, newest update first.
    #[instrument(skip(self))]
    pub async fn slice_exists_task(&self, page: i64, page_size: i64) -> Result<Envelope<TracerPage>> {
        let page = Pagination::new(page, page_size)?;
        Ok(Envelope::ok(self.tracers.find_by_class(EXISTS_TASK, page).await?))
    }

    /// Link-generation progress tasks, newest update first.
    #[instrument(skip(self))]
    pub async fn slice_progress_task(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<Envelope<TracerPage>> {
        let page = Pagination::new(page, page_size)?;
        Ok(Envelope::ok(self.tracers.find_by_class(PROGRESS_TASK, page).await?))
    }

    #[instrument(skip(self))]
    pub async fn slice_spider_task(
        &self,
        page: i64,
        page_size: i64,
        mode: SpiderTaskMode,
    ) -> Result<Envelope<TracerPage>> {
        let page = Pagination::new(page, page_size)?;
        let slice = match mode.status_filter() {
            None => self.tracers.find_by_class(SPIDER_TASK, page).await?,
            Some(status) => {
                self.tracers
                    .find_by_class_and_status(SPIDER_TASK, status, page)
                    .await?
            }
        };
        Ok(Envelope::ok(slice))
    }

    pub async fn dashboard_data(&self) -> Envelope<DashboardData> {
        Envelope::ok(self.dashboard.collect().await)
    }
}
