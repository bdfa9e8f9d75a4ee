//! # Store Seams — Document and Queue Store Contracts
//!
//! The tracing subsystem reads from two externally owned stores:
//!
//! - a **document store** holding `tracer`, `users` and `check_in` records,
//!   queried with filtered finds, counts, a grouped sum, a bucketed histogram
//!   and a find-one-latest;
//! - a **queue store** reporting the depth of named work queues.
//!
//! Both are traits so the server can run against PostgreSQL + Redis
//! ([`crate::db::Database`], [`crate::queue::RedisQueue`]) or the in-process
//! [`memory`] stores. Clients are built once at startup and shared as
//! `Arc<dyn …>`.
//!
//! Every call made through the repository, reporter and aggregator is bounded
//! by [`with_deadline`].

pub mod memory;

use crate::error::{Result, TracerError};
use crate::histogram::CreditBucket;
use crate::task_status::TaskStatus;
use async_trait::async_trait;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

/// One observed execution unit of a background task.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TracerRecord {
    pub id: i64,
    pub class_name: String,
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,
    pub crawl_count: i64,
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub update_time: chrono::DateTime<chrono::Utc>,
}

/// Selects tracer records by class and, optionally, by status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracerFilter {
    pub class_name: String,
    pub status: Option<TaskStatus>,
}

impl TracerFilter {
    pub fn class(class_name: &str) -> Self {
        TracerFilter {
            class_name: class_name.to_string(),
            status: None,
        }
    }

    pub fn class_and_status(class_name: &str, status: TaskStatus) -> Self {
        TracerFilter {
            class_name: class_name.to_string(),
            status: Some(status),
        }
    }

    pub fn matches(&self, record: &TracerRecord) -> bool {
        record.class_name == self.class_name
            && self.status.map_or(true, |status| record.status == status)
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Records matching `filter`, newest `update_time` first (ties: higher `id` first).
    async fn find_tracers(
        &self,
        filter: &TracerFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<TracerRecord>>;

    async fn count_tracers(&self, filter: &TracerFilter) -> Result<i64>;

    /// Sum of `crawl_count` over one class; 0 when the class has no records.
    async fn sum_crawl_count(&self, class_name: &str) -> Result<i64>;

    /// The record of `class_name` with the greatest `start_time`.
    async fn latest_started(&self, class_name: &str) -> Result<Option<TracerRecord>>;

    /// Users bucketed by credit, see [`crate::histogram`].
    async fn user_credit_histogram(&self) -> Result<Vec<CreditBucket>>;

    async fn count_users(&self) -> Result<i64>;

    async fn count_check_ins(&self) -> Result<i64>;

    /// Connectivity check used by the readiness probe.
    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Number of pending items in `queue`. A queue that does not exist has length 0.
    async fn queue_length(&self, queue: &str) -> Result<u64>;

    async fn ping(&self) -> Result<()>;
}

/// Run a store call under `limit`. An elapsed deadline becomes
/// [`TracerError::StoreUnavailable`].
pub async fn with_deadline<T, F>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(TracerError::StoreUnavailable(format!(
            "{what} timed out after {}ms",
            limit.as_millis()
        ))),
    }
}
