//! # Dashboard Aggregator — Best-Effort Composite Metrics
//!
//! Builds the dashboard payload from six independent read-only queries:
//!
//! | key | query |
//! |-----|-------|
//! | `sumCrawlCount` | sum of `crawl_count` over `SpiderTask` records |
//! | `sumSpiderCount` | count of `SpiderTask` records that are `alive` |
//! | `userBucketResult` | user credit histogram |
//! | `checkedInCount` | check-in records |
//! | `userCount` | user records |
//! | `latestProgressTask` | `ProgressTask` with the newest `start_time` |
//!
//! The queries share no state, so they run concurrently and are joined into
//! one immutable [`DashboardData`]. Each runs under its own deadline. A query
//! that fails or times out leaves its key `null` and is listed in `failed`;
//! the rest of the payload is still returned.

use crate::error::{Result, TracerError};
use crate::histogram::CreditBucket;
use crate::store::{with_deadline, DocumentStore, TracerFilter, TracerRecord};
use crate::task_status::{TaskStatus, PROGRESS_TASK, SPIDER_TASK};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const SUM_CRAWL_COUNT: &str = "sumCrawlCount";
pub const SUM_SPIDER_COUNT: &str = "sumSpiderCount";
pub const USER_BUCKET_RESULT: &str = "userBucketResult";
pub const CHECKED_IN_COUNT: &str = "checkedInCount";
pub const USER_COUNT: &str = "userCount";
pub const LATEST_PROGRESS_TASK: &str = "latestProgressTask";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub sum_crawl_count: Option<i64>,
    pub sum_spider_count: Option<i64>,
    pub user_bucket_result: Option<Vec<CreditBucket>>,
    pub checked_in_count: Option<i64>,
    pub user_count: Option<i64>,
    pub latest_progress_task: Option<TracerRecord>,
    /// True when at least one sub-query failed.
    pub partial: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<&'static str>,
}

pub struct DashboardAggregator {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl DashboardAggregator {
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        DashboardAggregator { store, timeout }
    }

    pub async fn collect(&self) -> DashboardData {
        let spider_alive = TracerFilter::class_and_status(SPIDER_TASK, TaskStatus::Alive);
        let (crawl_sum, alive, buckets, check_ins, users, latest) = tokio::join!(
            self.sub_query(SUM_CRAWL_COUNT, self.store.sum_crawl_count(SPIDER_TASK)),
            self.sub_query(SUM_SPIDER_COUNT, self.store.count_tracers(&spider_alive)),
            self.sub_query(USER_BUCKET_RESULT, self.store.user_credit_histogram()),
            self.sub_query(CHECKED_IN_COUNT, self.store.count_check_ins()),
            self.sub_query(USER_COUNT, self.store.count_users()),
            self.sub_query(LATEST_PROGRESS_TASK, self.store.latest_started(PROGRESS_TASK)),
        );

        let mut failed = Vec::new();
        let data = DashboardData {
            sum_crawl_count: settle(crawl_sum, &mut failed),
            sum_spider_count: settle(alive, &mut failed),
            user_bucket_result: settle(buckets, &mut failed),
            checked_in_count: settle(check_ins, &mut failed),
            user_count: settle(users, &mut failed),
            latest_progress_task: settle(latest, &mut failed).flatten(),
            partial: !failed.is_empty(),
            failed,
        };
        debug!(partial = data.partial, "dashboard collected");
        data
    }

    async fn sub_query<T, F>(&self, metric: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        with_deadline(self.timeout, metric, fut)
            .await
            .map_err(|e| TracerError::Aggregation {
                metric,
                reason: e.to_string(),
            })
    }
}

fn settle<T>(result: Result<T>, failed: &mut Vec<&'static str>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "dashboard sub-query failed");
            if let TracerError::Aggregation { metric, .. } = e {
                failed.push(metric);
            }
            None
        }
    }
}
