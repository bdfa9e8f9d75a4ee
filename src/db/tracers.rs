//! Tracer record queries.
//!
//! All reads hit the `tracer` table. Pages are ordered by `update_time DESC`
//! with `id DESC` as tie-breaker so repeated reads return identical pages.
//! An absent status filter is passed as `NULL` and short-circuits the
//! `status = $2` predicate.

use super::Database;
use crate::error::Result;
use crate::store::{TracerFilter, TracerRecord};
use crate::task_status::TaskStatus;

impl Database {
    /// One page of tracer records matching `filter`.
    pub async fn tracer_page(
        &self,
        filter: &TracerFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<TracerRecord>> {
        let rows = sqlx::query_as::<_, TracerRecord>(
            "SELECT id, class_name, status, crawl_count, start_time, update_time
             FROM tracer
             WHERE class_name = $1 AND ($2::TEXT IS NULL OR status = $2)
             ORDER BY update_time DESC, id DESC
             LIMIT $3 OFFSET $4",
        )
        .bind(&filter.class_name)
        .bind(filter.status.map(TaskStatus::as_str))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn tracer_count(&self, filter: &TracerFilter) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM tracer
             WHERE class_name = $1 AND ($2::TEXT IS NULL OR status = $2)",
        )
        .bind(&filter.class_name)
        .bind(filter.status.map(TaskStatus::as_str))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Sum of `crawl_count` across one class. `SUM` over BIGINT yields NUMERIC,
    /// hence the cast.
    pub async fn tracer_crawl_sum(&self, class_name: &str) -> Result<i64> {
        let sum: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(crawl_count), 0)::BIGINT FROM tracer WHERE class_name = $1",
        )
        .bind(class_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(sum)
    }

    pub async fn latest_tracer_by_start(&self, class_name: &str) -> Result<Option<TracerRecord>> {
        let row = sqlx::query_as::<_, TracerRecord>(
            "SELECT id, class_name, status, crawl_count, start_time, update_time
             FROM tracer
             WHERE class_name = $1
             ORDER BY start_time DESC, id DESC
             LIMIT 1",
        )
        .bind(class_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
