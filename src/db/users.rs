//! User and check-in aggregates.

use super::Database;
use crate::error::Result;
use crate::histogram::{bucket_case_sql, bucket_from_row, CreditBucket};

impl Database {
    /// Users grouped into credit buckets; the default bucket comes back as a
    /// `NULL` bucket and sorts last.
    pub async fn user_exp_histogram(&self) -> Result<Vec<CreditBucket>> {
        let sql = format!(
            "SELECT ({})::BIGINT AS bucket, COUNT(*) AS count
             FROM users
             GROUP BY bucket
             ORDER BY bucket ASC NULLS LAST",
            bucket_case_sql("exp")
        );
        let rows: Vec<(Option<i64>, i64)> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|(bucket, count)| bucket_from_row(bucket, count))
            .collect())
    }

    pub async fn user_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn check_in_count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM check_in")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
