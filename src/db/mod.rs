//! # Database — PostgreSQL Document Store
//!
//! Read-only access to the records the crawler workers write, via
//! `sqlx::PgPool`.
//!
//! ## Schema
//!
//! - `tracer`: class_name, status, crawl_count, start_time, update_time
//! - `users`: exp (credit; NULL when the user never checked in)
//! - `check_in`: one row per check-in
//!
//! See `migrations/001_tracer.sql`.
//!
//! ## Module Structure
//!
//! - [`tracers`] — paginated tracer finds, counts, crawl sum, latest record
//! - [`users`] — credit histogram and user / check-in counts

mod tracers;
mod users;

use crate::error::Result;
use crate::histogram::CreditBucket;
use crate::store::{DocumentStore, TracerFilter, TracerRecord};
use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Connect to PostgreSQL using the provided database URL.
    ///
    /// Parses the URL by hand so percent-encoded usernames and passwords
    /// (poolers that put a project ref in the username) survive intact.
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let url = url::Url::parse(database_url).context("invalid database URL")?;
        let username = urlencoding::decode(url.username())?.into_owned();
        let password = url
            .password()
            .map(|p| urlencoding::decode(p).map(|s| s.into_owned()))
            .transpose()?;
        let mut opts = PgConnectOptions::new()
            .host(url.host_str().unwrap_or("localhost"))
            .port(url.port().unwrap_or(5432))
            .database(url.path().trim_start_matches('/'))
            .username(&username)
            .statement_cache_capacity(0);
        if let Some(ref pw) = password {
            opts = opts.password(pw);
        }
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(opts)
            .await
            .context("failed to connect to PostgreSQL")?;
        Ok(Database { pool })
    }

    /// Wrap an existing pool (tests, embedding).
    pub fn from_pool(pool: PgPool) -> Self {
        Database { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Execute `SELECT 1` to verify connectivity.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for Database {
    async fn find_tracers(
        &self,
        filter: &TracerFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<TracerRecord>> {
        self.tracer_page(filter, offset, limit).await
    }

    async fn count_tracers(&self, filter: &TracerFilter) -> Result<i64> {
        self.tracer_count(filter).await
    }

    async fn sum_crawl_count(&self, class_name: &str) -> Result<i64> {
        self.tracer_crawl_sum(class_name).await
    }

    async fn latest_started(&self, class_name: &str) -> Result<Option<TracerRecord>> {
        self.latest_tracer_by_start(class_name).await
    }

    async fn user_credit_histogram(&self) -> Result<Vec<CreditBucket>> {
        self.user_exp_histogram().await
    }

    async fn count_users(&self) -> Result<i64> {
        self.user_count().await
    }

    async fn count_check_ins(&self) -> Result<i64> {
        self.check_in_count().await
    }

    async fn ping(&self) -> Result<()> {
        self.health_check().await
    }
}
