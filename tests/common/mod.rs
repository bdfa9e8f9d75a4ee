//! Shared test helpers for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use crawlwatch::config::Settings;
use crawlwatch::store::memory::{MemoryDocumentStore, MemoryQueueStore};
use std::sync::{Arc, Once};

/// Returns the test database URL from the `TEST_DATABASE_URL` environment variable.
/// Panics if the variable is not set.
pub fn test_db_url() -> String {
    std::env::var("TEST_DATABASE_URL")
        .expect("TEST_DATABASE_URL must be set for integration tests")
}

/// Returns true if the test database URL is configured.
pub fn has_test_db() -> bool {
    std::env::var("TEST_DATABASE_URL").is_ok()
}

pub fn test_redis_url() -> String {
    std::env::var("TEST_REDIS_URL").expect("TEST_REDIS_URL must be set for integration tests")
}

pub fn has_test_redis() -> bool {
    std::env::var("TEST_REDIS_URL").is_ok()
}

/// Fixed instant offset by `secs`, so orderings in assertions are obvious.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

/// Handles to the in-process stores behind a test router.
pub struct MemoryApp {
    pub router: axum::Router,
    pub documents: Arc<MemoryDocumentStore>,
    pub queues: Arc<MemoryQueueStore>,
}

/// Build the full router over fresh in-process stores.
pub fn memory_app() -> MemoryApp {
    memory_app_with(Settings::default())
}

pub fn memory_app_with(settings: Settings) -> MemoryApp {
    let documents = Arc::new(MemoryDocumentStore::new());
    let queues = Arc::new(MemoryQueueStore::new());
    let state = crawlwatch::dashboard::AppState::new(documents.clone(), queues.clone(), &settings);
    MemoryApp {
        router: crawlwatch::dashboard::build_router(state),
        documents,
        queues,
    }
}

/// One-time schema initialization.
static SCHEMA_INIT: Once = Once::new();

/// Ensure the test database schema is set up (runs migrations once per test suite).
pub fn ensure_schema() {
    SCHEMA_INIT.call_once(|| {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let pool = sqlx::PgPool::connect(&test_db_url()).await.unwrap();
            let sql = std::fs::read_to_string("migrations/001_tracer.sql").unwrap();
            sqlx::raw_sql(&sql).execute(&pool).await.unwrap();
        });
    });
}

/// Connect to the test database with empty tracer, users and check_in tables.
pub async fn setup_test_db() -> crawlwatch::db::Database {
    ensure_schema();
    let db = crawlwatch::db::Database::connect(&test_db_url(), 2)
        .await
        .expect("Failed to connect to test database");
    sqlx::raw_sql("TRUNCATE TABLE tracer, users, check_in RESTART IDENTITY")
        .execute(db.pool())
        .await
        .unwrap();
    db
}

pub async fn insert_tracer(
    pool: &sqlx::PgPool,
    class_name: &str,
    status: &str,
    crawl_count: i64,
    start_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
) -> i64 {
    sqlx::query_scalar(
        "INSERT INTO tracer (class_name, status, crawl_count, start_time, update_time)
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(class_name)
    .bind(status)
    .bind(crawl_count)
    .bind(start_time)
    .bind(update_time)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn insert_user(pool: &sqlx::PgPool, exp: Option<i64>) {
    sqlx::query("INSERT INTO users (exp) VALUES ($1)")
        .bind(exp)
        .execute(pool)
        .await
        .unwrap();
}
