//! # crawlwatch — Task Tracing for Background Crawl Jobs
//!
//! Crawler workers record every task they run as a *tracer* record (class,
//! status, crawl count, start/update time) and pull work from Redis queues.
//! This crate reads those records back for operators:
//!
//! - [`queue`] — depth of the author and video crawl queues
//! - [`repository`] — paginated, time-ordered tracer slices
//! - [`task_status`] — tracer states and the all/running selector
//! - [`aggregator`] — the composite dashboard payload
//! - [`service`] — the façade tying them together
//! - [`dashboard`] — the Axum HTTP surface
//!
//! Stores are injected through the traits in [`store`]; [`db`] provides the
//! PostgreSQL implementation and [`queue::RedisQueue`] the Redis one.

pub mod aggregator;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod histogram;
pub mod prom_metrics;
pub mod queue;
pub mod repository;
pub mod service;
pub mod store;
pub mod task_status;

pub use error::{Result, TracerError};
