//! # Prometheus Metrics — Exposition for Scraping
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `crawlwatch_http_request_duration_seconds` | Histogram | `method`, `path` | Request latency |
//! | `crawlwatch_queue_length` | Gauge | `queue` | Last observed crawl queue depth |
//! | `crawlwatch_dashboard_requests_total` | Counter | — | Dashboard payloads built |
//! | `crawlwatch_dashboard_subquery_failures_total` | Counter | `metric` | Failed dashboard sub-queries |
//!
//! Gauges are refreshed whenever a queue status request succeeds. The
//! `/metrics` endpoint renders the registry on each scrape.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct HttpLabel {
    pub method: String,
    pub path: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct QueueLabel {
    pub queue: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct MetricLabel {
    pub metric: String,
}

fn http_histogram() -> Histogram {
    Histogram::new(exponential_buckets(0.005, 2.0, 12))
}

/// Thread-safe metrics registry; every field is atomic and safe to update from
/// any task.
pub struct Metrics {
    pub registry: Registry,
    pub http_request_duration: Family<HttpLabel, Histogram, fn() -> Histogram>,
    pub queue_length: Family<QueueLabel, Gauge>,
    pub dashboard_requests: Counter,
    pub dashboard_subquery_failures: Family<MetricLabel, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_request_duration: Family<HttpLabel, Histogram, fn() -> Histogram> =
            Family::new_with_constructor(http_histogram);
        registry.register(
            "crawlwatch_http_request_duration_seconds",
            "HTTP request latency by method and normalized path",
            http_request_duration.clone(),
        );

        let queue_length = Family::<QueueLabel, Gauge>::default();
        registry.register(
            "crawlwatch_queue_length",
            "Last observed number of pending items per crawl queue",
            queue_length.clone(),
        );

        let dashboard_requests = Counter::default();
        registry.register(
            "crawlwatch_dashboard_requests",
            "Dashboard payloads built",
            dashboard_requests.clone(),
        );

        let dashboard_subquery_failures = Family::<MetricLabel, Counter>::default();
        registry.register(
            "crawlwatch_dashboard_subquery_failures",
            "Dashboard sub-queries that failed or timed out",
            dashboard_subquery_failures.clone(),
        );

        Self {
            registry,
            http_request_duration,
            queue_length,
            dashboard_requests,
            dashboard_subquery_failures,
        }
    }

    pub fn observe_queue(&self, queue: &str, length: u64) {
        self.queue_length
            .get_or_create(&QueueLabel {
                queue: queue.to_string(),
            })
            .set(i64::try_from(length).unwrap_or(i64::MAX));
    }

    pub fn observe_dashboard(&self, failed: &[&'static str]) {
        self.dashboard_requests.inc();
        for metric in failed {
            self.dashboard_subquery_failures
                .get_or_create(&MetricLabel {
                    metric: (*metric).to_string(),
                })
                .inc();
        }
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buf = String::new();
        if let Err(e) = encode(&mut buf, &self.registry) {
            tracing::error!(error = %e, "failed to encode metrics");
        }
        buf
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
