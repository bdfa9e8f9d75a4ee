//! Property-based tests for credit bucketing and tracer pagination.
//!
//! No database or network access required; pagination properties run against
//! the in-process document store.
//!
//! ```bash
//! cargo test --test property_tests
//! PROPTEST_CASES=10000 cargo test --test property_tests
//! ```
//!
//! Each property is named `prop_<area>_<invariant>`.

mod common;

use common::at;
use crawlwatch::histogram::{bucket_for, build_histogram, BucketLabel, CREDIT_BOUNDARIES};
use crawlwatch::repository::{Pagination, TracerRepository};
use crawlwatch::store::memory::MemoryDocumentStore;
use crawlwatch::store::DocumentStore;
use crawlwatch::task_status::TaskStatus;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

// == Credit histogram ==========================================================

proptest! {
    /// A value lands in a bounded bucket exactly when it lies in
    /// `[0, 5000)`, and that bucket's range contains it.
    #[test]
    fn prop_bucket_contains_its_value(exp in -10_000i64..20_000) {
        match bucket_for(Some(exp)) {
            BucketLabel::LowerBound(lb) => {
                let idx = CREDIT_BOUNDARIES.iter().position(|b| *b == lb).unwrap();
                prop_assert!(idx + 1 < CREDIT_BOUNDARIES.len());
                prop_assert!(exp >= lb && exp < CREDIT_BOUNDARIES[idx + 1]);
            }
            BucketLabel::NotCheckedIn => {
                prop_assert!(exp < 0 || exp >= 5000);
            }
        }
    }

    /// Counts add up to the number of users and no bucket is listed twice.
    #[test]
    fn prop_histogram_is_exhaustive_and_disjoint(
        values in proptest::collection::vec(proptest::option::of(-500i64..8_000), 0..200)
    ) {
        let buckets = build_histogram(values.clone());
        let total: i64 = buckets.iter().map(|b| b.count).sum();
        prop_assert_eq!(total, values.len() as i64);

        let labels: HashSet<BucketLabel> = buckets.iter().map(|b| b.bucket_lower_bound).collect();
        prop_assert_eq!(labels.len(), buckets.len());
        prop_assert!(buckets.iter().all(|b| b.count > 0));
    }

    /// Bounded buckets come out ascending with the default bucket last.
    #[test]
    fn prop_histogram_is_ordered(
        values in proptest::collection::vec(proptest::option::of(-500i64..8_000), 1..100)
    ) {
        let buckets = build_histogram(values);
        for pair in buckets.windows(2) {
            prop_assert!(pair[0].bucket_lower_bound < pair[1].bucket_lower_bound);
        }
        if let Some(pos) = buckets.iter().position(|b| b.bucket_lower_bound == BucketLabel::NotCheckedIn) {
            prop_assert_eq!(pos, buckets.len() - 1);
        }
    }
}

// == Pagination ================================================================

proptest! {
    /// Walking every page yields each record once, newest update first, and
    /// `hasNext` is false exactly on the last non-empty page.
    #[test]
    fn prop_pages_partition_the_class(
        updates in proptest::collection::vec(0i64..50, 0..40),
        page_size in 1i64..8,
    ) {
        let store = Arc::new(MemoryDocumentStore::new());
        for u in &updates {
            store.insert_tracer("ExistsTask", TaskStatus::Finished, 0, at(0), at(*u));
        }
        store.insert_tracer("SpiderTask", TaskStatus::Alive, 0, at(0), at(0));
        let repo = TracerRepository::new(store, Duration::from_secs(1));
        let rt = runtime();

        let mut seen = Vec::new();
        let mut page = 0;
        loop {
            let slice = rt
                .block_on(repo.find_by_class("ExistsTask", Pagination::new(page, page_size).unwrap()))
                .unwrap();
            prop_assert!(slice.content.len() as i64 <= page_size);
            seen.extend(slice.content);
            if !slice.has_next {
                break;
            }
            page += 1;
        }

        prop_assert_eq!(seen.len(), updates.len());
        let ids: HashSet<i64> = seen.iter().map(|r| r.id).collect();
        prop_assert_eq!(ids.len(), seen.len());
        for pair in seen.windows(2) {
            prop_assert!(
                (pair[0].update_time, pair[0].id) > (pair[1].update_time, pair[1].id)
            );
        }
    }

    /// The filtered count agrees with the number of records a filtered walk
    /// returns.
    #[test]
    fn prop_count_matches_filtered_listing(
        statuses in proptest::collection::vec(0usize..3, 0..30)
    ) {
        let store = Arc::new(MemoryDocumentStore::new());
        for (i, s) in statuses.iter().enumerate() {
            store.insert_tracer("SpiderTask", TaskStatus::ALL[*s], 0, at(0), at(i as i64));
        }
        let repo = TracerRepository::new(store, Duration::from_secs(1));
        let rt = runtime();

        for status in TaskStatus::ALL {
            let count = rt
                .block_on(repo.count_by_class_and_status("SpiderTask", status))
                .unwrap();
            let listed = rt
                .block_on(repo.find_by_class_and_status(
                    "SpiderTask",
                    status,
                    Pagination::new(0, 100).unwrap(),
                ))
                .unwrap();
            prop_assert_eq!(count, listed.content.len() as i64);
            prop_assert!(listed.content.iter().all(|r| r.status == status));
        }
    }

    /// The spider crawl sum ignores every other class.
    #[test]
    fn prop_crawl_sum_matches_spider_records(
        records in proptest::collection::vec((any::<bool>(), 0i64..10_000), 0..30)
    ) {
        let store = MemoryDocumentStore::new();
        let mut expected = 0;
        for (is_spider, count) in &records {
            let class = if *is_spider { "SpiderTask" } else { "ProgressTask" };
            if *is_spider {
                expected += count;
            }
            store.insert_tracer(class, TaskStatus::Finished, *count, at(0), at(0));
        }
        let sum = runtime().block_on(store.sum_crawl_count("SpiderTask")).unwrap();
        prop_assert_eq!(sum, expected);
    }

    #[test]
    fn prop_negative_page_is_rejected(page in i64::MIN..0, page_size in 1i64..100) {
        prop_assert!(Pagination::new(page, page_size).is_err());
    }
}
