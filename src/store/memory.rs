//! In-process document and queue stores.
//!
//! Back `serve --in-memory` and the test suites. Both stores can be told to
//! fail or stall a given operation, which is how partial dashboard results and
//! timeouts are exercised without a real database.

use super::{DocumentStore, QueueStore, TracerFilter, TracerRecord};
use crate::error::{Result, TracerError};
use crate::histogram::{build_histogram, CreditBucket};
use crate::task_status::TaskStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Store operations that can be faulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    FindTracers,
    CountTracers,
    SumCrawlCount,
    LatestStarted,
    UserHistogram,
    CountUsers,
    CountCheckIns,
    QueueLength,
    Ping,
}

#[derive(Default)]
struct Faults {
    failing: HashSet<StoreOp>,
    delays: HashMap<StoreOp, Duration>,
}

impl Faults {
    async fn gate(faults: &Mutex<Faults>, op: StoreOp) -> Result<()> {
        let (fail, delay) = {
            let f = lock_or_recover(faults);
            (f.failing.contains(&op), f.delays.get(&op).copied())
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(TracerError::StoreUnavailable(format!(
                "injected failure: {op:?}"
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
struct Documents {
    tracers: Vec<TracerRecord>,
    users: Vec<Option<i64>>,
    check_ins: i64,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: Mutex<Documents>,
    faults: Mutex<Faults>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tracer record and return its id.
    pub fn insert_tracer(
        &self,
        class_name: &str,
        status: TaskStatus,
        crawl_count: i64,
        start_time: DateTime<Utc>,
        update_time: DateTime<Utc>,
    ) -> i64 {
        let mut docs = lock_or_recover(&self.docs);
        docs.next_id += 1;
        let id = docs.next_id;
        docs.tracers.push(TracerRecord {
            id,
            class_name: class_name.to_string(),
            status,
            crawl_count,
            start_time,
            update_time,
        });
        id
    }

    pub fn insert_user(&self, exp: Option<i64>) {
        lock_or_recover(&self.docs).users.push(exp);
    }

    pub fn insert_check_in(&self) {
        lock_or_recover(&self.docs).check_ins += 1;
    }

    pub fn fail(&self, op: StoreOp) {
        lock_or_recover(&self.faults).failing.insert(op);
    }

    pub fn delay(&self, op: StoreOp, by: Duration) {
        lock_or_recover(&self.faults).delays.insert(op, by);
    }

    pub fn heal(&self) {
        *lock_or_recover(&self.faults) = Faults::default();
    }

    fn matching(&self, filter: &TracerFilter) -> Vec<TracerRecord> {
        let docs = lock_or_recover(&self.docs);
        docs.tracers
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_tracers(
        &self,
        filter: &TracerFilter,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<TracerRecord>> {
        Faults::gate(&self.faults, StoreOp::FindTracers).await?;
        let mut rows = self.matching(filter);
        rows.sort_by(|a, b| {
            b.update_time
                .cmp(&a.update_time)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(rows
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_tracers(&self, filter: &TracerFilter) -> Result<i64> {
        Faults::gate(&self.faults, StoreOp::CountTracers).await?;
        Ok(self.matching(filter).len() as i64)
    }

    async fn sum_crawl_count(&self, class_name: &str) -> Result<i64> {
        Faults::gate(&self.faults, StoreOp::SumCrawlCount).await?;
        Ok(self
            .matching(&TracerFilter::class(class_name))
            .iter()
            .map(|r| r.crawl_count)
            .sum())
    }

    async fn latest_started(&self, class_name: &str) -> Result<Option<TracerRecord>> {
        Faults::gate(&self.faults, StoreOp::LatestStarted).await?;
        Ok(self
            .matching(&TracerFilter::class(class_name))
            .into_iter()
            .max_by(|a, b| {
                a.start_time
                    .cmp(&b.start_time)
                    .then_with(|| a.id.cmp(&b.id))
            }))
    }

    async fn user_credit_histogram(&self) -> Result<Vec<CreditBucket>> {
        Faults::gate(&self.faults, StoreOp::UserHistogram).await?;
        let users = lock_or_recover(&self.docs).users.clone();
        Ok(build_histogram(users))
    }

    async fn count_users(&self) -> Result<i64> {
        Faults::gate(&self.faults, StoreOp::CountUsers).await?;
        Ok(lock_or_recover(&self.docs).users.len() as i64)
    }

    async fn count_check_ins(&self) -> Result<i64> {
        Faults::gate(&self.faults, StoreOp::CountCheckIns).await?;
        Ok(lock_or_recover(&self.docs).check_ins)
    }

    async fn ping(&self) -> Result<()> {
        Faults::gate(&self.faults, StoreOp::Ping).await
    }
}

#[derive(Default)]
pub struct MemoryQueueStore {
    lengths: Mutex<HashMap<String, u64>>,
    faults: Mutex<Faults>,
}

impl MemoryQueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_length(&self, queue: &str, length: u64) {
        lock_or_recover(&self.lengths).insert(queue.to_string(), length);
    }

    pub fn fail(&self, op: StoreOp) {
        lock_or_recover(&self.faults).failing.insert(op);
    }

    pub fn delay(&self, op: StoreOp, by: Duration) {
        lock_or_recover(&self.faults).delays.insert(op, by);
    }
}

#[async_trait]
impl QueueStore for MemoryQueueStore {
    async fn queue_length(&self, queue: &str) -> Result<u64> {
        Faults::gate(&self.faults, StoreOp::QueueLength).await?;
        Ok(lock_or_recover(&self.lengths)
            .get(queue)
            .copied()
            .unwrap_or(0))
    }

    async fn ping(&self) -> Result<()> {
        Faults::gate(&self.faults, StoreOp::Ping).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[tokio::test]
    async fn find_sorts_by_update_time_then_id() {
        let store = MemoryDocumentStore::new();
        let a = store.insert_tracer("SpiderTask", TaskStatus::Alive, 1, at(0), at(10));
        let b = store.insert_tracer("SpiderTask", TaskStatus::Alive, 1, at(0), at(30));
        let c = store.insert_tracer("SpiderTask", TaskStatus::Alive, 1, at(0), at(10));

        let rows = store
            .find_tracers(&TracerFilter::class("SpiderTask"), 0, 10)
            .await
            .unwrap();
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![b, c, a]);
    }

    #[tokio::test]
    async fn find_applies_offset_and_limit() {
        let store = MemoryDocumentStore::new();
        for i in 0..5 {
            store.insert_tracer("ExistsTask", TaskStatus::Finished, 0, at(0), at(i));
        }
        let rows = store
            .find_tracers(&TracerFilter::class("ExistsTask"), 3, 10)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].update_time, at(1));
    }

    #[tokio::test]
    async fn latest_started_picks_max_start_time() {
        let store = MemoryDocumentStore::new();
        store.insert_tracer("ProgressTask", TaskStatus::Finished, 0, at(5), at(100));
        let newest = store.insert_tracer("ProgressTask", TaskStatus::Alive, 0, at(50), at(60));
        store.insert_tracer("SpiderTask", TaskStatus::Alive, 0, at(500), at(500));

        let latest = store.latest_started("ProgressTask").await.unwrap().unwrap();
        assert_eq!(latest.id, newest);
    }

    #[tokio::test]
    async fn injected_failure_surfaces_as_unavailable() {
        let store = MemoryDocumentStore::new();
        store.fail(StoreOp::CountUsers);
        assert!(matches!(
            store.count_users().await,
            Err(TracerError::StoreUnavailable(_))
        ));
        store.heal();
        assert_eq!(store.count_users().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unknown_queue_has_zero_length() {
        let queues = MemoryQueueStore::new();
        queues.set_length("a", 4);
        assert_eq!(queues.queue_length("a").await.unwrap(), 4);
        assert_eq!(queues.queue_length("b").await.unwrap(), 0);
    }
}
