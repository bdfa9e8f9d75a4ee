//! # Queue Status — Crawl Queue Depth
//!
//! The crawler workers pull work from two Redis lists, one for author crawls
//! and one for video crawls. [`QueueStatusReporter`] reports how many items
//! are still waiting in each. It never modifies a queue.

use crate::error::Result;
use crate::store::{with_deadline, QueueStore};
use anyhow::Context;
use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Queue key names in the queue store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueNames {
    pub author: String,
    pub video: String,
}

impl Default for QueueNames {
    fn default() -> Self {
        QueueNames {
            author: "crawl:author:queue".to_string(),
            video: "crawl:video:queue".to_string(),
        }
    }
}

/// Payload of the queue status endpoints: `{"length": n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueLength {
    pub length: u64,
}

pub struct QueueStatusReporter {
    store: Arc<dyn QueueStore>,
    names: QueueNames,
    timeout: Duration,
}

impl QueueStatusReporter {
    pub fn new(store: Arc<dyn QueueStore>, names: QueueNames, timeout: Duration) -> Self {
        QueueStatusReporter {
            store,
            names,
            timeout,
        }
    }

    pub fn names(&self) -> &QueueNames {
        &self.names
    }

    pub async fn author_queue_length(&self) -> Result<QueueLength> {
        self.length_of(&self.names.author).await
    }

    pub async fn video_queue_length(&self) -> Result<QueueLength> {
        self.length_of(&self.names.video).await
    }

    async fn length_of(&self, queue: &str) -> Result<QueueLength> {
        let length = with_deadline(self.timeout, "queue length", self.store.queue_length(queue)).await?;
        debug!(queue, length, "queue depth");
        Ok(QueueLength { length })
    }
}

/// Redis-backed queue store. Queues are lists; depth is `LLEN`.
#[derive(Clone)]
pub struct RedisQueue {
    conn: redis::aio::ConnectionManager,
}

impl RedisQueue {
    pub async fn connect(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url).context("invalid Redis URL")?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .context("failed to connect to Redis")?;
        Ok(RedisQueue { conn })
    }
}

#[async_trait]
impl QueueStore for RedisQueue {
    async fn queue_length(&self, queue: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        let length: u64 = conn.llen(queue).await?;
        Ok(length)
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
