//! # Tracer Repository — Typed Queries over Tracer Records
//!
//! Read-only query surface over the `tracer` collection:
//!
//! - [`TracerRepository::find_by_class`] — one class, every status
//! - [`TracerRepository::find_by_class_and_status`] — one class, one status
//! - [`TracerRepository::count_by_class_and_status`]
//!
//! Pages are offset-based (`offset = page * page_size`) and always ordered by
//! `update_time` descending. `has_next` is derived by asking the store for one
//! row more than the page holds.

use crate::error::{Result, TracerError};
use crate::store::{with_deadline, DocumentStore, TracerFilter, TracerRecord};
use crate::task_status::TaskStatus;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Validated zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    page_size: i64,
}

impl Pagination {
    /// `page` must be ≥ 0 and `page_size` ≥ 1, and the resulting offset must fit in an `i64`.
    pub fn new(page: i64, page_size: i64) -> Result<Self> {
        let invalid = TracerError::InvalidPagination { page, page_size };
        if page < 0 || page_size < 1 {
            return Err(invalid);
        }
        if page.checked_mul(page_size).is_none() {
            return Err(invalid);
        }
        Ok(Pagination { page, page_size })
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        self.page * self.page_size
    }
}

/// One slice of an ordered tracer result set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TracerPage {
    pub content: Vec<TracerRecord>,
    pub page: i64,
    pub page_size: i64,
    pub has_next: bool,
}

pub struct TracerRepository {
    store: Arc<dyn DocumentStore>,
    timeout: Duration,
}

impl TracerRepository {
    pub fn new(store: Arc<dyn DocumentStore>, timeout: Duration) -> Self {
        TracerRepository { store, timeout }
    }

    /// Records of `class_name` regardless of status, newest update first.
    pub async fn find_by_class(&self, class_name: &str, page: Pagination) -> Result<TracerPage> {
        self.find(&TracerFilter::class(class_name), page).await
    }

    pub async fn find_by_class_and_status(
        &self,
        class_name: &str,
        status: TaskStatus,
        page: Pagination,
    ) -> Result<TracerPage> {
        self.find(&TracerFilter::class_and_status(class_name, status), page)
            .await
    }

    pub async fn count_by_class_and_status(
        &self,
        class_name: &str,
        status: TaskStatus,
    ) -> Result<i64> {
        let filter = TracerFilter::class_and_status(class_name, status);
        with_deadline(self.timeout, "tracer count", self.store.count_tracers(&filter)).await
    }

    async fn find(&self, filter: &TracerFilter, page: Pagination) -> Result<TracerPage> {
        // One extra row tells us whether another page exists.
        let limit = page.page_size().saturating_add(1);
        let mut content = with_deadline(
            self.timeout,
            "tracer find",
            self.store.find_tracers(filter, page.offset(), limit),
        )
        .await?;
        let has_next = content.len() as i64 > page.page_size();
        content.truncate(page.page_size() as usize);
        Ok(TracerPage {
            content,
            page: page.page(),
            page_size: page.page_size(),
            has_next,
        })
    }
}
