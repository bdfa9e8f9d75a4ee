//! Runtime settings.
//!
//! Defaults can be overridden by an optional TOML file (`--config`), and the
//! CLI flags / environment variables applied on top of that in `main`.
//!
//! ```toml
//! port = 7002
//! database_url = "postgres://crawl:secret@db/crawl"
//! redis_url = "redis://cache:6379/0"
//! query_timeout_ms = 2000
//! default_page_size = 20
//!
//! [queues]
//! author = "crawl:author:queue"
//! video = "crawl:video:queue"
//! ```

use crate::queue::QueueNames;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub port: u16,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub queues: QueueNames,
    /// Deadline applied to every individual store call.
    pub query_timeout_ms: u64,
    /// Page size used when a slice request omits `pageSize`.
    pub default_page_size: i64,
    pub max_connections: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port: 7002,
            database_url: None,
            redis_url: None,
            queues: QueueNames::default(),
            query_timeout_ms: 2_000,
            default_page_size: 20,
            max_connections: 4,
        }
    }
}

impl Settings {
    /// Load from `path` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                Self::from_toml_str(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => Settings::default(),
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.query_timeout_ms > 0, "query_timeout_ms must be positive");
        anyhow::ensure!(self.default_page_size > 0, "default_page_size must be positive");
        anyhow::ensure!(
            !self.queues.author.is_empty() && !self.queues.video.is_empty(),
            "queue names must not be empty"
        );
        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}
