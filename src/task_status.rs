//! # Task Status — Tracer States and Slice Selectors
//!
//! A tracer record is always in exactly one [`TaskStatus`]. Tasks drive their
//! own transitions; this crate only classifies and filters by the current
//! value.
//!
//! ```text
//!            ┌──────────► Finished
//!   Alive ───┤
//!            └──────────► Failed
//! ```
//!
//! Spider slices are requested either for every record of the class or only
//! for the running ones, selected by [`SpiderTaskMode`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Task family tags written by the crawler workers.
pub const SPIDER_TASK: &str = "SpiderTask";
pub const PROGRESS_TASK: &str = "ProgressTask";
pub const EXISTS_TASK: &str = "ExistsTask";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// The task is currently executing.
    Alive,
    Finished,
    Failed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Alive, TaskStatus::Finished, TaskStatus::Failed];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Alive => "alive",
            TaskStatus::Finished => "finished",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Finished | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown task status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alive" => Ok(TaskStatus::Alive),
            "finished" => Ok(TaskStatus::Finished),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Lets `sqlx::FromRow` decode the `status` text column straight into the enum.
impl TryFrom<String> for TaskStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Which spider tasks a slice request wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpiderTaskMode {
    #[default]
    GetAll,
    GetRunning,
}

impl SpiderTaskMode {
    /// Parse a caller-supplied mode.
    ///
    /// Accepts `all`/`running` and the legacy numeric codes `0`/`1`.
    /// Anything else, including a missing value, selects [`SpiderTaskMode::GetAll`].
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("running") | Some("1") => SpiderTaskMode::GetRunning,
            Some("all") | Some("0") | None => SpiderTaskMode::GetAll,
            Some(other) => {
                debug!(mode = other, "unrecognized spider task mode, falling back to all");
                SpiderTaskMode::GetAll
            }
        }
    }

    /// Status filter implied by the mode.
    pub fn status_filter(self) -> Option<TaskStatus> {
        match self {
            SpiderTaskMode::GetAll => None,
            SpiderTaskMode::GetRunning => Some(TaskStatus::Alive),
        }
    }
}
