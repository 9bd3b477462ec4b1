//! Job model.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::client::CfClient;
use crate::error::{ApiError, Result};
use crate::models::common::{resource_path, Links};
use crate::traits::Get;

const JOBS: &str = "/v3/jobs";

/// A platform job tracking an asynchronous operation such as a delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub guid: String,

    /// What the job does, e.g. `app.delete`.
    #[serde(default)]
    pub operation: String,

    pub state: JobState,

    /// Errors reported by a FAILED job.
    #[serde(default)]
    pub errors: Vec<ApiError>,
    #[serde(default)]
    pub warnings: Vec<JobWarning>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub links: Links,
}

/// Job lifecycle. `PROCESSING` and `POLLING` are non-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Processing,
    Polling,
    Complete,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Complete | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JobState::Processing => "PROCESSING",
            JobState::Polling => "POLLING",
            JobState::Complete => "COMPLETE",
            JobState::Failed => "FAILED",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobWarning {
    pub detail: String,
}

#[async_trait]
impl Get for Job {
    type Id = String;

    async fn get(client: &CfClient, guid: String) -> Result<Self> {
        client.get(&resource_path(JOBS, &guid)).await
    }
}
