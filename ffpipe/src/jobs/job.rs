//! The job record: one supervised encoder run from start to terminal state.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::encoder::{EncodeProgress, PipelineOptions};

/// Opaque job identifier, assigned at creation and never reused.
pub type JobId = String;

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Ended,
    Errored,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ended | Self::Errored)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Running => "running",
            Self::Ended => "ended",
            Self::Errored => "errored",
        };
        write!(f, "{s}")
    }
}

/// One supervised encoder run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: JobId,
    /// Exclusivity key; at most one running job per key.
    pub key: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub status: JobStatus,
    /// Invocation reported once the process actually started.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// OS pid of the active process; present only while running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// Caller options, retained for restart and audit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<PipelineOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<EncodeProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Automatic restarts performed for this job since first creation.
    pub restart_count: u32,
}
