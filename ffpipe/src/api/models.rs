//! API request and response models (DTOs).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::encoder::options::{OverlayOptions, ThumbnailOptions};
use crate::jobs::{Job, PipelineOutcome};

/// Overall status tag on pipeline and job responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// What a pipeline endpoint returns.
///
/// `status` is derived from whether `errors` is non-empty; the job snapshot
/// may lag behind for long-lived jobs, so clients re-query the job surface.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job: Option<Job>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    pub status: ResponseStatus,
}

impl From<PipelineOutcome> for PipelineResponse {
    fn from(outcome: PipelineOutcome) -> Self {
        let status = if outcome.errors.is_empty() {
            ResponseStatus::Success
        } else {
            ResponseStatus::Error
        };
        Self {
            job: outcome.job,
            command: outcome.command,
            errors: outcome.errors,
            status,
        }
    }
}

/// Single-job envelope for the job query surface.
#[derive(Debug, Clone, Serialize)]
pub struct JobResponse {
    pub job: Job,
    pub status: ResponseStatus,
}

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        Self {
            job,
            status: ResponseStatus::Success,
        }
    }
}

/// Multi-job envelope for list and kill-all responses.
#[derive(Debug, Clone, Serialize)]
pub struct JobsResponse {
    pub jobs: Vec<Job>,
    pub status: ResponseStatus,
}

impl From<Vec<Job>> for JobsResponse {
    fn from(jobs: Vec<Job>) -> Self {
        Self {
            jobs,
            status: ResponseStatus::Success,
        }
    }
}

/// Body of a pipeline request: one input, one output, optional extras.
///
/// Each endpoint instantiates this with the input/output pair its path
/// names, so bodies never need a discriminator field.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeRequest<I, O> {
    pub input: I,
    pub output: O,
    #[serde(default)]
    pub overlay: OverlayOptions,
    #[serde(default)]
    pub thumbnail: ThumbnailOptions,
}

/// Greeting body for the hello route.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub data: String,
}

/// Server time report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeResponse {
    pub datetime: DateTime<Utc>,
    pub date: String,
    pub time: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub components: Vec<ComponentHealth>,
}

/// Health of one service component.
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tag_is_derived_from_errors() {
        let ok: PipelineResponse = PipelineOutcome {
            job: None,
            command: Some("ffmpeg".to_string()),
            errors: vec![],
        }
        .into();
        assert_eq!(ok.status, ResponseStatus::Success);

        let failed: PipelineResponse = PipelineOutcome {
            job: None,
            command: None,
            errors: vec!["boom".to_string()],
        }
        .into();
        assert_eq!(failed.status, ResponseStatus::Error);
    }
}
