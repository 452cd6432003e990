//! The job registry: the authoritative in-memory table of job records.
//!
//! Pure bookkeeping with no knowledge of encoding or processes. Process
//! termination lives in the supervisor; together they enforce the
//! one-running-job-per-key invariant.

use std::path::PathBuf;

use chrono::Utc;
use indexmap::IndexMap;
use parking_lot::RwLock;

use super::job::{Job, JobId, JobStatus};
use crate::encoder::{EncodeProgress, PipelineOptions};
use crate::error::{Error, Result};

/// Fields merged into a job by [`JobRegistry::update`].
///
/// `None` fields are left untouched; the whole merge is applied under one
/// lock so concurrent callers never observe a partial update.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub command: Option<String>,
    pub pid: Option<u32>,
    pub options: Option<PipelineOptions>,
    pub progress: Option<EncodeProgress>,
    pub error: Option<String>,
    pub thumbnail_path: Option<PathBuf>,
}

/// Shared table of job records, insertion-ordered.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<IndexMap<JobId, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new running job record with a fresh id.
    ///
    /// The caller is responsible for having terminated any previous process
    /// on `key` first; the registry does not enforce key exclusivity itself.
    pub fn start(
        &self,
        key: impl Into<String>,
        description: impl Into<String>,
        tags: Vec<String>,
    ) -> Job {
        let key = key.into();
        let job = Job {
            job_id: uuid::Uuid::new_v4().to_string(),
            name: key.clone(),
            key,
            description: description.into(),
            tags,
            status: JobStatus::Running,
            command: None,
            pid: None,
            options: None,
            progress: None,
            error: None,
            thumbnail_path: None,
            started_at: Utc::now(),
            ended_at: None,
            restart_count: 0,
        };
        self.jobs.write().insert(job.job_id.clone(), job.clone());
        job
    }

    /// Merge `update` into an existing record.
    pub fn update(&self, job_id: &str, update: JobUpdate) -> Result<Job> {
        let mut jobs = self.jobs.write();
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| Error::not_found("Job", job_id))?;

        if let Some(command) = update.command {
            job.command = Some(command);
        }
        if let Some(pid) = update.pid {
            job.pid = Some(pid);
        }
        if let Some(options) = update.options {
            job.options = Some(options);
        }
        if let Some(progress) = update.progress {
            job.progress = Some(progress);
        }
        if let Some(error) = update.error {
            job.error = Some(error);
        }
        if let Some(path) = update.thumbnail_path {
            job.thumbnail_path = Some(path);
        }
        Ok(job.clone())
    }

    /// Move a job to its terminal state, clearing the pid.
    ///
    /// Idempotent: ending an already-ended job returns the current record
    /// unchanged.
    pub fn end(&self, job_id: &str, is_error: bool) -> Result<Job> {
        let mut jobs = self.jobs.write();
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| Error::not_found("Job", job_id))?;

        if job.status.is_terminal() {
            return Ok(job.clone());
        }

        job.status = if is_error {
            JobStatus::Errored
        } else {
            JobStatus::Ended
        };
        job.pid = None;
        job.ended_at = Some(Utc::now());
        Ok(job.clone())
    }

    /// Re-enter the running state for an automatic restart.
    ///
    /// Keeps the job id and key, bumps the restart count, and clears the
    /// per-activation fields until the new start signal fills them in.
    pub fn restart(&self, job_id: &str) -> Result<Job> {
        let mut jobs = self.jobs.write();
        let job = jobs
            .get_mut(job_id)
            .ok_or_else(|| Error::not_found("Job", job_id))?;

        job.status = JobStatus::Running;
        job.pid = None;
        job.ended_at = None;
        job.error = None;
        job.restart_count += 1;
        Ok(job.clone())
    }

    /// Point lookup by job id.
    pub fn get(&self, job_id: &str) -> Result<Job> {
        self.jobs
            .read()
            .get(job_id)
            .cloned()
            .ok_or_else(|| Error::not_found("Job", job_id))
    }

    /// Most recent record for an exclusivity key.
    pub fn get_by_key(&self, key: &str) -> Result<Job> {
        self.jobs
            .read()
            .values()
            .rev()
            .find(|job| job.key == key)
            .cloned()
            .ok_or_else(|| Error::not_found("Job", key))
    }

    /// Snapshot of all known jobs in insertion order.
    pub fn get_all(&self) -> Vec<Job> {
        self.jobs.read().values().cloned().collect()
    }

    /// Snapshot of jobs currently running.
    pub fn running(&self) -> Vec<Job> {
        self.jobs
            .read()
            .values()
            .filter(|job| job.status == JobStatus::Running)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> Vec<String> {
        vec!["encode".to_string(), "rtp".to_string()]
    }

    #[test]
    fn start_then_get_returns_a_running_record_without_pid() {
        let registry = JobRegistry::new();
        let job = registry.start("cam1", "cam1 to RTP", tags());

        let fetched = registry.get(&job.job_id).unwrap();
        assert_eq!(fetched.status, JobStatus::Running);
        assert_eq!(fetched.key, "cam1");
        assert!(fetched.pid.is_none());
        assert!(fetched.command.is_none());
        assert!(fetched.ended_at.is_none());
    }

    #[test]
    fn update_merges_pid_and_command() {
        let registry = JobRegistry::new();
        let job = registry.start("cam1", "cam1 to RTP", tags());

        registry
            .update(
                &job.job_id,
                JobUpdate {
                    command: Some("ffmpeg -i cam1".to_string()),
                    pid: Some(4242),
                    ..JobUpdate::default()
                },
            )
            .unwrap();

        let fetched = registry.get(&job.job_id).unwrap();
        assert_eq!(fetched.pid, Some(4242));
        assert_eq!(fetched.command.as_deref(), Some("ffmpeg -i cam1"));
    }

    #[test]
    fn update_unknown_job_is_not_found() {
        let registry = JobRegistry::new();
        assert!(matches!(
            registry.update("nope", JobUpdate::default()),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn end_is_idempotent() {
        let registry = JobRegistry::new();
        let job = registry.start("cam1", "cam1 to RTP", tags());
        registry
            .update(
                &job.job_id,
                JobUpdate {
                    pid: Some(1),
                    ..JobUpdate::default()
                },
            )
            .unwrap();

        let first = registry.end(&job.job_id, false).unwrap();
        assert_eq!(first.status, JobStatus::Ended);
        assert!(first.pid.is_none());
        assert!(first.ended_at.is_some());

        let second = registry.end(&job.job_id, true).unwrap();
        assert_eq!(second.status, JobStatus::Ended);
        assert_eq!(second.ended_at, first.ended_at);
    }

    #[test]
    fn ended_at_set_iff_terminal() {
        let registry = JobRegistry::new();
        let job = registry.start("cam1", "cam1 to RTP", tags());
        assert!(registry.get(&job.job_id).unwrap().ended_at.is_none());

        registry.end(&job.job_id, true).unwrap();
        let fetched = registry.get(&job.job_id).unwrap();
        assert_eq!(fetched.status, JobStatus::Errored);
        assert!(fetched.ended_at.is_some());
    }

    #[test]
    fn restart_keeps_the_id_and_bumps_the_count() {
        let registry = JobRegistry::new();
        let job = registry.start("cam1", "cam1 to RTP", tags());
        registry.end(&job.job_id, true).unwrap();

        let restarted = registry.restart(&job.job_id).unwrap();
        assert_eq!(restarted.job_id, job.job_id);
        assert_eq!(restarted.status, JobStatus::Running);
        assert_eq!(restarted.restart_count, 1);
        assert!(restarted.ended_at.is_none());
        assert!(restarted.pid.is_none());
    }

    #[test]
    fn get_all_preserves_insertion_order() {
        let registry = JobRegistry::new();
        let first = registry.start("cam1", "a", tags());
        let second = registry.start("cam2", "b", tags());
        let third = registry.start("cam3", "c", tags());

        let ids: Vec<JobId> = registry.get_all().into_iter().map(|j| j.job_id).collect();
        assert_eq!(ids, vec![first.job_id, second.job_id, third.job_id]);
    }

    #[test]
    fn get_by_key_returns_the_newest_record() {
        let registry = JobRegistry::new();
        let old = registry.start("cam1", "first run", tags());
        registry.end(&old.job_id, false).unwrap();
        let new = registry.start("cam1", "second run", tags());

        assert_eq!(registry.get_by_key("cam1").unwrap().job_id, new.job_id);
        assert!(matches!(
            registry.get_by_key("cam9"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn running_filters_terminal_jobs() {
        let registry = JobRegistry::new();
        let a = registry.start("cam1", "a", tags());
        let _b = registry.start("cam2", "b", tags());
        registry.end(&a.job_id, false).unwrap();

        let running = registry.running();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].key, "cam2");
    }
}
