//! The process supervisor: owns one external encoder process per job and
//! translates its lifecycle signals into registry state transitions.
//!
//! Every state change flows through the activation's event channel — the
//! kill path cancels the activation and then waits for the same terminal
//! signal a natural exit would produce, so there is a single source of
//! truth for transitions. Activations carry a spawn sequence number; signals
//! from a superseded activation are dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::job::{Job, JobId};
use super::registry::{JobRegistry, JobUpdate};
use super::restart::is_recoverable;
use crate::config::AppConfig;
use crate::encoder::{
    CommandContext, EncodeCommand, EncodeEvent, EncodeHandle, EncoderRuntime, PipelineOptions,
    build_command,
};
use crate::error::Result;

/// Event channel depth per activation.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// What a pipeline request produced.
///
/// `job` is the current registry snapshot; long-lived jobs should be
/// re-queried rather than trusted from this response alone.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub job: Option<Job>,
    pub command: Option<String>,
    pub errors: Vec<String>,
}

impl PipelineOutcome {
    fn rejected(error: impl std::fmt::Display) -> Self {
        Self {
            job: None,
            command: None,
            errors: vec![error.to_string()],
        }
    }
}

/// One live activation for a key.
struct ActiveEncode {
    job_id: JobId,
    activation: u64,
    handle: Arc<EncodeHandle>,
    /// Latched when the activation's event loop has finished.
    done: CancellationToken,
}

/// Supervises encoder processes, one per exclusivity key.
pub struct ProcessSupervisor {
    registry: Arc<JobRegistry>,
    runtime: Arc<dyn EncoderRuntime>,
    config: Arc<AppConfig>,
    actives: DashMap<String, ActiveEncode>,
    /// Serializes stop/start sequences per key.
    key_locks: DashMap<String, Arc<Mutex<()>>>,
    activation_seq: AtomicU64,
}

impl ProcessSupervisor {
    pub fn new(
        registry: Arc<JobRegistry>,
        runtime: Arc<dyn EncoderRuntime>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            registry,
            runtime,
            config,
            actives: DashMap::new(),
            key_locks: DashMap::new(),
            activation_seq: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn runtime_available(&self) -> bool {
        self.runtime.is_available()
    }

    pub fn runtime_version(&self) -> Option<String> {
        self.runtime.version()
    }

    /// Start a pipeline, terminating any previous occupant of its key first.
    pub async fn start_pipeline(self: &Arc<Self>, options: PipelineOptions) -> PipelineOutcome {
        if let Err(e) = options.validate() {
            return PipelineOutcome::rejected(e);
        }

        let key = options.key();
        let lock = self.key_lock(&key);
        let _guard = lock.lock().await;

        self.stop_current(&key).await;

        let job = self
            .registry
            .start(&key, options.description(), options.tags());

        let command = match build_command(&options, &self.command_context(&job.job_id)) {
            Ok(command) => command,
            Err(e) => {
                return self.fail_before_spawn(&job.job_id, None, e.to_string());
            }
        };
        let rendered = command.rendered(&self.config.ffmpeg_path);

        let _ = self.registry.update(
            &job.job_id,
            JobUpdate {
                options: Some(options),
                thumbnail_path: command.thumbnail_path.clone(),
                ..JobUpdate::default()
            },
        );

        match self.spawn_activation(&key, &job.job_id, command).await {
            Ok(()) => PipelineOutcome {
                job: self.registry.get(&job.job_id).ok(),
                command: Some(rendered),
                errors: vec![],
            },
            Err(e) => self.fail_before_spawn(&job.job_id, Some(rendered), e.to_string()),
        }
    }

    /// Terminate one job's process, waiting briefly for the terminal signal.
    ///
    /// Returns the current snapshot; callers re-query if termination is
    /// still in flight when the wait elapses.
    pub async fn kill(&self, job_id: &str) -> Result<Job> {
        let job = self.registry.get(job_id)?;

        let Some((key, activation, handle, done)) = self.find_active(job_id) else {
            return Ok(job);
        };

        info!(job_id = %job_id, key = %key, "Kill requested");
        handle.cancel();
        if tokio::time::timeout(self.stop_wait(), done.cancelled())
            .await
            .is_err()
        {
            warn!(job_id = %job_id, "Termination still in flight after the grace period");
        }
        self.actives.remove_if(&key, |_, a| a.activation == activation);

        self.registry.get(job_id)
    }

    /// Terminate every running job and return the affected set afterwards.
    pub async fn kill_all(self: &Arc<Self>) -> Vec<Job> {
        let running = self.registry.running();

        let mut joins = tokio::task::JoinSet::new();
        for job in &running {
            let sup = Arc::clone(self);
            let job_id = job.job_id.clone();
            joins.spawn(async move {
                let _ = sup.kill(&job_id).await;
            });
        }
        while joins.join_next().await.is_some() {}

        running
            .iter()
            .filter_map(|job| self.registry.get(&job.job_id).ok())
            .collect()
    }

    fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        self.key_locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn command_context(&self, job_id: &str) -> CommandContext {
        CommandContext {
            job_id: job_id.to_string(),
            media_dir: self.config.media_dir(),
            output_dir: self.config.output_dir(),
            hls_dir: self.config.hls_dir(),
            thumbnail_dir: self.config.thumbnail_dir(),
        }
    }

    fn stop_wait(&self) -> Duration {
        self.config.stop_grace + Duration::from_secs(1)
    }

    /// Whether `activation` is still the one registered for `key`.
    fn is_current(&self, key: &str, activation: u64) -> bool {
        self.actives
            .get(key)
            .map(|a| a.activation == activation)
            .unwrap_or(false)
    }

    fn find_active(&self, job_id: &str) -> Option<(String, u64, Arc<EncodeHandle>, CancellationToken)> {
        self.actives.iter().find_map(|entry| {
            (entry.job_id == job_id).then(|| {
                (
                    entry.key().clone(),
                    entry.activation,
                    entry.handle.clone(),
                    entry.done.clone(),
                )
            })
        })
    }

    /// Stop the current occupant of `key` and wait for it to reach a
    /// terminal state. Called with the key lock held.
    async fn stop_current(&self, key: &str) {
        let Some((activation, handle, done)) = self
            .actives
            .get(key)
            .map(|a| (a.activation, a.handle.clone(), a.done.clone()))
        else {
            return;
        };

        info!(key = %key, "Terminating previous job before starting replacement");
        handle.cancel();
        if tokio::time::timeout(self.stop_wait(), done.cancelled())
            .await
            .is_err()
        {
            warn!(key = %key, "Previous job did not confirm termination in time");
        }
        self.actives.remove_if(key, |_, a| a.activation == activation);
    }

    /// Spawn the encoder and its event loop. Called with the key lock held.
    async fn spawn_activation(
        self: &Arc<Self>,
        key: &str,
        job_id: &str,
        command: EncodeCommand,
    ) -> Result<()> {
        let activation = self.activation_seq.fetch_add(1, Ordering::SeqCst);
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let handle = Arc::new(EncodeHandle::new(job_id, key, activation, command, event_tx));
        let done = CancellationToken::new();

        self.actives.insert(
            key.to_string(),
            ActiveEncode {
                job_id: job_id.to_string(),
                activation,
                handle: handle.clone(),
                done: done.clone(),
            },
        );

        if let Err(e) = self.runtime.start(handle.clone()).await {
            self.actives.remove_if(key, |_, a| a.activation == activation);
            return Err(e);
        }

        tokio::spawn(run_event_loop(
            Arc::clone(self),
            key.to_string(),
            job_id.to_string(),
            activation,
            event_rx,
            handle,
            done,
        ));
        Ok(())
    }

    fn fail_before_spawn(
        &self,
        job_id: &str,
        command: Option<String>,
        message: String,
    ) -> PipelineOutcome {
        error!(job_id = %job_id, "Pipeline failed to start: {message}");
        let _ = self.registry.update(
            job_id,
            JobUpdate {
                error: Some(message.clone()),
                ..JobUpdate::default()
            },
        );
        let _ = self.registry.end(job_id, true);
        PipelineOutcome {
            job: self.registry.get(job_id).ok(),
            command,
            errors: vec![message],
        }
    }

    /// Handle a terminal error signal: stop requests end cleanly,
    /// recoverable faults restart, everything else is fatal.
    async fn handle_error(
        self: &Arc<Self>,
        key: &str,
        job_id: &str,
        activation: u64,
        handle: &EncodeHandle,
        message: String,
    ) {
        if handle.is_cancelled() {
            info!(job_id = %job_id, "Encoder stopped on request");
            let _ = self.registry.end(job_id, false);
            self.actives.remove_if(key, |_, a| a.activation == activation);
            return;
        }

        let _ = self.registry.update(
            job_id,
            JobUpdate {
                error: Some(message.clone()),
                ..JobUpdate::default()
            },
        );
        let _ = self.registry.end(job_id, true);

        let performed = self
            .registry
            .get(job_id)
            .map(|job| job.restart_count)
            .unwrap_or(0);

        if is_recoverable(&message) {
            if self.config.restart.should_restart(performed) {
                info!(
                    job_id = %job_id,
                    attempt = performed + 1,
                    "Recoverable encoder fault, restarting: {message}"
                );
                tokio::spawn(restart_job(
                    Arc::clone(self),
                    key.to_string(),
                    job_id.to_string(),
                    activation,
                    performed + 1,
                ));
                return;
            }
            warn!(
                job_id = %job_id,
                restarts = performed,
                "Restart limit reached, leaving job errored"
            );
        } else {
            error!(job_id = %job_id, "Encoder failed: {message}");
        }
        self.actives.remove_if(key, |_, a| a.activation == activation);
    }
}

/// Per-activation event loop: the only writer of this job's transitions.
async fn run_event_loop(
    sup: Arc<ProcessSupervisor>,
    key: String,
    job_id: String,
    activation: u64,
    mut events: mpsc::Receiver<EncodeEvent>,
    handle: Arc<EncodeHandle>,
    done: CancellationToken,
) {
    while let Some(event) = events.recv().await {
        if !sup.is_current(&key, activation) {
            debug!(job_id = %job_id, activation, "Dropping signal from superseded activation");
            break;
        }
        match event {
            EncodeEvent::Started { invocation, pid } => {
                info!(job_id = %job_id, pid, "Encoder running");
                let _ = sup.registry.update(
                    &job_id,
                    JobUpdate {
                        command: Some(invocation),
                        pid: Some(pid),
                        ..JobUpdate::default()
                    },
                );
            }
            EncodeEvent::Progress(progress) => {
                let _ = sup.registry.update(
                    &job_id,
                    JobUpdate {
                        progress: Some(progress),
                        ..JobUpdate::default()
                    },
                );
            }
            EncodeEvent::StderrLine(line) => {
                debug!(job_id = %job_id, "ffmpeg: {line}");
            }
            EncodeEvent::Ended => {
                info!(job_id = %job_id, "Encoder finished");
                let _ = sup.registry.end(&job_id, false);
                sup.actives.remove_if(&key, |_, a| a.activation == activation);
                break;
            }
            EncodeEvent::Errored { message } => {
                sup.handle_error(&key, &job_id, activation, &handle, message)
                    .await;
                break;
            }
        }
    }
    done.cancel();
}

/// Delayed restart of a job under its original key and id.
///
/// Returns a boxed `Send` future so the auto-trait check doesn't have to
/// reason through the opaque `async fn` cycle this sits in
/// (restart_job → spawn_activation → run_event_loop → handle_error).
fn restart_job(
    sup: Arc<ProcessSupervisor>,
    key: String,
    job_id: String,
    old_activation: u64,
    attempt: u32,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
    Box::pin(async move {
    let delay = sup.config.restart.delay_for_attempt(attempt);
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let lock = sup.key_lock(&key);
    let _guard = lock.lock().await;

    // A kill or a newer pipeline request claimed the key meanwhile.
    if sup
        .actives
        .remove_if(&key, |_, a| a.activation == old_activation)
        .is_none()
    {
        debug!(job_id = %job_id, "Restart superseded, leaving job terminal");
        return;
    }

    let Ok(job) = sup.registry.restart(&job_id) else {
        return;
    };
    let Some(options) = job.options else {
        error!(job_id = %job_id, "No retained options, cannot restart");
        let _ = sup.registry.end(&job_id, true);
        return;
    };

    let command = match build_command(&options, &sup.command_context(&job_id)) {
        Ok(command) => command,
        Err(e) => {
            let _ = sup.fail_before_spawn(&job_id, None, e.to_string());
            return;
        }
    };

    match sup.spawn_activation(&key, &job_id, command).await {
        Ok(()) => info!(
            job_id = %job_id,
            restart_count = job.restart_count,
            "Encoder restarted"
        ),
        Err(e) => {
            let _ = sup.fail_before_spawn(&job_id, None, e.to_string());
        }
    }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::options::{
        DecklinkInput, EncodeSettings, OverlayOptions, RtpOutput, ThumbnailOptions,
    };
    use crate::encoder::{InputSpec, OutputSpec};
    use crate::jobs::job::JobStatus;
    use crate::jobs::restart::RestartPolicy;
    use async_trait::async_trait;
    use parking_lot::Mutex as SyncMutex;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicU32;

    /// Scripted stand-in for the FFmpeg runtime. Each activation pops the
    /// next script; the default runs until cancelled.
    #[derive(Debug, Clone)]
    enum Script {
        RunUntilCancelled,
        EndAfterStart,
        FailAfterStart(&'static str),
        FailToSpawn,
    }

    struct FakeRuntime {
        scripts: SyncMutex<VecDeque<Script>>,
        spawned: AtomicU32,
    }

    impl FakeRuntime {
        fn new(scripts: Vec<Script>) -> Arc<Self> {
            Arc::new(Self {
                scripts: SyncMutex::new(scripts.into()),
                spawned: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl EncoderRuntime for FakeRuntime {
        async fn start(&self, handle: Arc<EncodeHandle>) -> Result<()> {
            let script = self
                .scripts
                .lock()
                .pop_front()
                .unwrap_or(Script::RunUntilCancelled);
            if matches!(script, Script::FailToSpawn) {
                return Err(crate::Error::spawn("no such binary"));
            }

            let pid = 1000 + self.spawned.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let invocation = handle.command.rendered("ffmpeg");
                let _ = handle
                    .event_tx
                    .send(EncodeEvent::Started { invocation, pid })
                    .await;
                let terminal = match script {
                    Script::RunUntilCancelled => {
                        handle.cancellation_token.cancelled().await;
                        EncodeEvent::Errored {
                            message: "killed on request".to_string(),
                        }
                    }
                    Script::EndAfterStart => EncodeEvent::Ended,
                    Script::FailAfterStart(message) => EncodeEvent::Errored {
                        message: message.to_string(),
                    },
                    Script::FailToSpawn => unreachable!(),
                };
                let _ = handle.event_tx.send(terminal).await;
            });
            Ok(())
        }

        fn is_available(&self) -> bool {
            true
        }

        fn version(&self) -> Option<String> {
            Some("fake 1.0".to_string())
        }
    }

    fn options(card: &str, bitrate: &str) -> PipelineOptions {
        PipelineOptions {
            input: InputSpec::Decklink(DecklinkInput {
                card_name: card.to_string(),
            }),
            output: OutputSpec::Rtp(RtpOutput {
                address: "10.0.0.1".to_string(),
                port: 5000,
                packet_size: None,
                buffer: None,
                jitter_buffer: None,
                encode: EncodeSettings {
                    bitrate: Some(bitrate.to_string()),
                    ..EncodeSettings::default()
                },
            }),
            overlay: OverlayOptions::default(),
            thumbnail: ThumbnailOptions::default(),
        }
    }

    fn supervisor(scripts: Vec<Script>, restart: RestartPolicy) -> Arc<ProcessSupervisor> {
        let config = AppConfig {
            ffmpeg_path: "ffmpeg".to_string(),
            restart,
            stop_grace: Duration::from_millis(200),
            ..AppConfig::default()
        };
        Arc::new(ProcessSupervisor::new(
            Arc::new(JobRegistry::new()),
            FakeRuntime::new(scripts),
            Arc::new(config),
        ))
    }

    /// Poll the registry until `pred` holds or the deadline passes.
    async fn wait_for(
        sup: &ProcessSupervisor,
        job_id: &str,
        pred: impl Fn(&Job) -> bool,
    ) -> Job {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            if let Ok(job) = sup.registry.get(job_id)
                && pred(&job)
            {
                return job;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "condition not reached for job {job_id}"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test]
    async fn natural_end_clears_pid_and_sets_ended_at() {
        let sup = supervisor(vec![Script::EndAfterStart], RestartPolicy::default());
        let outcome = sup.start_pipeline(options("cam1", "3M")).await;
        assert!(outcome.errors.is_empty());
        let job_id = outcome.job.unwrap().job_id;

        // The requested invocation pins CBR bounds to the bitrate.
        let command = outcome.command.unwrap();
        assert!(command.contains("-minrate 3M -maxrate 3M"));

        let job = wait_for(&sup, &job_id, |j| j.status == JobStatus::Ended).await;
        assert!(job.pid.is_none());
        assert!(job.ended_at.is_some());
        assert!(job.command.unwrap().contains("-minrate 3M"));
    }

    #[tokio::test]
    async fn start_signal_populates_command_and_pid() {
        let sup = supervisor(vec![Script::RunUntilCancelled], RestartPolicy::default());
        let outcome = sup.start_pipeline(options("cam1", "5M")).await;
        let job_id = outcome.job.unwrap().job_id;

        let job = wait_for(&sup, &job_id, |j| j.pid.is_some()).await;
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.pid, Some(1000));

        let _ = sup.kill(&job_id).await.unwrap();
    }

    #[tokio::test]
    async fn second_start_on_same_key_terminates_the_first() {
        let sup = supervisor(
            vec![Script::RunUntilCancelled, Script::RunUntilCancelled],
            RestartPolicy::default(),
        );

        let first = sup.start_pipeline(options("cam1", "5M")).await;
        let first_id = first.job.unwrap().job_id;
        wait_for(&sup, &first_id, |j| j.pid.is_some()).await;

        let second = sup.start_pipeline(options("cam1", "5M")).await;
        let second_id = second.job.unwrap().job_id;
        assert_ne!(first_id, second_id);

        let first_job = wait_for(&sup, &first_id, |j| j.status.is_terminal()).await;
        assert_eq!(first_job.status, JobStatus::Ended);

        // Never two running jobs for one key.
        let running: Vec<Job> = sup
            .registry
            .get_all()
            .into_iter()
            .filter(|j| j.key == "cam1" && j.status == JobStatus::Running)
            .collect();
        assert_eq!(running.len(), 1);
        assert_eq!(running[0].job_id, second_id);

        let _ = sup.kill(&second_id).await.unwrap();
    }

    #[tokio::test]
    async fn recoverable_fault_restarts_under_the_same_job_id() {
        let sup = supervisor(
            vec![
                Script::FailAfterStart("av_interleaved_write_frame(): Input/output error"),
                Script::RunUntilCancelled,
            ],
            RestartPolicy::default(),
        );

        let outcome = sup.start_pipeline(options("cam1", "5M")).await;
        let job_id = outcome.job.unwrap().job_id;

        let job = wait_for(&sup, &job_id, |j| {
            j.restart_count == 1 && j.status == JobStatus::Running && j.pid.is_some()
        })
        .await;
        // A fresh activation got a fresh pid under the same id and key.
        assert_eq!(job.pid, Some(1001));
        assert_eq!(job.key, "cam1");

        let _ = sup.kill(&job_id).await.unwrap();
    }

    #[tokio::test]
    async fn fatal_fault_is_terminal_without_restart() {
        let sup = supervisor(
            vec![Script::FailAfterStart("Unknown encoder 'libx266'")],
            RestartPolicy::default(),
        );

        let outcome = sup.start_pipeline(options("cam1", "5M")).await;
        let job_id = outcome.job.unwrap().job_id;

        let job = wait_for(&sup, &job_id, |j| j.status.is_terminal()).await;
        assert_eq!(job.status, JobStatus::Errored);
        assert_eq!(job.restart_count, 0);
        assert!(job.error.unwrap().contains("Unknown encoder"));
    }

    #[tokio::test]
    async fn capped_policy_stops_restarting_at_the_limit() {
        let sup = supervisor(
            vec![
                Script::FailAfterStart("Conversion failed!"),
                Script::FailAfterStart("Conversion failed!"),
            ],
            RestartPolicy {
                max_restarts: Some(1),
                ..RestartPolicy::default()
            },
        );

        let outcome = sup.start_pipeline(options("cam1", "5M")).await;
        let job_id = outcome.job.unwrap().job_id;

        let job = wait_for(&sup, &job_id, |j| {
            j.restart_count == 1 && j.status == JobStatus::Errored
        })
        .await;
        assert!(job.error.unwrap().contains("Conversion failed!"));
    }

    #[tokio::test]
    async fn kill_ends_the_job_cleanly() {
        let sup = supervisor(vec![Script::RunUntilCancelled], RestartPolicy::default());
        let outcome = sup.start_pipeline(options("cam1", "5M")).await;
        let job_id = outcome.job.unwrap().job_id;
        wait_for(&sup, &job_id, |j| j.pid.is_some()).await;

        sup.kill(&job_id).await.unwrap();
        let job = wait_for(&sup, &job_id, |j| j.status.is_terminal()).await;
        assert_eq!(job.status, JobStatus::Ended);
        assert!(job.pid.is_none());
    }

    #[tokio::test]
    async fn kill_unknown_job_is_not_found() {
        let sup = supervisor(vec![], RestartPolicy::default());
        assert!(matches!(
            sup.kill("missing").await,
            Err(crate::Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn kill_all_affects_only_running_jobs() {
        let sup = supervisor(
            vec![
                Script::EndAfterStart,
                Script::RunUntilCancelled,
                Script::RunUntilCancelled,
            ],
            RestartPolicy::default(),
        );

        let ended = sup.start_pipeline(options("cam1", "5M")).await;
        let ended_id = ended.job.unwrap().job_id;
        let ended_job = wait_for(&sup, &ended_id, |j| j.status.is_terminal()).await;
        let ended_at = ended_job.ended_at;

        let a = sup.start_pipeline(options("cam2", "5M")).await;
        let a_id = a.job.unwrap().job_id;
        let b = sup.start_pipeline(options("cam3", "5M")).await;
        let b_id = b.job.unwrap().job_id;
        wait_for(&sup, &a_id, |j| j.pid.is_some()).await;
        wait_for(&sup, &b_id, |j| j.pid.is_some()).await;

        let killed = sup.kill_all().await;
        let killed_ids: Vec<&str> = killed.iter().map(|j| j.job_id.as_str()).collect();
        assert_eq!(killed.len(), 2);
        assert!(killed_ids.contains(&a_id.as_str()));
        assert!(killed_ids.contains(&b_id.as_str()));
        assert!(killed.iter().all(|j| j.status.is_terminal()));

        // The already-ended job is untouched.
        let untouched = sup.registry.get(&ended_id).unwrap();
        assert_eq!(untouched.ended_at, ended_at);
    }

    #[tokio::test]
    async fn spawn_failure_is_surfaced_and_not_restarted() {
        let sup = supervisor(vec![Script::FailToSpawn], RestartPolicy::default());
        let outcome = sup.start_pipeline(options("cam1", "5M")).await;

        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains("no such binary"));
        let job = outcome.job.unwrap();
        assert_eq!(job.status, JobStatus::Errored);
        assert_eq!(job.restart_count, 0);
    }

    #[tokio::test]
    async fn invalid_options_are_rejected_without_a_job() {
        let sup = supervisor(vec![], RestartPolicy::default());

        let mut bad = options("cam1", "5M");
        if let OutputSpec::Rtp(ref mut output) = bad.output {
            output.address = "not an address!".to_string();
        }
        let outcome = sup.start_pipeline(bad).await;
        assert!(outcome.job.is_none());
        assert_eq!(outcome.errors.len(), 1);
    }
}
