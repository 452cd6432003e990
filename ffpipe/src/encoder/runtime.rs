//! Encoder runtime: the boundary between the supervisor and the external
//! FFmpeg process.
//!
//! The [`EncoderRuntime`] trait hides process mechanics behind the lifecycle
//! signal contract (start, progress, stderr line, end, error), so the
//! supervisor's state machine can be driven in tests without spawning
//! anything real.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::command::EncodeCommand;
use crate::error::{Error, Result};

/// Lifecycle signals emitted by an encoder activation.
#[derive(Debug, Clone)]
pub enum EncodeEvent {
    /// The process is up; reports the exact invocation and OS pid.
    Started { invocation: String, pid: u32 },
    /// Periodic progress parsed from the encoder's stats output.
    Progress(EncodeProgress),
    /// One raw stderr line.
    StderrLine(String),
    /// Clean exit.
    Ended,
    /// Abnormal exit or runtime fault.
    Errored { message: String },
}

/// Progress counters parsed from FFmpeg's stats line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeProgress {
    pub frame: u64,
    pub fps: f64,
    pub bitrate_kbps: f64,
    pub speed: f64,
}

/// Handle to one encoder activation.
///
/// Cancelling the token asks the runtime to bring the process down; the
/// terminal signal still arrives through the event channel, which is the
/// only path that drives job state.
pub struct EncodeHandle {
    pub job_id: String,
    pub key: String,
    /// Spawn sequence number distinguishing activations across restarts.
    pub activation: u64,
    pub command: EncodeCommand,
    pub cancellation_token: CancellationToken,
    pub event_tx: mpsc::Sender<EncodeEvent>,
    pub started_at: DateTime<Utc>,
}

impl EncodeHandle {
    pub fn new(
        job_id: impl Into<String>,
        key: impl Into<String>,
        activation: u64,
        command: EncodeCommand,
        event_tx: mpsc::Sender<EncodeEvent>,
    ) -> Self {
        Self {
            job_id: job_id.into(),
            key: key.into(),
            activation,
            command,
            cancellation_token: CancellationToken::new(),
            event_tx,
            started_at: Utc::now(),
        }
    }

    /// Ask the activation to stop.
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }
}

/// Trait for encoder runtimes.
#[async_trait]
pub trait EncoderRuntime: Send + Sync {
    /// Start one activation.
    ///
    /// Returns once the process is spawned; lifecycle signals flow through
    /// the handle's event channel afterwards. A spawn failure is returned
    /// directly and no events are emitted.
    async fn start(&self, handle: Arc<EncodeHandle>) -> Result<()>;

    /// Whether the underlying binary is usable.
    fn is_available(&self) -> bool;

    /// Version string of the underlying binary.
    fn version(&self) -> Option<String>;
}

/// FFmpeg-backed runtime.
pub struct FfmpegRuntime {
    binary_path: String,
    stop_grace: Duration,
    version: Option<String>,
}

impl FfmpegRuntime {
    pub fn new(binary_path: impl Into<String>, stop_grace: Duration) -> Self {
        let binary_path = binary_path.into();
        let version = Self::detect_version(&binary_path);
        Self {
            binary_path,
            stop_grace,
            version,
        }
    }

    /// Detect the ffmpeg version, if the binary responds.
    fn detect_version(path: &str) -> Option<String> {
        process_utils::std_command(path)
            .arg("-version")
            .output()
            .ok()
            .and_then(|output| {
                String::from_utf8(output.stdout)
                    .ok()
                    .and_then(|s| s.lines().next().map(|l| l.to_string()))
            })
    }

    /// Parse an FFmpeg stats line.
    ///
    /// Format: `frame=X fps=X q=X size=XkB time=HH:MM:SS.ms bitrate=Xkbits/s speed=Xx`
    fn parse_progress(line: &str) -> Option<EncodeProgress> {
        if !line.starts_with("frame=") {
            return None;
        }

        let mut progress = EncodeProgress::default();

        if let Some(value) = Self::field(line, "frame=") {
            progress.frame = value.parse().unwrap_or(0);
        }
        if let Some(value) = Self::field(line, "fps=") {
            progress.fps = value.parse().unwrap_or(0.0);
        }
        if let Some(start) = line.find("bitrate=") {
            let rest = &line[start + 8..];
            if let Some(end) = rest.find("kbits/s") {
                progress.bitrate_kbps = rest[..end].trim().parse().unwrap_or(0.0);
            }
        }
        if let Some(start) = line.find("speed=") {
            let rest = line[start + 6..].trim_start();
            if let Some(end) = rest.find('x') {
                progress.speed = rest[..end].trim().parse().unwrap_or(0.0);
            }
        }

        Some(progress)
    }

    /// First whitespace-delimited token after `prefix`.
    fn field<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
        let start = line.find(prefix)? + prefix.len();
        let rest = line[start..].trim_start();
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        Some(&rest[..end])
    }

    /// Whether a stderr line is worth keeping as the failure message.
    fn looks_like_error(line: &str) -> bool {
        line.contains("Error")
            || line.contains("error")
            || line.contains("Conversion failed!")
            || line.contains("Invalid")
    }
}

#[async_trait]
impl EncoderRuntime for FfmpegRuntime {
    async fn start(&self, handle: Arc<EncodeHandle>) -> Result<()> {
        let mut command = process_utils::tokio_command(&self.binary_path);
        command
            .args(&handle.command.args)
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = command
            .spawn()
            .map_err(|e| Error::spawn(format!("{}: {e}", self.binary_path)))?;

        let pid = child
            .id()
            .ok_or_else(|| Error::spawn("ffmpeg exited before a pid could be read"))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::spawn("failed to capture ffmpeg stderr"))?;

        let invocation = handle.command.rendered(&self.binary_path);
        info!(job_id = %handle.job_id, pid, "Spawned ffmpeg: {invocation}");

        let _ = handle
            .event_tx
            .send(EncodeEvent::Started { invocation, pid })
            .await;

        let event_tx = handle.event_tx.clone();
        let token = handle.cancellation_token.clone();
        let job_id = handle.job_id.clone();
        let stop_grace = self.stop_grace;

        tokio::spawn(async move {
            let reader = BufReader::new(stderr);
            let mut lines = reader.lines();
            let mut last_error: Option<String> = None;

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(job_id = %job_id, "Stop requested, winding down ffmpeg");
                        break;
                    }
                    line_result = lines.next_line() => {
                        match line_result {
                            Ok(Some(line)) => {
                                if let Some(progress) = FfmpegRuntime::parse_progress(&line) {
                                    let _ = event_tx.send(EncodeEvent::Progress(progress)).await;
                                }
                                if FfmpegRuntime::looks_like_error(&line) {
                                    last_error = Some(line.clone());
                                }
                                let _ = event_tx.send(EncodeEvent::StderrLine(line)).await;
                            }
                            Ok(None) => break,
                            Err(e) => {
                                error!(job_id = %job_id, "Error reading ffmpeg stderr: {e}");
                                last_error = Some(e.to_string());
                                break;
                            }
                        }
                    }
                }
            }

            // The child is reaped here, so a terminal event always means the
            // process is gone.
            let terminal = match process_utils::stop_gracefully(&mut child, stop_grace).await {
                Ok(process_utils::StopOutcome::Exited(Some(0))) => EncodeEvent::Ended,
                Ok(process_utils::StopOutcome::Exited(code)) => EncodeEvent::Errored {
                    message: last_error.unwrap_or_else(|| {
                        format!("ffmpeg exited with status {}", code.unwrap_or(-1))
                    }),
                },
                Ok(process_utils::StopOutcome::Killed) => EncodeEvent::Errored {
                    message: "ffmpeg did not exit within the grace period and was killed"
                        .to_string(),
                },
                Err(e) => EncodeEvent::Errored {
                    message: format!("error waiting for ffmpeg: {e}"),
                },
            };
            let _ = event_tx.send(terminal).await;
        });

        Ok(())
    }

    fn is_available(&self) -> bool {
        self.version.is_some()
    }

    fn version(&self) -> Option<String> {
        self.version.clone()
    }
}
