//! Service configuration loaded from environment variables.
//!
//! Every knob has a default suitable for running inside the container image,
//! so a bare `ffpipe` start works without any environment set up.

use std::path::PathBuf;
use std::time::Duration;

use crate::jobs::RestartPolicy;

/// Default grace period before an unresponsive encoder is force-killed.
const DEFAULT_STOP_GRACE_SECS: u64 = 5;

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the FFmpeg binary.
    pub ffmpeg_path: String,
    /// Root directory for media, outputs and thumbnails.
    pub data_dir: PathBuf,
    /// Directory for rolling log files; `None` logs to console only.
    pub log_dir: Option<PathBuf>,
    /// Restart policy for recoverable encoder faults.
    pub restart: RestartPolicy,
    /// How long a stopping encoder may linger before it is killed.
    pub stop_grace: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "/usr/bin/ffmpeg".to_string(),
            data_dir: PathBuf::from("./data"),
            log_dir: None,
            restart: RestartPolicy::default(),
            stop_grace: Duration::from_secs(DEFAULT_STOP_GRACE_SECS),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// Supported env vars:
    /// - `FFMPEG_PATH` (e.g. "/usr/local/bin/ffmpeg")
    /// - `DATA_DIR` (e.g. "/var/lib/ffpipe")
    /// - `LOG_DIR` (e.g. "/var/log/ffpipe")
    /// - `RESTART_MAX` (restart cap; unset restarts without limit)
    /// - `RESTART_DELAY_MS` (delay before each restart; unset restarts immediately)
    /// - `STOP_GRACE_SECS`
    pub fn from_env_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("FFMPEG_PATH")
            && !path.trim().is_empty()
        {
            config.ffmpeg_path = path;
        }

        if let Ok(dir) = std::env::var("DATA_DIR")
            && !dir.trim().is_empty()
        {
            config.data_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("LOG_DIR")
            && !dir.trim().is_empty()
        {
            config.log_dir = Some(PathBuf::from(dir));
        }

        if let Ok(max) = std::env::var("RESTART_MAX")
            && let Ok(parsed) = max.parse::<u32>()
        {
            config.restart.max_restarts = Some(parsed);
        }

        if let Ok(delay) = std::env::var("RESTART_DELAY_MS")
            && let Ok(parsed) = delay.parse::<u64>()
        {
            config.restart.initial_delay_ms = parsed;
        }

        if let Ok(grace) = std::env::var("STOP_GRACE_SECS")
            && let Ok(parsed) = grace.parse::<u64>()
        {
            config.stop_grace = Duration::from_secs(parsed);
        }

        config
    }

    /// Directory holding media files available as pipeline inputs.
    pub fn media_dir(&self) -> PathBuf {
        self.data_dir.join("media")
    }

    /// Directory encoded file outputs are written to.
    pub fn output_dir(&self) -> PathBuf {
        self.data_dir.join("output")
    }

    /// Directory HLS playlists and segments are written to.
    pub fn hls_dir(&self) -> PathBuf {
        self.data_dir.join("hls")
    }

    /// Directory per-job thumbnail snapshots are written to.
    pub fn thumbnail_dir(&self) -> PathBuf {
        self.data_dir.join("thumbnail")
    }

    /// Create the data directory tree if it does not exist yet.
    pub fn ensure_dirs(&self) -> crate::Result<()> {
        for dir in [
            self.media_dir(),
            self.output_dir(),
            self.hls_dir(),
            self.thumbnail_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_container_friendly() {
        let config = AppConfig::default();
        assert_eq!(config.ffmpeg_path, "/usr/bin/ffmpeg");
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert!(config.log_dir.is_none());
        assert_eq!(config.stop_grace, Duration::from_secs(5));
        assert!(config.restart.max_restarts.is_none());
    }

    #[test]
    fn data_subdirs_hang_off_data_dir() {
        let config = AppConfig {
            data_dir: PathBuf::from("/var/lib/ffpipe"),
            ..AppConfig::default()
        };
        assert_eq!(
            config.thumbnail_dir(),
            PathBuf::from("/var/lib/ffpipe/thumbnail")
        );
        assert_eq!(config.media_dir(), PathBuf::from("/var/lib/ffpipe/media"));
    }
}
