use std::sync::Arc;

use ffpipe::api::{ApiServer, ApiServerConfig, AppState};
use ffpipe::config::AppConfig;
use ffpipe::encoder::{EncoderRuntime, FfmpegRuntime};
use ffpipe::jobs::{JobRegistry, ProcessSupervisor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables before anything reads them.
    dotenvy::dotenv().ok();

    let config = Arc::new(AppConfig::from_env_or_default());
    let _log_guard = ffpipe::logging::init(config.log_dir.as_deref());

    config.ensure_dirs()?;

    let runtime = Arc::new(FfmpegRuntime::new(
        config.ffmpeg_path.clone(),
        config.stop_grace,
    ));
    if !runtime.is_available() {
        tracing::warn!(
            path = %config.ffmpeg_path,
            "FFmpeg binary not responding; pipeline requests will fail until it is available"
        );
    } else if let Some(version) = runtime.version() {
        tracing::info!("Using {version}");
    }

    let registry = Arc::new(JobRegistry::new());
    let supervisor = Arc::new(ProcessSupervisor::new(
        registry.clone(),
        runtime,
        config.clone(),
    ));

    let state = AppState::new(config, registry, supervisor.clone());
    let server = ApiServer::with_state(ApiServerConfig::from_env_or_default(), state);

    let cancel_token = server.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            cancel_token.cancel();
        }
    });

    server.run().await?;

    // Bring every supervised encoder down before exiting.
    let killed = supervisor.kill_all().await;
    if !killed.is_empty() {
        tracing::info!(count = killed.len(), "Terminated running jobs on shutdown");
    }

    Ok(())
}
