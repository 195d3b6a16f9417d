//! # bookreel-cli
//!
//! The `bookreel` binary:
//!
//! - `bookreel start --room <name>...` runs the worker over LiveKit rooms
//! - `bookreel dev --room <name>` serves one room with debug logging
//! - `bookreel console` talks to the same agent by text
//!
//! Voice commands need the **`livekit`** feature.

pub mod cli;
pub mod config;
pub mod console;
pub mod entrypoint;

use anyhow::Result;
use bookreel_agent::RecommenderAgent;
use bookreel_voice::{
    Job, JobSource, RoomConnector, StaticJobSource, Worker, WorkerOptions, WorkerReport,
};
use cli::{Cli, Commands};
use config::{AppConfig, Mode};
use entrypoint::Services;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Console => {
            let config = AppConfig::load(Mode::Console, cli.config.as_deref())?;
            let agent = RecommenderAgent::builder()
                .model(entrypoint::openai_model(&config)?)
                .options(config.settings.policy.clone())
                .build()?;
            console::run_console(agent).await
        }
        Commands::Start { rooms, max_jobs } => {
            let mut config = AppConfig::load(Mode::Voice, cli.config.as_deref())?;
            if let Some(max_jobs) = max_jobs {
                config.settings.worker.max_concurrent_jobs = max_jobs.max(1);
            }
            serve(config, StaticJobSource::rooms(rooms)).await
        }
        Commands::Dev { room } => {
            let mut config = AppConfig::load(Mode::Voice, cli.config.as_deref())?;
            config.settings.worker.max_concurrent_jobs = 1;
            serve(config, StaticJobSource::new([Job::new(room)])).await
        }
    }
}

/// Run the worker over `jobs` until the source is drained. Failed rooms are
/// counted in the report; they never fail the worker.
pub async fn serve_rooms<S: JobSource>(
    connector: Arc<dyn RoomConnector>,
    services: Arc<Services>,
    options: WorkerOptions,
    jobs: S,
) -> Result<WorkerReport> {
    let worker = Worker::new(options, connector);
    let report = worker
        .run(jobs, move |ctx| entrypoint::entrypoint(ctx, Arc::clone(&services)))
        .await?;
    if report.failed > 0 {
        warn!(completed = report.completed, failed = report.failed, "some rooms failed");
    } else {
        info!(completed = report.completed, "all rooms finished");
    }
    Ok(report)
}

#[cfg(feature = "livekit")]
async fn serve<S: JobSource>(config: AppConfig, jobs: S) -> Result<()> {
    use bookreel_voice::livekit::{LiveKitConfig, LiveKitConnector};

    let livekit = config
        .secrets
        .livekit
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("LiveKit credentials are required for voice sessions"))?;
    let connector = LiveKitConnector::new(LiveKitConfig::new(
        livekit.url.clone(),
        livekit.api_key.clone(),
        livekit.api_secret.clone(),
    ));
    let services = Arc::new(Services::from_config(&config)?);
    serve_rooms(Arc::new(connector), services, config.settings.worker.to_options(), jobs).await?;
    Ok(())
}

#[cfg(not(feature = "livekit"))]
async fn serve<S: JobSource>(config: AppConfig, _jobs: S) -> Result<()> {
    info!(max_concurrent_jobs = config.settings.worker.max_concurrent_jobs, "voice mode requested");
    anyhow::bail!("voice sessions need LiveKit; rebuild with `--features livekit`")
}
