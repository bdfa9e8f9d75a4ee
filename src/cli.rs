//! Subcommand implementations.

use super::{Cli, Commands};
use anyhow::Result;
use crawlwatch::config::Settings;
use crawlwatch::dashboard;
use crawlwatch::service::TracerService;
use tracing::info;

/// Settings file (or defaults), then flags and environment on top.
pub(super) fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(url) = &cli.database_url {
        settings.database_url = Some(url.clone());
    }
    if let Some(url) = &cli.redis_url {
        settings.redis_url = Some(url.clone());
    }
    if let Some(ms) = cli.query_timeout_ms {
        settings.query_timeout_ms = ms;
    }
    if let Commands::Serve {
        port: Some(port), ..
    } = cli.command
    {
        settings.port = port;
    }
    settings.validate()?;
    Ok(settings)
}

pub(super) async fn run_serve(settings: &Settings, in_memory: bool) -> Result<()> {
    let (documents, queues) = if in_memory {
        info!("using in-process stores");
        dashboard::memory_stores()
    } else {
        dashboard::connect_stores(settings).await?
    };
    dashboard::run(settings, documents, queues).await
}

async fn connect_service(settings: &Settings) -> Result<TracerService> {
    let (documents, queues) = dashboard::connect_stores(settings).await?;
    Ok(TracerService::new(
        documents,
        queues,
        settings.queues.clone(),
        settings.query_timeout(),
    ))
}

pub(super) async fn run_snapshot(settings: &Settings) -> Result<()> {
    let service = connect_service(settings).await?;
    let reply = service.dashboard_data().await;
    println!("{}", serde_json::to_string_pretty(&reply.payload)?);
    Ok(())
}

pub(super) async fn run_queues(settings: &Settings) -> Result<()> {
    let service = connect_service(settings).await?;
    let author = service.author_queue_status().await?;
    let video = service.video_queue_status().await?;
    println!(
        "{:<24} {:>10}",
        service.queue_names().author,
        author.payload.length
    );
    println!(
        "{:<24} {:>10}",
        service.queue_names().video,
        video.payload.length
    );
    Ok(())
}
