//! # Main — CLI Entry Point
//!
//! Routes subcommands to the HTTP server and the one-shot reporting commands.
//!
//! ## Subcommands
//!
//! - `serve` — run the tracer dashboard HTTP server.
//! - `snapshot` — print the dashboard payload once as JSON.
//! - `queues` — print the author and video queue depth.
//!
//! ## Global Options
//!
//! - `--config`: TOML settings file (see `config.rs`).
//! - `--database-url` / `DATABASE_URL`: PostgreSQL document store.
//! - `--redis-url` / `REDIS_URL`: Redis queue store.
//! - `--query-timeout-ms` / `CRAWLWATCH_QUERY_TIMEOUT_MS`: per-store-call deadline.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "crawlwatch", about = "Monitor background crawl tasks and queues")]
struct Cli {
    /// TOML settings file
    #[arg(long, env = "CRAWLWATCH_CONFIG")]
    config: Option<PathBuf>,

    /// PostgreSQL connection URL (or set DATABASE_URL env var)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Redis connection URL (or set REDIS_URL env var)
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Deadline for each individual store call, in milliseconds
    #[arg(long, env = "CRAWLWATCH_QUERY_TIMEOUT_MS")]
    query_timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tracer dashboard HTTP server
    Serve {
        /// Port to listen on
        #[arg(long, env = "CRAWLWATCH_PORT")]
        port: Option<u16>,
        /// Serve from in-process stores instead of PostgreSQL and Redis
        #[arg(long)]
        in_memory: bool,
    },
    /// Print the dashboard payload once as JSON
    Snapshot,
    /// Print the author and video crawl queue depth
    Queues,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // LOG_FORMAT=json for log shippers, human-readable otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    let settings = cli::resolve_settings(&cli)?;
    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Serve { in_memory, .. } => rt.block_on(cli::run_serve(&settings, in_memory)),
        Commands::Snapshot => rt.block_on(cli::run_snapshot(&settings)),
        Commands::Queues => rt.block_on(cli::run_queues(&settings)),
    }
}
