//! tasktime - command-line front end for the task API.
//!
//! Reads go through the local cache and keep working offline from stale
//! data; the cache is restored on start and persisted in the background.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tasktime_core::cache::FileStorage;
use tasktime_core::models::{NewTask, Priority, TaskPatch};
use tasktime_core::utils::parse_datetime_utc;
use tasktime_core::{
    CachingClient, Config, HttpTransport, PersistenceBridge, SharedCache, SuggestionEngine,
    SystemClock, TaskService,
};

#[derive(Parser)]
#[command(name = "tasktime", version, about = "Task manager client with offline cache")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all tasks
    List,
    /// Show one task
    Get { id: i64 },
    /// Create a task
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Estimated duration in minutes
        #[arg(long)]
        duration: Option<u32>,
        /// Deadline, e.g. 2026-10-20T18:00:00-03:00
        #[arg(long)]
        deadline: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Mark a task as completed
    Complete { id: i64 },
    /// Delete a task
    Delete { id: i64 },
    /// Suggest time windows for a task
    Suggest {
        #[arg(long)]
        title: String,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "medium")]
        priority: Priority,
        #[arg(long, default_value_t = 60)]
        duration: u32,
    },
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(service: &TaskService, command: Command) -> Result<()> {
    match command {
        Command::List => print_json(&service.list_tasks().await?),
        Command::Get { id } => print_json(&service.get_task(id).await?),
        Command::Create {
            title,
            category,
            priority,
            duration,
            deadline,
            description,
        } => {
            let deadline = parse_datetime_utc(&deadline)
                .with_context(|| format!("Invalid deadline: {}", deadline))?;
            let task = NewTask {
                title,
                description,
                priority,
                category,
                estimated_duration: duration,
                deadline: Some(deadline),
            };
            print_json(&service.create_task(&task).await?)
        }
        Command::Complete { id } => {
            let current = service.get_task(id).await?;
            print_json(&service.update_task(&current, &TaskPatch::complete()).await?)
        }
        Command::Delete { id } => {
            service.delete_task(id).await?;
            Ok(())
        }
        Command::Suggest {
            title,
            category,
            priority,
            duration,
        } => print_json(&service.suggest(&title, &category, priority, duration).await),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        }
    };

    // One cache per process, shared by the client, the engine and persistence
    let cache = SharedCache::new(Arc::new(SystemClock));
    let storage = Arc::new(FileStorage::new(config.cache_dir()?));
    let bridge = PersistenceBridge::new(cache.clone(), storage);
    bridge.restore();
    let persistence = bridge.start_background(config.persist_interval());

    let transport = HttpTransport::new(&config.api_base_url, config.request_timeout())
        .context("Failed to build HTTP client")?;
    let client = CachingClient::new(Arc::new(transport), cache);
    let engine = SuggestionEngine::new(client.clone());
    let service = TaskService::new(client, engine);

    info!(api = %config.api_base_url, "tasktime starting");
    let result = run(&service, cli.command).await;

    persistence.stop().await;
    result
}
