use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use page_editor::actors::page_editor::{DraftSeed, PageEditorArguments};
use page_editor::collaborators::{
    BeaconTransport, HttpBeacon, HttpPageGenerator, HttpPagePersistence, InMemoryPagePersistence,
    MemoryBeacon, PageGenerator, PagePersistence,
};
use page_editor::config::load_editor_config;
use page_editor::{driver, PageEditorHandle};
use shared_types::{GenerateRequest, PageId};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Drive a page editing session over stdin/stdout (one JSON command per line)
#[derive(Debug, Parser)]
#[command(name = "page-editor")]
#[command(version)]
#[command(about = "Draft editing engine for AI-generated marketing pages", long_about = None)]
struct Cli {
    /// Resume editing an existing page record
    #[arg(long, value_name = "ID", conflicts_with = "prompt")]
    record: Option<String>,

    /// Generate a new page from this prompt before editing
    #[arg(long)]
    prompt: Option<String>,

    /// Template used for new pages
    #[arg(long, default_value = "default")]
    template: String,

    /// Keep pages in process memory instead of calling the page API
    #[arg(long)]
    memory: bool,
}

fn load_env_file() {
    let Ok(cwd) = std::env::current_dir() else {
        return;
    };
    let mut current = cwd.clone();
    loop {
        let candidate = current.join(".env");
        if candidate.exists() {
            match dotenvy::from_path(&candidate) {
                Ok(_) => tracing::info!(path = %candidate.display(), "Loaded environment from .env"),
                Err(e) => tracing::warn!(
                    path = %candidate.display(),
                    error = %e,
                    "Failed to load .env file"
                ),
            }
            return;
        }
        if !current.pop() {
            break;
        }
    }
    tracing::debug!(cwd = %cwd.display(), "No .env file found; using process environment only");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the command protocol.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    load_env_file();
    let cli = Cli::parse();
    let config = load_editor_config();
    tracing::info!(
        api_base_url = %config.api_base_url,
        public_origin = %config.public_origin,
        autosave_debounce_ms = config.autosave_debounce_ms,
        memory = cli.memory,
        "Starting page editor session"
    );

    let memory_store = Arc::new(InMemoryPagePersistence::new());
    let persistence: Arc<dyn PagePersistence> = if cli.memory {
        memory_store.clone()
    } else {
        Arc::new(HttpPagePersistence::new(
            config.api_base_url.clone(),
            config.request_timeout(),
        )?)
    };
    let generator: Arc<dyn PageGenerator> = Arc::new(HttpPageGenerator::new(
        &config.api_base_url,
        config.request_timeout(),
    )?);
    let beacon: Arc<dyn BeaconTransport> = if cli.memory {
        Arc::new(MemoryBeacon::new(memory_store))
    } else {
        Arc::new(HttpBeacon::new(&config.api_base_url, config.request_timeout())?)
    };

    let seed = match (&cli.record, &cli.prompt) {
        (Some(record), _) => {
            let page = persistence
                .fetch(&PageId(record.clone()))
                .await
                .with_context(|| format!("failed to load page {record}"))?;
            DraftSeed::from_record(page)
        }
        (None, Some(prompt)) => {
            let generated = generator
                .generate(GenerateRequest {
                    prompt: prompt.clone(),
                    existing_config: None,
                    template_id: Some(cli.template.clone()),
                })
                .await
                .context("initial page generation failed")?;
            DraftSeed::from_generated(&generated, prompt.clone(), cli.template.clone())?
        }
        (None, None) => DraftSeed::blank(cli.template.clone(), String::new()),
    };

    let beacon_drain_timeout = config.request_timeout();
    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
    let (handle, join) = PageEditorHandle::spawn(PageEditorArguments {
        seed,
        persistence,
        generator,
        beacon: beacon.clone(),
        events: Some(events_tx),
        config,
    })
    .await?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    driver::run(handle, stdin, tokio::io::stdout(), events_rx).await?;
    join.await.context("editor actor panicked")?;

    // Unload beacons still get their delivery attempt before the runtime drops.
    let pending = beacon.drain(beacon_drain_timeout).await;
    if pending > 0 {
        tracing::warn!(pending, "Exiting with undelivered beacons");
    }
    Ok(())
}
