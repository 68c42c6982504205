use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    persistent_cell::read_value, CollectionSource, ControllerEvent, HttpStorySource,
    SimulatedStorySource, StoriesController, DEFAULT_SEARCH_TERM, SEARCH_TERM_KEY,
};
use futures::StreamExt;
use shared::domain::Story;
use storage::{KeyValueStore, Storage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod settings;

use crate::commands::{parse_command, render, HostCommand, HELP};
use crate::settings::{load_settings, Settings, SourceKind};

#[derive(Parser, Debug)]
#[command(name = "hacker_stories", about = "Filterable story list with a persisted search term")]
struct Args {
    #[arg(long, default_value = "stories.toml")]
    config: PathBuf,
    #[arg(long)]
    database_url: Option<String>,
    #[arg(long, value_enum)]
    source: Option<SourceKind>,
    #[arg(long)]
    delay_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    let mut settings = load_settings(&args.config)?;
    if let Some(v) = args.database_url {
        settings.database_url = v;
    }
    if let Some(v) = args.source {
        settings.source = v;
    }
    if let Some(v) = args.delay_ms {
        settings.delay_ms = v;
    }

    let database_url = settings.database_url();
    let storage = Storage::new(&database_url).await?;
    storage.health_check().await?;
    info!(database_url = %database_url, source = ?settings.source, "stories: starting");

    let store: Arc<dyn KeyValueStore> = Arc::new(storage);
    let source = build_source(&settings, store.as_ref()).await?;
    let controller = StoriesController::start(store, source).await;

    let renderer = tokio::spawn(render_events(BroadcastStream::new(
        controller.subscribe_events(),
    )));
    println!("{}", render(&controller.snapshot().await));
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_command(&line) {
            Ok(HostCommand::Search(term)) => {
                controller.on_search_changed(term).await;
            }
            Ok(HostCommand::Remove(id)) => {
                controller.on_remove_item(id).await;
            }
            Ok(HostCommand::Show) => println!("{}", render(&controller.snapshot().await)),
            Ok(HostCommand::Help) => println!("{HELP}"),
            Ok(HostCommand::Quit) => break,
            Err(message) => eprintln!("{message}"),
        }
    }

    controller.shutdown().await;
    renderer.abort();
    Ok(())
}

async fn build_source(
    settings: &Settings,
    store: &dyn KeyValueStore,
) -> Result<Arc<dyn CollectionSource<Story>>> {
    let delay = Duration::from_millis(settings.delay_ms);
    let source: Arc<dyn CollectionSource<Story>> = match settings.source {
        SourceKind::Simulated => Arc::new(SimulatedStorySource::new().with_delay(delay)),
        SourceKind::Failing => {
            Arc::new(SimulatedStorySource::failing("simulated outage").with_delay(delay))
        }
        SourceKind::Http => Arc::new(http_source(settings, store).await?),
    };
    Ok(source)
}

/// The HTTP source searches for the term persisted by the previous session.
async fn http_source(settings: &Settings, store: &dyn KeyValueStore) -> Result<HttpStorySource> {
    let query = read_value(store, SEARCH_TERM_KEY, DEFAULT_SEARCH_TERM.to_string()).await;
    HttpStorySource::new(&settings.http_base_url, query)
}

async fn render_events(mut events: BroadcastStream<ControllerEvent>) {
    while let Some(event) = events.next().await {
        match event {
            Ok(ControllerEvent::ViewChanged(snapshot)) => println!("{}", render(&snapshot)),
            Ok(ControllerEvent::PhaseChanged(phase)) => info!(%phase, "stories: load phase"),
            Ok(ControllerEvent::SearchTermChanged(_)) => {}
            Err(err) => warn!("stories: renderer fell behind: {err}"),
        }
    }
}
