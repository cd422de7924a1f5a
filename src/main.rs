//! CLI entry point for the e-book archiver.

use std::io::{self, IsTerminal};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result};
use clap::Parser;
use ebook_archiver_core::{
    ActiveSession, ContentItem, ItemEvent, Orchestrator, PlatformEndpoints, RunSummary, Session,
    list_shelf,
};
use tracing::{debug, error, info, warn};

mod app;
mod cli;

use app::config::{RunSettings, load_file_config, resolve_settings};
use app::exit_handler::{ProcessExit, determine_exit_outcome};
use app::progress_manager::spawn_progress_ui;
use cli::Args;

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    match run(args).await {
        Ok(outcome) => outcome.into(),
        Err(e) => {
            error!("{e:#}");
            ProcessExit::Failure.into()
        }
    }
}

async fn run(args: Args) -> Result<ProcessExit> {
    let file = load_file_config(args.config.as_deref())?;
    let settings = resolve_settings(&args, file, |name| std::env::var(name).ok())?;
    info!(user = %settings.credentials.username, "Archiver starting");

    let session = Session::new(
        settings.credentials.clone(),
        PlatformEndpoints::default(),
        &settings.transport,
    )
    .context("Failed to set up HTTP session")?;
    let session = Arc::new(session.login().await?);

    let outcome = archive(&args, &settings, Arc::clone(&session)).await;

    match Arc::try_unwrap(session) {
        Ok(session) => session.logout().await,
        Err(_) => warn!("session still in use, skipping logout"),
    }
    outcome
}

async fn archive(
    args: &Args,
    settings: &RunSettings,
    session: Arc<ActiveSession>,
) -> Result<ProcessExit> {
    let shelf = match list_shelf(&session).await {
        Ok(shelf) => shelf,
        Err(e) if !args.codes.is_empty() => {
            warn!(error = %e, "could not list shelf, using item codes as names");
            Vec::new()
        }
        Err(e) => return Err(e).context("Failed to list shelf"),
    };

    if args.list {
        for item in &shelf {
            println!("{}\t{}", item.id, item.name);
        }
        return Ok(ProcessExit::Success);
    }

    let items = select_items(&args.codes, shelf);
    if items.is_empty() {
        info!("Nothing to download");
        return Ok(ProcessExit::Success);
    }
    info!(items = items.len(), dest = %settings.save_path.display(), "Starting download");

    let orchestrator = Orchestrator::new(session, settings.save_path.clone());
    let mut run = orchestrator.start(items);
    drop(orchestrator);

    let use_bars = !args.quiet && io::stderr().is_terminal();
    let (progress_handle, stop) = spawn_progress_ui(use_bars, Arc::clone(&run.progress));

    let joined = match settings.run_timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut run.handle).await {
            Ok(joined) => joined,
            Err(_) => {
                run.handle.abort();
                let _ = (&mut run.handle).await;
                stop.store(true, Ordering::SeqCst);
                if let Some(handle) = progress_handle {
                    let _ = handle.await;
                }
                anyhow::bail!("Run did not finish within {}s", limit.as_secs());
            }
        },
        None => (&mut run.handle).await,
    };

    stop.store(true, Ordering::SeqCst);
    if let Some(handle) = progress_handle {
        let _ = handle.await;
    }

    let summary: RunSummary = joined.context("Download worker panicked")?;
    while let Some(event) = run.events.recv().await {
        match event {
            ItemEvent::Completed { item, pages, dest } => {
                info!(item = %item.id, name = %item.name, pages, dest = %dest.display(), "Saved");
            }
            ItemEvent::Failed { item, error } => {
                warn!(item = %item.id, name = %item.name, %error, "Failed");
            }
        }
    }

    info!(
        completed = summary.completed,
        failed = summary.failed,
        pages = summary.pages,
        "Download complete"
    );
    Ok(determine_exit_outcome(summary.completed, summary.failed))
}

/// Items to download: the whole shelf, or the requested codes in order.
fn select_items(codes: &[String], shelf: Vec<ContentItem>) -> Vec<ContentItem> {
    if codes.is_empty() {
        return shelf;
    }
    codes
        .iter()
        .map(|code| {
            shelf
                .iter()
                .find(|item| &item.id == code)
                .cloned()
                .unwrap_or_else(|| ContentItem::new(code.as_str(), code.as_str()))
        })
        .collect()
}
