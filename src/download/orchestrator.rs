//! Sequential per-item driver: handshake, page fetch, manifest, event.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use super::error::ItemError;
use super::fetcher::ContentFetcher;
use super::filename::item_dir_name;
use super::manifest::ItemManifest;
use super::progress::ProgressCounters;
use crate::auth::ActiveSession;
use crate::handshake::HandshakeEngine;
use crate::shelf::ContentItem;

/// Outcome of one item, emitted as soon as the item is finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemEvent {
    /// All pages were saved.
    Completed {
        /// The item.
        item: ContentItem,
        /// Pages saved.
        pages: u32,
        /// Directory the pages were saved in.
        dest: PathBuf,
    },
    /// The item was abandoned; the run continued with the next one.
    Failed {
        /// The item.
        item: ContentItem,
        /// Rendered error.
        error: String,
    },
}

/// Totals of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Items completed.
    pub completed: usize,
    /// Items failed.
    pub failed: usize,
    /// Pages saved over all items.
    pub pages: u64,
}

/// Handles to a started run.
#[derive(Debug)]
pub struct DownloadRun {
    /// One event per item, in list order.
    pub events: mpsc::Receiver<ItemEvent>,
    /// Live counters for a reporter to poll.
    pub progress: Arc<ProgressCounters>,
    /// The worker; resolves to the run totals.
    pub handle: JoinHandle<RunSummary>,
}

/// Runs items one after another against one logged-in session.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    session: Arc<ActiveSession>,
    dest_root: PathBuf,
}

impl Orchestrator {
    /// Creates an orchestrator saving under `dest_root`.
    #[must_use]
    pub fn new(session: Arc<ActiveSession>, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            session,
            dest_root: dest_root.into(),
        }
    }

    /// Root directory items are saved under.
    #[must_use]
    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    /// Spawns the worker for `items` and returns immediately.
    ///
    /// A failed item is logged, reported as [`ItemEvent::Failed`] and
    /// skipped; the worker never stops early.
    #[must_use]
    pub fn start(&self, items: Vec<ContentItem>) -> DownloadRun {
        let (tx, events) = mpsc::channel(items.len().max(1));
        let progress = Arc::new(ProgressCounters::new(items.len()));
        let worker = self.clone();
        let counters = Arc::clone(&progress);

        let handle = tokio::spawn(async move {
            let mut summary = RunSummary::default();
            for item in items {
                counters.start_item();
                let event = match worker.download_item(&item, &counters).await {
                    Ok((pages, dest)) => {
                        summary.completed += 1;
                        summary.pages += u64::from(pages);
                        counters.increment_completed();
                        ItemEvent::Completed { item, pages, dest }
                    }
                    Err(e) => {
                        error!(item = %item.id, error = %e, "item failed");
                        summary.failed += 1;
                        counters.increment_failed();
                        ItemEvent::Failed {
                            item,
                            error: e.to_string(),
                        }
                    }
                };
                // Receiver may be gone; the run still finishes.
                let _ = tx.send(event).await;
            }
            info!(
                completed = summary.completed,
                failed = summary.failed,
                pages = summary.pages,
                "run finished"
            );
            summary
        });

        DownloadRun {
            events,
            progress,
            handle,
        }
    }

    /// Downloads one item into its own directory below the root.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError`] if the directory cannot be created, the
    /// handshake fails, a page cannot be fetched or the manifest cannot be
    /// written.
    #[instrument(skip(self, item, progress), fields(item = %item.id))]
    pub async fn download_item(
        &self,
        item: &ContentItem,
        progress: &ProgressCounters,
    ) -> Result<(u32, PathBuf), ItemError> {
        let dest = self.dest_root.join(item_dir_name(item));
        tokio::fs::create_dir_all(&dest)
            .await
            .map_err(|e| ItemError::io(&dest, e))?;

        let access = HandshakeEngine::new(&self.session).resolve(item).await?;
        let pages = ContentFetcher::new(&self.session)
            .fetch_all(item, &access, &dest, progress)
            .await?;
        ItemManifest::new(item, pages, access.sub_path())
            .write_to(&dest)
            .await?;

        info!(item = %item.id, name = %item.name, pages, "item complete");
        Ok((pages, dest))
    }
}
