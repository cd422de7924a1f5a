//! Page download for unlocked items.
//!
//! [`ContentFetcher`] saves the pages and embedded images of one item;
//! [`Orchestrator`] sequences items through the handshake and the fetcher
//! and reports progress.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ebook_archiver_core::{
//!     ContentItem, Credentials, ItemEvent, Orchestrator, PlatformEndpoints, Session,
//!     TransportOptions,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new(
//!     Credentials::new("reader@example.com", "secret"),
//!     PlatformEndpoints::default(),
//!     &TransportOptions::default(),
//! )?
//! .login()
//! .await?;
//!
//! let orchestrator = Orchestrator::new(Arc::new(session), "./books");
//! let mut run = orchestrator.start(vec![ContentItem::new("23s5agvhgkxf", "Mathematik 1")]);
//! while let Some(event) = run.events.recv().await {
//!     if let ItemEvent::Completed { item, pages, .. } = event {
//!         println!("{}: {pages} pages", item.name);
//!     }
//! }
//! let summary = run.handle.await?;
//! println!("{} completed, {} failed", summary.completed, summary.failed);
//! # Ok(())
//! # }
//! ```

mod assets;
pub mod constants;
mod error;
mod fetcher;
mod filename;
mod manifest;
mod orchestrator;
mod progress;

pub use assets::find_embedded_assets;
pub use error::{FetchError, ItemError};
pub use fetcher::{ContentFetcher, PageOutcome};
pub use filename::{asset_file_name, asset_subdir, item_dir_name, page_file_name};
pub use manifest::ItemManifest;
pub use orchestrator::{DownloadRun, ItemEvent, Orchestrator, RunSummary};
pub use progress::{ProgressCounters, ProgressSnapshot};

// No module-local Result aliases; signatures spell out `Result<T, FetchError>`.
