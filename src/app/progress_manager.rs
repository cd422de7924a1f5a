//! Progress UI (item bar plus page counter) for download runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ebook_archiver_core::ProgressCounters;
use ebook_archiver_core::download::constants::PROGRESS_POLL_INTERVAL;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

/// Spawns the progress UI when requested.
/// Returns (handle, stop) so the caller can signal stop and await the handle.
/// When `use_bars` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    use_bars: bool,
    progress: Arc<ProgressCounters>,
) -> (Option<tokio::task::JoinHandle<()>>, Arc<AtomicBool>) {
    if !use_bars {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_bars_inner(progress, Arc::clone(&stop));
    (Some(handle), stop)
}

fn spawn_bars_inner(
    progress: Arc<ProgressCounters>,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let bars = MultiProgress::new();
        let items = bars.add(ProgressBar::new(progress.items_total() as u64));
        items.set_style(
            ProgressStyle::with_template("Books [{pos}/{len}] {wide_bar} {percent}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        let pages = bars.add(ProgressBar::new_spinner());
        pages.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pages.enable_steady_tick(Duration::from_millis(100));

        loop {
            let snapshot = progress.snapshot();
            items.set_position(snapshot.items_done() as u64);
            pages.set_message(format!(
                "Pages: {} in current book, {} total",
                snapshot.pages_in_item, snapshot.pages_total
            ));
            if stop.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(PROGRESS_POLL_INTERVAL).await;
        }

        pages.finish_and_clear();
        items.finish_and_clear();
    })
}
