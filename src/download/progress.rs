//! Shared progress counters for a download run.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Item and page counters written by the worker and read by a reporter.
///
/// The two counters are independent: `pages_in_item` restarts at zero for
/// every item while `items_completed` only grows.
#[derive(Debug, Default)]
pub struct ProgressCounters {
    items_total: AtomicUsize,
    items_completed: AtomicUsize,
    items_failed: AtomicUsize,
    pages_in_item: AtomicUsize,
    pages_total: AtomicUsize,
}

/// Point-in-time copy of [`ProgressCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Items in the run.
    pub items_total: usize,
    /// Items finished successfully.
    pub items_completed: usize,
    /// Items that failed.
    pub items_failed: usize,
    /// Pages saved for the item in progress.
    pub pages_in_item: usize,
    /// Pages saved over the whole run.
    pub pages_total: usize,
}

impl ProgressSnapshot {
    /// Items finished either way.
    #[must_use]
    pub fn items_done(&self) -> usize {
        self.items_completed + self.items_failed
    }
}

impl ProgressCounters {
    /// Creates counters for a run of `items_total` items.
    #[must_use]
    pub fn new(items_total: usize) -> Self {
        let counters = Self::default();
        counters.items_total.store(items_total, Ordering::SeqCst);
        counters
    }

    /// Number of items in the run.
    #[must_use]
    pub fn items_total(&self) -> usize {
        self.items_total.load(Ordering::SeqCst)
    }

    /// Number of items finished successfully.
    #[must_use]
    pub fn items_completed(&self) -> usize {
        self.items_completed.load(Ordering::SeqCst)
    }

    /// Number of items that failed.
    #[must_use]
    pub fn items_failed(&self) -> usize {
        self.items_failed.load(Ordering::SeqCst)
    }

    /// Pages saved for the current item.
    #[must_use]
    pub fn pages_in_item(&self) -> usize {
        self.pages_in_item.load(Ordering::SeqCst)
    }

    /// Pages saved in the whole run.
    #[must_use]
    pub fn pages_total(&self) -> usize {
        self.pages_total.load(Ordering::SeqCst)
    }

    /// Reads every counter.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            items_total: self.items_total(),
            items_completed: self.items_completed(),
            items_failed: self.items_failed(),
            pages_in_item: self.pages_in_item(),
            pages_total: self.pages_total(),
        }
    }

    pub(crate) fn start_item(&self) {
        self.pages_in_item.store(0, Ordering::SeqCst);
    }

    pub(crate) fn increment_pages(&self) {
        self.pages_in_item.fetch_add(1, Ordering::SeqCst);
        self.pages_total.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_completed(&self) {
        self.items_completed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn increment_failed(&self) {
        self.items_failed.fetch_add(1, Ordering::SeqCst);
    }
}
