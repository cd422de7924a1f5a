//! Binary-side plumbing: configuration, progress display, exit codes.

pub(crate) mod config;
pub(crate) mod exit_handler;
pub(crate) mod progress_manager;
