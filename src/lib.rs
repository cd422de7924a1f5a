//! E-book Archiver Core Library
//!
//! This library archives the pages of an e-book shelf whose content is gated
//! behind a cookie-based, three-hop HTML relay handshake.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`auth`] - Credentials, the HTTP session and its cookie jar, login/logout
//! - [`handshake`] - Hidden-field extraction and the three-hop relay state machine
//! - [`download`] - Paginated page fetcher, embedded assets, run orchestration
//! - [`shelf`] - Content items and the shelf listing
//! - [`platform`] - Endpoint layout and cookie names of the platform

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod download;
pub mod handshake;
pub mod platform;
pub mod shelf;
mod user_agent;

// Re-export commonly used types
pub use auth::{ActiveSession, Credentials, Session, SessionError, TransportOptions};
pub use download::{
    ContentFetcher, DownloadRun, FetchError, ItemError, ItemEvent, ItemManifest, Orchestrator,
    PageOutcome, ProgressCounters, ProgressSnapshot, RunSummary,
};
pub use handshake::{
    HandshakeEngine, HandshakeError, HandshakeParameters, HandshakeStage, ResolvedAccess,
    extract_hidden_fields,
};
pub use platform::PlatformEndpoints;
pub use shelf::{ContentItem, ShelfError, list_shelf, parse_shelf};
