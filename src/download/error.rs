//! Error types for the download module.
//!
//! [`FetchError`] covers a single page or asset request. [`ItemError`] is what
//! the orchestrator reports when one item of a run fails.

use std::path::PathBuf;

use thiserror::Error;

use crate::handshake::HandshakeError;

/// Errors that can occur while fetching pages and assets.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching {url}: {source}")]
    Transport {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success status other than the terminating 404.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error while saving a page or asset.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A page or asset URL could not be built.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },
}

impl FetchError {
    /// Creates a transport error, promoting timeouts to [`FetchError::Timeout`].
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout { url: url.into() };
        }
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }
}

/// Why one item of a run failed.
#[derive(Debug, Error)]
pub enum ItemError {
    /// The relay handshake did not yield access.
    #[error(transparent)]
    Handshake(#[from] HandshakeError),

    /// Pages or assets could not be fetched or saved.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The item manifest could not be serialized.
    #[error("could not serialize manifest {path}: {source}")]
    Manifest {
        /// Manifest path.
        path: PathBuf,
        /// The underlying serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// The item directory or manifest could not be written.
    #[error("IO error preparing {path}: {source}")]
    Io {
        /// The path involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl ItemError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// No From<reqwest::Error> or From<std::io::Error>: every variant needs the
// URL or path the source error lacks. Use the constructors above.
