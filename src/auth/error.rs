//! Error types for session management.

use thiserror::Error;

/// Errors that can occur while building the session or logging in.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The login request completed but the session cookie never appeared.
    ///
    /// The platform answers failed logins with a success status, so the
    /// cookie is the only reliable signal.
    #[error(
        "[AUTH] login failed for {username}: no '{cookie}' cookie after {url}\n  Suggestion: {suggestion}"
    )]
    Authentication {
        /// Account that attempted to log in.
        username: String,
        /// Login endpoint.
        url: String,
        /// Name of the expected session cookie.
        cookie: &'static str,
        /// User-facing hint.
        suggestion: &'static str,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error contacting {url}: {source}")]
    Transport {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The configured proxy URL was rejected.
    #[error("invalid proxy '{proxy}': {source}")]
    InvalidProxy {
        /// The proxy as configured.
        proxy: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl SessionError {
    /// Creates an authentication failure.
    pub fn authentication(
        username: impl Into<String>,
        url: impl Into<String>,
        cookie: &'static str,
    ) -> Self {
        Self::Authentication {
            username: username.into(),
            url: url.into(),
            cookie,
            suggestion: "Check `username` and `password` in the config file or EBOOK_USERNAME / EBOOK_PASSWORD.",
        }
    }

    /// Creates a transport error.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authentication_error_display() {
        let error = SessionError::authentication(
            "reader@example.com",
            "https://digi4school.at/br/xhr/login",
            "digi4s",
        );
        let msg = error.to_string();
        assert!(msg.starts_with("[AUTH]"), "Expected [AUTH] prefix in: {msg}");
        assert!(msg.contains("reader@example.com"), "Expected username in: {msg}");
        assert!(msg.contains("'digi4s'"), "Expected cookie name in: {msg}");
        assert!(msg.contains("Suggestion:"), "Expected suggestion in: {msg}");
    }
}
