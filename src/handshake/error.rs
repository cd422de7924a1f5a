//! Error types for the relay handshake.

use std::fmt;

use thiserror::Error;

/// Named stages of the handshake state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeStage {
    /// Fetching the item landing page.
    Landing,
    /// Posting to the first relay.
    RelayOne,
    /// Posting to the second relay and probing its redirect target.
    RelayTwo,
    /// Reading the content cookies from the second relay's response.
    CookieExtraction,
}

impl HandshakeStage {
    /// Returns the stable stage label used in logs and error messages.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::RelayOne => "relay1",
            Self::RelayTwo => "relay2",
            Self::CookieExtraction => "cookie-extraction",
        }
    }
}

impl fmt::Display for HandshakeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What went wrong inside a stage.
#[derive(Debug, Error)]
pub enum HandshakeFailure {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error contacting {url}: {source}")]
    Transport {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The hop answered with a client or server error status.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response carried no hidden form fields to relay.
    #[error("no hidden form fields in response from {url}")]
    NoParameters {
        /// The URL whose response was empty of fields.
        url: String,
    },

    /// A content cookie was not issued.
    #[error("cookie '{name}' missing from relay response")]
    MissingCookie {
        /// Name of the missing cookie.
        name: &'static str,
    },

    /// A URL could not be formed from the item id or a `Location` header.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The offending URL text.
        url: String,
    },
}

/// A failed handshake, tagged with the stage that failed.
///
/// Aborts only the item it belongs to.
#[derive(Debug, Error)]
#[error("handshake failed at stage {stage} for item {item}: {failure}")]
pub struct HandshakeError {
    /// Stage that failed.
    pub stage: HandshakeStage,
    /// Identifier of the item being unlocked.
    pub item: String,
    /// Cause.
    #[source]
    pub failure: HandshakeFailure,
}

impl HandshakeError {
    /// Creates a stage failure.
    pub fn new(stage: HandshakeStage, item: impl Into<String>, failure: HandshakeFailure) -> Self {
        Self {
            stage,
            item: item.into(),
            failure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_labels() {
        assert_eq!(HandshakeStage::Landing.to_string(), "landing");
        assert_eq!(HandshakeStage::RelayOne.to_string(), "relay1");
        assert_eq!(HandshakeStage::RelayTwo.to_string(), "relay2");
        assert_eq!(
            HandshakeStage::CookieExtraction.to_string(),
            "cookie-extraction"
        );
    }

    #[test]
    fn test_handshake_error_display_names_stage_and_item() {
        let error = HandshakeError::new(
            HandshakeStage::CookieExtraction,
            "23s5agvhgkxf",
            HandshakeFailure::MissingCookie { name: "digi4p" },
        );
        let msg = error.to_string();
        assert!(msg.contains("cookie-extraction"), "Expected stage in: {msg}");
        assert!(msg.contains("23s5agvhgkxf"), "Expected item in: {msg}");
        assert!(msg.contains("digi4p"), "Expected cookie name in: {msg}");
    }

    #[test]
    fn test_http_status_failure_display() {
        let failure = HandshakeFailure::HttpStatus {
            url: "https://kat.digi4school.at/lti".to_string(),
            status: 403,
        };
        assert_eq!(
            failure.to_string(),
            "HTTP 403 from https://kat.digi4school.at/lti"
        );
    }
}
