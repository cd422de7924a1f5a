//! Login credentials.

use std::fmt;

/// Username and password for the platform login.
///
/// The password is intentionally redacted in Debug output to prevent
/// accidental logging of sensitive data.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account e-mail address.
    pub username: String,
    /// Account password (sensitive, never log).
    password: String,
}

impl Credentials {
    /// Creates a credentials pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns the password.
    ///
    /// Avoid logging the return value.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Whether both username and password are non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}
