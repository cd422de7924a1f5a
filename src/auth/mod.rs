//! Authentication, the shared HTTP session and its cookie jar.
//!
//! A [`Session`] owns the one HTTP client used for a whole run. Logging in
//! turns it into an [`ActiveSession`]; every later operation (handshake,
//! page fetch, shelf listing) requires the active form, so nothing can be
//! attempted with a session whose login failed.

mod cookies;
mod credentials;
mod error;
mod session;

pub use cookies::{merge_cookie_header, parse_cookie_header};
pub use credentials::Credentials;
pub use error::SessionError;
pub use session::{ActiveSession, Session, TransportOptions};
pub(crate) use session::origin_header;
