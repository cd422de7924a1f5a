//! The three-hop relay handshake that unlocks an item's pages.
//!
//! The platform hands out page-serving cookies only after the browser has
//! relayed two auto-submitting HTML forms between three hosts. Each form is a
//! list of hidden inputs whose values are signed server-side; the client only
//! copies them from one response into the next request.
//!
//! # Stages
//!
//! 1. [`HandshakeStage::Landing`] - GET the item landing page, extract fields
//! 2. [`HandshakeStage::RelayOne`] - POST the known fields to the first relay
//! 3. [`HandshakeStage::RelayTwo`] - POST the next field set to the second relay,
//!    probe the redirect target for the sub-path
//! 4. [`HandshakeStage::CookieExtraction`] - both content cookies must be present
//!
//! # Example
//!
//! ```no_run
//! use ebook_archiver_core::{ContentItem, Credentials, HandshakeEngine, PlatformEndpoints, Session, TransportOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new(
//!     Credentials::new("reader@example.com", "secret"),
//!     PlatformEndpoints::default(),
//!     &TransportOptions::default(),
//! )?;
//! let session = session.login().await?;
//! let item = ContentItem::new("23s5agvhgkxf", "Mathematik 1");
//! let access = HandshakeEngine::new(&session).resolve(&item).await?;
//! println!("sub-path: {:?}", access.sub_path());
//! # Ok(())
//! # }
//! ```

mod access;
mod engine;
mod error;
pub mod fields;
mod params;

pub use access::ResolvedAccess;
pub use engine::HandshakeEngine;
pub use error::{HandshakeError, HandshakeFailure, HandshakeStage};
pub use params::{HandshakeParameters, extract_hidden_fields};
