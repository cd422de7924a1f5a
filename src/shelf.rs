//! Content items and the shelf listing.

use std::collections::HashSet;
use std::sync::LazyLock;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE, REFERER};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::auth::ActiveSession;
use crate::user_agent;

#[allow(clippy::expect_used)]
static ITEM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[data-code]").expect("item selector is valid"));

#[allow(clippy::expect_used)]
static TITLE_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("title selector is valid"));

/// One item on the shelf.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentItem {
    /// Code used in the landing URL.
    pub id: String,
    /// Human-readable title.
    pub name: String,
}

impl ContentItem {
    /// Creates an item.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Errors fetching the shelf page.
#[derive(Debug, Error)]
pub enum ShelfError {
    /// Network-level error.
    #[error("network error fetching shelf {url}: {source}")]
    Transport {
        /// Shelf URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The shelf answered with a non-success status.
    #[error("HTTP {status} fetching shelf {url}")]
    HttpStatus {
        /// Shelf URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },
}

/// Parses the items out of a shelf page.
///
/// Every `a[data-code]` element is one item; its nested `h1` is the name,
/// the code is used when there is none. Repeated codes are listed once.
///
/// # Examples
///
/// ```
/// use ebook_archiver_core::parse_shelf;
///
/// let html = r#"<div id="shelf"><a data-code="23s5agvhgkxf"><h1>Mathematik 1</h1></a></div>"#;
/// let items = parse_shelf(html);
/// assert_eq!(items[0].id, "23s5agvhgkxf");
/// assert_eq!(items[0].name, "Mathematik 1");
/// ```
#[must_use]
pub fn parse_shelf(html: &str) -> Vec<ContentItem> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    document
        .select(&ITEM_SELECTOR)
        .filter_map(|element| {
            let id = element.value().attr("data-code")?.trim();
            if id.is_empty() || !seen.insert(id.to_string()) {
                return None;
            }
            let name = item_title(element).unwrap_or_else(|| id.to_string());
            Some(ContentItem::new(id, name))
        })
        .collect()
}

fn item_title(element: ElementRef<'_>) -> Option<String> {
    let title = element.select(&TITLE_SELECTOR).next()?;
    let text = title
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (!text.is_empty()).then_some(text)
}

/// Fetches the shelf of the logged-in user.
///
/// # Errors
///
/// Returns [`ShelfError`] if the page cannot be fetched.
#[instrument(skip(session), fields(user = %session.username()))]
pub async fn list_shelf(session: &ActiveSession) -> Result<Vec<ContentItem>, ShelfError> {
    let endpoints = session.endpoints();
    let url = endpoints.shelf.clone();
    let mut request = session
        .client()
        .get(url.clone())
        .header(ACCEPT, user_agent::ACCEPT_DOCUMENT)
        .header(ACCEPT_LANGUAGE, user_agent::ACCEPT_LANGUAGE)
        .header(REFERER, endpoints.origin.as_str());
    if let Some(cookie) = session.cookie_header_for(&url, &[]) {
        request = request.header(COOKIE, cookie);
    }

    let response = request.send().await.map_err(|source| ShelfError::Transport {
        url: url.to_string(),
        source,
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(ShelfError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    let body = response.text().await.map_err(|source| ShelfError::Transport {
        url: url.to_string(),
        source,
    })?;

    let items = parse_shelf(&body);
    debug!(bytes = body.len(), "shelf page parsed");
    info!(items = items.len(), "shelf listed");
    Ok(items)
}
