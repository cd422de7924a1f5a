//! Per-item access obtained from the handshake.

use std::fmt;

use crate::platform::{BOOK_COOKIE, PAGE_COOKIE};

/// The two content-session cookies plus the optional sub-path of one item.
///
/// Both cookie values are non-empty by construction. An instance belongs to a
/// single item and is dropped once that item's pages are fetched; another
/// item may need a different sub-path.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedAccess {
    book_cookie: String,
    page_cookie: String,
    sub_path: Option<String>,
}

impl ResolvedAccess {
    /// Creates the access bundle, or `None` when a cookie value is empty.
    #[must_use]
    pub fn new(
        book_cookie: impl Into<String>,
        page_cookie: impl Into<String>,
        sub_path: Option<String>,
    ) -> Option<Self> {
        let book_cookie = book_cookie.into();
        let page_cookie = page_cookie.into();
        if book_cookie.is_empty() || page_cookie.is_empty() {
            return None;
        }
        Some(Self {
            book_cookie,
            page_cookie,
            sub_path: sub_path.filter(|s| !s.is_empty()),
        })
    }

    /// Value of the book cookie.
    #[must_use]
    pub fn book_cookie(&self) -> &str {
        &self.book_cookie
    }

    /// Value of the page cookie.
    #[must_use]
    pub fn page_cookie(&self) -> &str {
        &self.page_cookie
    }

    /// Sub-path between the item root and its pages, if any.
    #[must_use]
    pub fn sub_path(&self) -> Option<&str> {
        self.sub_path.as_deref()
    }

    /// Cookie pairs to attach to page and asset requests.
    #[must_use]
    pub fn cookie_pairs(&self) -> [(&str, &str); 2] {
        [
            (BOOK_COOKIE, self.book_cookie.as_str()),
            (PAGE_COOKIE, self.page_cookie.as_str()),
        ]
    }
}

// Cookie values are credentials; keep them out of logs.
impl fmt::Debug for ResolvedAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedAccess")
            .field("book_cookie", &"[REDACTED]")
            .field("page_cookie", &"[REDACTED]")
            .field("sub_path", &self.sub_path)
            .finish()
    }
}
