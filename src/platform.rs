//! Endpoint layout and cookie names of the e-book platform.
//!
//! Production hosts are the default. Every endpoint can be re-rooted onto a
//! single base URL with [`PlatformEndpoints::with_base`], which is how the
//! integration tests point the whole pipeline at a mock server.

use url::Url;

/// Cookie set by a successful login; identifies the user session.
pub const SESSION_COOKIE: &str = "digi4s";

/// First content-session cookie issued by the second relay hop.
pub const BOOK_COOKIE: &str = "digi4b";

/// Second content-session cookie issued by the second relay hop.
pub const PAGE_COOKIE: &str = "digi4p";

/// Sub-path used for items whose pages live one directory below the item root.
pub const DEFAULT_SUB_PATH: &str = "1";

/// Marker in the sub-path probe response meaning pages sit at the item root.
pub const DEFAULT_NO_SUBPATH_MARKER: &str = "IDRViewer";

/// Extension of page documents served by the reader.
pub const DEFAULT_PAGE_EXTENSION: &str = "svg";

const PRODUCTION_ORIGIN: &str = "https://digi4school.at/";
const PRODUCTION_RELAY_ONE: &str = "https://kat.digi4school.at/lti";
const PRODUCTION_READER_ORIGIN: &str = "https://a.digi4school.at/";

/// All URLs the archiver talks to, plus the reader's layout conventions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformEndpoints {
    /// Main site origin; login session cookie scope, `Origin`/`Referer` value.
    pub origin: Url,
    /// XHR login endpoint.
    pub login: Url,
    /// Logout endpoint.
    pub logout: Url,
    /// Shelf page listing the user's items.
    pub shelf: Url,
    /// Base of item landing pages (`{landing_base}{item id}`), ends with `/`.
    pub landing_base: Url,
    /// First relay hop.
    pub relay_one: Url,
    /// Second relay hop.
    pub relay_two: Url,
    /// Origin of the reader host; `Origin` header for the second hop.
    pub reader_origin: Url,
    /// Base of page documents (`{content_base}{item id}/...`), ends with `/`.
    pub content_base: Url,
    /// Page document extension without the dot.
    pub page_extension: String,
    /// Marker string checked in the sub-path probe response.
    pub no_subpath_marker: String,
    /// Sub-path applied when the marker is absent.
    pub sub_path: String,
}

impl Default for PlatformEndpoints {
    fn default() -> Self {
        let origin = parse_static(PRODUCTION_ORIGIN);
        let reader_origin = parse_static(PRODUCTION_READER_ORIGIN);
        Self {
            login: join_static(&origin, "br/xhr/login"),
            logout: join_static(&origin, "br/logout"),
            shelf: join_static(&origin, "ebooks"),
            landing_base: join_static(&origin, "ebook/"),
            relay_one: parse_static(PRODUCTION_RELAY_ONE),
            relay_two: join_static(&reader_origin, "lti"),
            content_base: join_static(&reader_origin, "ebook/"),
            origin,
            reader_origin,
            page_extension: DEFAULT_PAGE_EXTENSION.to_string(),
            no_subpath_marker: DEFAULT_NO_SUBPATH_MARKER.to_string(),
            sub_path: DEFAULT_SUB_PATH.to_string(),
        }
    }
}

impl PlatformEndpoints {
    /// Re-roots every endpoint under one base URL, keeping the production paths.
    ///
    /// The two relay hops are mapped to `{base}kat/lti` and `{base}a/lti` and
    /// pages to `{base}a/ebook/` so each endpoint stays distinguishable.
    #[must_use]
    pub fn with_base(base: &Url) -> Self {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let reader_origin = join_static(&base, "a/");
        Self {
            login: join_static(&base, "br/xhr/login"),
            logout: join_static(&base, "br/logout"),
            shelf: join_static(&base, "ebooks"),
            landing_base: join_static(&base, "ebook/"),
            relay_one: join_static(&base, "kat/lti"),
            relay_two: join_static(&reader_origin, "lti"),
            content_base: join_static(&reader_origin, "ebook/"),
            origin: base,
            reader_origin,
            ..Self::default()
        }
    }

    /// Landing page of an item.
    ///
    /// Returns `None` when the identifier cannot form a URL path segment.
    #[must_use]
    pub fn landing_url(&self, item_id: &str) -> Option<Url> {
        self.landing_base.join(item_id).ok()
    }

    /// Base directory of an item's pages, including the optional sub-path.
    #[must_use]
    pub fn item_content_base(&self, item_id: &str, sub_path: Option<&str>) -> Option<Url> {
        let relative = match sub_path {
            Some(sub) => format!("{item_id}/{sub}/"),
            None => format!("{item_id}/"),
        };
        self.content_base.join(&relative).ok()
    }

    /// URL of one page document.
    #[must_use]
    pub fn page_url(&self, item_base: &Url, page_number: u32) -> Option<Url> {
        item_base
            .join(&format!("{page_number}.{}", self.page_extension))
            .ok()
    }
}

// Only used with the compile-time constants above.
#[allow(clippy::expect_used)]
fn parse_static(raw: &str) -> Url {
    Url::parse(raw).expect("static platform URL is valid")
}

#[allow(clippy::expect_used)]
fn join_static(base: &Url, path: &str) -> Url {
    base.join(path).expect("static platform path is valid")
}
