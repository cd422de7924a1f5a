//! Browser identification shared by every platform request.
//!
//! The platform serves its reader and relay forms only to browser-like clients,
//! so all traffic uses one browser User-Agent and the accept headers a browser
//! sends for the corresponding request kind.

/// Browser User-Agent sent with every request.
pub(crate) const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; rv:129.0) Gecko/20100101 Firefox/129.0";

/// `Accept` value for document navigations (landing page, relay forms, pages).
pub(crate) const ACCEPT_DOCUMENT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,\
    image/avif,image/webp,image/png,image/svg+xml,*/*;q=0.8";

/// `Accept` value for the XHR login call.
pub(crate) const ACCEPT_XHR: &str = "text/plain, */*; q=0.01";

/// `Accept-Language` value for all requests.
pub(crate) const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// Content type of relay and login bodies.
pub(crate) const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";
