//! Embedded asset discovery in page bodies.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use url::Url;

use super::error::FetchError;

/// Raster images referenced from an SVG page.
#[allow(clippy::expect_used)]
static ASSET_REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"xlink:href="([^"]+\.(jpg|png))""#).expect("asset reference regex is valid") // Static pattern, safe to panic
});

/// Finds every image a page embeds, resolved against the page URL.
///
/// References are returned in first-seen order with duplicates removed, so
/// each asset is downloaded once per page. References that resolve to
/// another origin than the page are skipped; assets are fetched with the
/// session cookies attached.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] if a reference cannot be resolved.
pub fn find_embedded_assets(body: &str, page_url: &Url) -> Result<Vec<Url>, FetchError> {
    let mut seen = HashSet::new();
    let mut assets = Vec::new();
    for caps in ASSET_REFERENCE_PATTERN.captures_iter(body) {
        let reference = &caps[1];
        if !seen.insert(reference.to_string()) {
            continue;
        }
        let resolved = page_url
            .join(reference)
            .map_err(|_| FetchError::invalid_url(reference))?;
        if resolved.origin() != page_url.origin() {
            debug!(asset = %resolved, "skipping asset on a foreign origin");
            continue;
        }
        assets.push(resolved);
    }
    Ok(assets)
}
