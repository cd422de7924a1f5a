//! `Cookie` header parsing and merging.
//!
//! Redirects are never followed automatically, so cookies set on one host
//! during the handshake have to be threaded into requests for another host
//! by hand. These helpers turn the jar's header for a URL into pairs and
//! merge explicit pairs on top of it.

/// Splits a `Cookie` header value (`a=1; b=2`) into name/value pairs.
///
/// Segments without `=` are skipped. Order is preserved.
#[must_use]
pub fn parse_cookie_header(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|segment| {
            let (name, value) = segment.trim().split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Merges explicit cookie pairs over a base header value.
///
/// A pair in `extra` replaces a base cookie of the same name; new names are
/// appended. Returns `None` when the result would be empty.
#[must_use]
pub fn merge_cookie_header(base: Option<&str>, extra: &[(&str, &str)]) -> Option<String> {
    let mut pairs = base.map(parse_cookie_header).unwrap_or_default();

    for (name, value) in extra {
        if let Some(existing) = pairs.iter_mut().find(|(n, _)| n == name) {
            existing.1 = (*value).to_string();
        } else {
            pairs.push(((*name).to_string(), (*value).to_string()));
        }
    }

    if pairs.is_empty() {
        return None;
    }

    Some(
        pairs
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; "),
    )
}
