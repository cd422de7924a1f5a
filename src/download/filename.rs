//! File naming and path resolution for saved pages and assets.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::constants::PAGE_NUMBER_WIDTH;
use crate::shelf::ContentItem;

/// Structural marker in asset URLs naming the directory the asset belongs in.
#[allow(clippy::expect_used)]
static ASSET_DIR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d+/(img|shade)/").expect("asset directory regex is valid") // Static pattern, safe to panic
});

/// File name of page `number`: `00001.svg`, `00002.svg`, ...
#[must_use]
pub fn page_file_name(number: u32, extension: &str) -> String {
    format!("{number:0width$}.{extension}", width = PAGE_NUMBER_WIDTH)
}

/// Directory, relative to the item directory, an asset is saved under.
///
/// The first `<digits>/img/` or `<digits>/shade/` run in the URL path; the
/// item directory itself when there is none.
#[must_use]
pub fn asset_subdir(url: &Url) -> PathBuf {
    ASSET_DIR_PATTERN
        .find(url.path())
        .map(|m| {
            m.as_str()
                .split('/')
                .filter(|segment| !segment.is_empty())
                .collect::<PathBuf>()
        })
        .unwrap_or_default()
}

/// File name an asset is saved as: its last URL path segment, sanitized.
#[must_use]
pub fn asset_file_name(url: &Url) -> Option<String> {
    let last = url.path_segments()?.next_back()?;
    if last.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last).map_or_else(|_| last.to_string(), |d| d.into_owned());
    Some(sanitize_filename(&decoded))
}

/// Directory name for one item: `<display name>_<id>`, both sanitized.
///
/// The id keeps items whose names sanitize alike apart. Only the id is used
/// when the name sanitizes to nothing.
#[must_use]
pub fn item_dir_name(item: &ContentItem) -> String {
    let id = sanitize_filename(&item.id);
    let from_name = sanitize_filename_component(&item.name);
    if from_name.is_empty() || !is_safe_filename_segment(&from_name) {
        id
    } else {
        format!("{from_name}_{id}")
    }
}

pub(crate) fn sanitize_filename_component(value: &str) -> String {
    let mut out = String::new();
    let mut prev_sep = false;
    for ch in value.chars() {
        let mapped = match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\'' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') => c,
            _ => '_',
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }
    out.trim_matches('_').to_string()
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
