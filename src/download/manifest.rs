//! Per-item manifest written next to the saved pages.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::constants::MANIFEST_FILE_NAME;
use super::error::ItemError;
use crate::shelf::ContentItem;

/// Summary of one archived item, stored as `item.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemManifest {
    /// Item identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Number of pages saved.
    pub pages: u32,
    /// Sub-path the pages were served from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_path: Option<String>,
    /// Completion time, seconds since the Unix epoch.
    pub completed_at: u64,
}

impl ItemManifest {
    /// Manifest for an item completed now.
    #[must_use]
    pub fn new(item: &ContentItem, pages: u32, sub_path: Option<&str>) -> Self {
        let completed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            id: item.id.clone(),
            name: item.name.clone(),
            pages,
            sub_path: sub_path.map(str::to_string),
            completed_at,
        }
    }

    /// Writes the manifest into `dir`, returning its path.
    ///
    /// # Errors
    ///
    /// Returns [`ItemError`] if serialization or the write fails.
    pub async fn write_to(&self, dir: &Path) -> Result<PathBuf, ItemError> {
        let path = dir.join(MANIFEST_FILE_NAME);
        let json = serde_json::to_string_pretty(self).map_err(|source| ItemError::Manifest {
            path: path.clone(),
            source,
        })?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| ItemError::io(&path, e))?;
        Ok(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_to_produces_readable_json() {
        let temp_dir = TempDir::new().unwrap();
        let item = ContentItem::new("abc", "Physik 2");
        let manifest = ItemManifest::new(&item, 3, Some("1"));

        let path = manifest.write_to(temp_dir.path()).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "item.json");

        let parsed: ItemManifest =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, manifest);
        assert!(parsed.completed_at > 0);
    }

    #[test]
    fn test_sub_path_omitted_when_absent() {
        let item = ContentItem::new("abc", "Physik 2");
        let json = serde_json::to_string(&ItemManifest::new(&item, 0, None)).unwrap();
        assert!(!json.contains("sub_path"));
    }
}
