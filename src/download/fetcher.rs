//! Sequential page fetch loop.
//!
//! Pages of an unlocked item are requested as `1.svg`, `2.svg`, ... until the
//! server answers 404. Each page body is scanned for embedded images, those
//! are streamed to disk first, then the page itself is written.

use std::path::Path;

use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE, REFERER};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use super::assets::find_embedded_assets;
use super::error::FetchError;
use super::filename::{asset_file_name, asset_subdir, page_file_name};
use super::progress::ProgressCounters;
use crate::auth::ActiveSession;
use crate::handshake::ResolvedAccess;
use crate::shelf::ContentItem;
use crate::user_agent;

/// Result of requesting one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page and its assets were written.
    Saved {
        /// Number of distinct assets the page embedded.
        assets: usize,
    },
    /// The server has no such page; the previous one was the last.
    NotFound,
}

/// Downloads the pages of unlocked items.
#[derive(Debug, Clone, Copy)]
pub struct ContentFetcher<'a> {
    session: &'a ActiveSession,
}

impl<'a> ContentFetcher<'a> {
    /// Creates a fetcher bound to a session.
    #[must_use]
    pub fn new(session: &'a ActiveSession) -> Self {
        Self { session }
    }

    /// Fetches every page of `item` into `dest` and returns how many were saved.
    ///
    /// A 404 ends the sequence successfully. `progress` is bumped once per
    /// saved page.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on any other error status, transport failure
    /// or write failure, for a page or one of its assets.
    #[instrument(skip(self, item, access, dest, progress), fields(item = %item.id))]
    pub async fn fetch_all(
        &self,
        item: &ContentItem,
        access: &ResolvedAccess,
        dest: &Path,
        progress: &ProgressCounters,
    ) -> Result<u32, FetchError> {
        let base = self
            .session
            .endpoints()
            .item_content_base(&item.id, access.sub_path())
            .ok_or_else(|| FetchError::invalid_url(&item.id))?;
        tokio::fs::create_dir_all(dest)
            .await
            .map_err(|e| FetchError::io(dest, e))?;

        let mut saved = 0u32;
        loop {
            let number = saved + 1;
            match self.fetch_page(&base, number, access, dest).await? {
                PageOutcome::Saved { assets } => {
                    saved = number;
                    progress.increment_pages();
                    debug!(page = number, assets, "page saved");
                }
                PageOutcome::NotFound => break,
            }
        }

        info!(pages = saved, dest = %dest.display(), "all pages fetched");
        Ok(saved)
    }

    /// Fetches page `number` below `base` and saves it with its assets.
    ///
    /// # Errors
    ///
    /// Same as [`fetch_all`](Self::fetch_all). Nothing is written for a 404.
    #[instrument(skip(self, base, access, dest))]
    pub async fn fetch_page(
        &self,
        base: &Url,
        number: u32,
        access: &ResolvedAccess,
        dest: &Path,
    ) -> Result<PageOutcome, FetchError> {
        let endpoints = self.session.endpoints();
        let url = endpoints
            .page_url(base, number)
            .ok_or_else(|| FetchError::invalid_url(format!("{base}{number}")))?;

        let response = self.get(&url, access).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(page = number, "page not found, sequence complete");
            return Ok(PageOutcome::NotFound);
        }
        if !status.is_success() {
            return Err(FetchError::http_status(url.as_str(), status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(url.as_str(), e))?;
        let assets = find_embedded_assets(&String::from_utf8_lossy(&body), &url)?;
        for asset in &assets {
            self.download_asset(asset, access, dest).await?;
        }

        let path = dest.join(page_file_name(number, &endpoints.page_extension));
        tokio::fs::write(&path, &body)
            .await
            .map_err(|e| FetchError::io(&path, e))?;

        Ok(PageOutcome::Saved {
            assets: assets.len(),
        })
    }

    #[instrument(level = "debug", skip(self, url, access, dest), fields(url = %url))]
    async fn download_asset(
        &self,
        url: &Url,
        access: &ResolvedAccess,
        dest: &Path,
    ) -> Result<u64, FetchError> {
        let dir = dest.join(asset_subdir(url));
        let name = asset_file_name(url).ok_or_else(|| FetchError::invalid_url(url.as_str()))?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| FetchError::io(&dir, e))?;

        let response = self.get(url, access).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url.as_str(), status.as_u16()));
        }

        let path = dir.join(name);
        let mut file = File::create(&path)
            .await
            .map_err(|e| FetchError::io(&path, e))?;
        let result = stream_to_file(&mut file, response, url, &path).await;
        if result.is_err() {
            debug!(path = %path.display(), "cleaning up partial asset after error");
            let _ = tokio::fs::remove_file(&path).await;
        }
        result
    }

    async fn get(
        &self,
        url: &Url,
        access: &ResolvedAccess,
    ) -> Result<reqwest::Response, FetchError> {
        let mut request = self
            .session
            .client()
            .get(url.clone())
            .header(ACCEPT, user_agent::ACCEPT_DOCUMENT)
            .header(ACCEPT_LANGUAGE, user_agent::ACCEPT_LANGUAGE)
            .header(REFERER, self.session.endpoints().reader_origin.as_str());
        if let Some(cookie) = self.session.cookie_header_for(url, &access.cookie_pairs()) {
            request = request.header(COOKIE, cookie);
        }
        request
            .send()
            .await
            .map_err(|e| FetchError::transport(url.as_str(), e))
    }
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &Url,
    file_path: &Path,
) -> Result<u64, FetchError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| FetchError::transport(url.as_str(), e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| FetchError::io(file_path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| FetchError::io(file_path, e))?;

    Ok(bytes_written)
}
