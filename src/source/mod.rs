use reqwest::StatusCode;
use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::SourceFile;
use crate::error::{Result, ReviewError};
use crate::reference::RepositoryReference;

/// Maximum number of files sent to the reviewer.
pub const MAX_FILES: usize = 5;

/// Files of this size or larger are skipped.
pub const MAX_FILE_SIZE_BYTES: u64 = 100_000;

/// Name suffixes (extensions or whole basenames) eligible for review.
pub const SUPPORTED_SUFFIXES: [&str; 14] = [
    ".js",
    ".ts",
    ".jsx",
    ".tsx",
    ".py",
    ".go",
    ".java",
    ".html",
    ".css",
    ".scss",
    ".json",
    "Dockerfile",
    ".yml",
    ".yaml",
];

/// Body substituted for a file whose content could not be fetched.
pub const FETCH_FAILED_MARKER: &str = "// Error: Failed to fetch content for this file.";

/// One entry of the hosting API's root contents listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ListingItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Whether a file name matches the allow-list.
pub fn is_supported(name: &str) -> bool {
    SUPPORTED_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Apply the selection policy to a listing, keeping the listing's order.
///
/// Plain files only, under the size ceiling, on the allow-list, then the
/// first [`MAX_FILES`] survivors.
pub fn select_files(listing: Vec<ListingItem>) -> Vec<ListingItem> {
    listing
        .into_iter()
        .filter(|item| item.kind == "file")
        .filter(|item| item.size < MAX_FILE_SIZE_BYTES)
        .filter(|item| is_supported(&item.name))
        .take(MAX_FILES)
        .collect()
}

/// Resolves a repository's root listing and fetches a bounded sample of files.
#[derive(Clone)]
pub struct SourceSelector {
    http: reqwest::Client,
    api_base: String,
}

impl SourceSelector {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the root contents listing for `reference`.
    pub async fn list_root(&self, reference: &RepositoryReference) -> Result<Vec<ListingItem>> {
        let url = format!(
            "{}/repos/{}/{}/contents",
            self.api_base,
            reference.owner(),
            reference.name()
        );
        debug!(%url, "fetching repository listing");

        let resp = self.http.get(&url).send().await?;
        match resp.status() {
            StatusCode::NOT_FOUND => {
                return Err(ReviewError::NotFound {
                    repo: reference.key(),
                });
            }
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                return Err(ReviewError::RateLimited);
            }
            status if !status.is_success() => {
                return Err(ReviewError::HostingApi {
                    status: status.as_u16(),
                });
            }
            _ => {}
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ReviewError::ListingParse(e.to_string()))
    }

    /// Select and fetch the files to review, in listing order.
    ///
    /// Fails with [`ReviewError::NoSupportedFiles`] when nothing survives the
    /// filter. Individual content fetches never fail the batch.
    pub async fn select(&self, reference: &RepositoryReference) -> Result<Vec<SourceFile>> {
        let listing = self.list_root(reference).await?;
        let total = listing.len();
        let selected = select_files(listing);
        debug!(repo = %reference, total, selected = selected.len(), "filtered listing");

        if selected.is_empty() {
            return Err(ReviewError::NoSupportedFiles);
        }

        Ok(self.fetch_contents(selected).await)
    }

    /// Fetch every item's content concurrently and wait for all of them.
    async fn fetch_contents(&self, items: Vec<ListingItem>) -> Vec<SourceFile> {
        let mut set = JoinSet::new();
        for (idx, item) in items.iter().enumerate() {
            let client = self.http.clone();
            let url = item.download_url.clone();
            let path = item.path.clone();
            set.spawn(async move {
                (idx, fetch_file_content(&client, url.as_deref(), &path).await)
            });
        }

        let mut contents = vec![FETCH_FAILED_MARKER.to_string(); items.len()];
        while let Some(res) = set.join_next().await {
            match res {
                Ok((idx, content)) => contents[idx] = content,
                Err(e) => warn!(%e, "file fetch task failed"),
            }
        }

        items
            .into_iter()
            .zip(contents)
            .map(|(item, content)| SourceFile {
                path: item.path,
                content,
            })
            .collect()
    }
}

/// Fetch one file body, falling back to [`FETCH_FAILED_MARKER`].
async fn fetch_file_content(client: &reqwest::Client, url: Option<&str>, path: &str) -> String {
    let Some(url) = url else {
        warn!(path, "listing item has no download url");
        return FETCH_FAILED_MARKER.to_string();
    };

    let resp = match client.get(url).send().await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(path, %e, "failed to fetch file content");
            return FETCH_FAILED_MARKER.to_string();
        }
    };

    if !resp.status().is_success() {
        warn!(path, status = resp.status().as_u16(), "failed to fetch file content");
        return FETCH_FAILED_MARKER.to_string();
    }

    match resp.text().await {
        Ok(text) => text,
        Err(e) => {
            warn!(path, %e, "failed to read file content");
            FETCH_FAILED_MARKER.to_string()
        }
    }
}
