//! Screenshot persistence
//!
//! Screenshots go through a [`ScreenshotStore`]: an ordered chain of
//! [`ScreenshotBackend`]s tried in sequence until one accepts the upload.
//! The chain is built from configuration:
//!
//! ```text
//! use-local-screenshots = true        -> [local]
//! no blob endpoint or no credential   -> [local]            (warns)
//! otherwise                           -> [blob, local]
//! ```
//!
//! A failure of every backend yields no screenshot reference; it never fails
//! the page.

mod blob;
mod local;

pub use blob::{BlobObject, BlobScreenshots};
pub use local::LocalScreenshots;

use crate::config::StorageConfig;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Longest screenshot file stem derived from a URL
pub const MAX_NAME_LEN: usize = 200;

/// Bytes of the URL digest appended to every screenshot name
const NAME_DIGEST_BYTES: usize = 6;

/// Errors raised by screenshot backends
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote storage returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Invalid storage endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Result type for artifact operations
pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// A place screenshots can be written to
#[async_trait]
pub trait ScreenshotBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Stores `bytes` under `key` and returns a reference URL or path
    async fn put(&self, key: &str, bytes: &[u8]) -> ArtifactResult<String>;

    /// Removes the object stored under `key`; missing objects are not an error
    async fn delete(&self, key: &str) -> ArtifactResult<()>;

    /// Removes every object under `prefix`, returning how many were removed
    async fn delete_prefix(&self, prefix: &str) -> ArtifactResult<usize>;
}

/// Derives a filesystem-safe screenshot file name from a normalized URL
///
/// The scheme is dropped, every non-alphanumeric character becomes `_`, and the
/// readable stem is capped at [`MAX_NAME_LEN`] characters. A digest of the
/// full URL is appended so URLs that sanitize or truncate alike stay distinct.
pub fn screenshot_name(url: &Url) -> String {
    let full = url.as_str();
    let without_scheme = full
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(full);

    let mut name: String = without_scheme
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .take(MAX_NAME_LEN)
        .collect();

    let digest = Sha256::digest(full.as_bytes());
    name.push('_');
    name.push_str(&hex::encode(&digest[..NAME_DIGEST_BYTES]));
    name.push_str(".png");
    name
}

/// Ordered fallback chain of screenshot backends, scoped to one crawl
#[derive(Clone)]
pub struct ScreenshotStore {
    crawl_id: String,
    backends: Vec<Arc<dyn ScreenshotBackend>>,
}

impl ScreenshotStore {
    pub fn new(crawl_id: impl Into<String>, backends: Vec<Arc<dyn ScreenshotBackend>>) -> Self {
        Self {
            crawl_id: crawl_id.into(),
            backends,
        }
    }

    /// Builds the chain from configuration, reading the blob credential from
    /// the environment variable named by `blob-token-env`
    pub fn from_config(
        storage: &StorageConfig,
        use_local_screenshots: bool,
        crawl_id: impl Into<String>,
    ) -> ArtifactResult<Self> {
        let token = std::env::var(&storage.blob_token_env).ok();
        Self::with_credential(storage, use_local_screenshots, crawl_id, token)
    }

    /// Builds the chain with an explicit credential
    pub fn with_credential(
        storage: &StorageConfig,
        use_local_screenshots: bool,
        crawl_id: impl Into<String>,
        token: Option<String>,
    ) -> ArtifactResult<Self> {
        let local: Arc<dyn ScreenshotBackend> = Arc::new(LocalScreenshots::new(
            &storage.screenshot_dir,
            &storage.public_path,
        ));

        if use_local_screenshots {
            return Ok(Self::new(crawl_id, vec![local]));
        }

        let token = token.filter(|t| !t.trim().is_empty());
        let (Some(endpoint), Some(token)) = (storage.blob_endpoint.as_deref(), token) else {
            tracing::warn!(
                "Remote screenshot storage not configured ({} unset or no blob endpoint), using local storage",
                storage.blob_token_env
            );
            return Ok(Self::new(crawl_id, vec![local]));
        };

        let remote: Arc<dyn ScreenshotBackend> = Arc::new(BlobScreenshots::new(endpoint, token)?);
        Ok(Self::new(crawl_id, vec![remote, local]))
    }

    pub fn crawl_id(&self) -> &str {
        &self.crawl_id
    }

    /// Names of the backends, in the order they are tried
    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Storage key for the screenshot of `url`
    pub fn key_for(&self, url: &Url) -> String {
        format!("{}/{}", self.crawl_id, screenshot_name(url))
    }

    /// Stores a screenshot, falling through the chain on failure
    ///
    /// Returns `None` when every backend failed.
    pub async fn store(&self, url: &Url, bytes: &[u8]) -> Option<String> {
        let key = self.key_for(url);

        for backend in &self.backends {
            match backend.put(&key, bytes).await {
                Ok(reference) => {
                    tracing::debug!("Stored screenshot for {} via {}", url, backend.name());
                    return Some(reference);
                }
                Err(e) => {
                    tracing::warn!(
                        "Screenshot upload for {} via {} failed: {}",
                        url,
                        backend.name(),
                        e
                    );
                }
            }
        }

        None
    }

    /// Removes every screenshot of this crawl from every backend
    pub async fn purge(&self) -> ArtifactResult<usize> {
        let mut removed = 0;
        let prefix = format!("{}/", self.crawl_id);
        for backend in &self.backends {
            removed += backend.delete_prefix(&prefix).await?;
        }
        Ok(removed)
    }
}
