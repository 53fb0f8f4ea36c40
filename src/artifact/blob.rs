//! Remote blob storage screenshot backend.
//!
//! Talks to a simple object API:
//!
//! ```text
//! PUT    {endpoint}/{key}         body: bytes     -> {"url": "..."}
//! DELETE {endpoint}/{key}
//! GET    {endpoint}?prefix={p}                    -> {"blobs": [{"url": "...", "pathname": "..."}]}
//! ```
//!
//! Every request carries the credential as a bearer token.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::artifact::{ArtifactError, ArtifactResult, ScreenshotBackend};

/// Response of a successful upload.
#[derive(Debug, Deserialize)]
struct PutResponse {
    url: String,
}

/// One listed object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlobObject {
    pub url: String,
    pub pathname: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    blobs: Vec<BlobObject>,
}

/// Blob storage backend authenticated with a bearer token.
#[derive(Clone)]
pub struct BlobScreenshots {
    client: Client,
    endpoint: Url,
    token: String,
}

impl std::fmt::Debug for BlobScreenshots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobScreenshots")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl BlobScreenshots {
    pub fn new(endpoint: &str, token: impl Into<String>) -> ArtifactResult<Self> {
        let mut endpoint = Url::parse(endpoint)
            .map_err(|e| ArtifactError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            token: token.into(),
        })
    }

    fn object_url(&self, key: &str) -> ArtifactResult<Url> {
        self.endpoint
            .join(key.trim_start_matches('/'))
            .map_err(|_| ArtifactError::InvalidKey(key.to_string()))
    }

    /// Lists every object whose path starts with `prefix`.
    pub async fn list(&self, prefix: &str) -> ArtifactResult<Vec<BlobObject>> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("prefix", prefix)])
            .bearer_auth(&self.token)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json::<ListResponse>().await?.blobs)
    }
}

/// Turns a non-success response into [`ArtifactError::Remote`].
async fn check_status(response: reqwest::Response) -> ArtifactResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(ArtifactError::Remote {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ScreenshotBackend for BlobScreenshots {
    fn name(&self) -> &'static str {
        "blob"
    }

    async fn put(&self, key: &str, bytes: &[u8]) -> ArtifactResult<String> {
        let response = self
            .client
            .put(self.object_url(key)?)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "image/png")
            .header("x-access", "public")
            .body(bytes.to_vec())
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json::<PutResponse>().await?.url)
    }

    async fn delete(&self, key: &str) -> ArtifactResult<()> {
        let response = self
            .client
            .delete(self.object_url(key)?)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        check_status(response).await?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> ArtifactResult<usize> {
        let objects = self.list(prefix).await?;
        for object in &objects {
            self.delete(&object.pathname).await?;
        }

        tracing::debug!("Deleted {} blobs under {}", objects.len(), prefix);
        Ok(objects.len())
    }
}
