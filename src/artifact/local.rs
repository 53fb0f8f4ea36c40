//! Local filesystem screenshot backend.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::artifact::{ArtifactError, ArtifactResult, ScreenshotBackend};

/// Writes screenshots under a root directory that is served at `public_path`.
#[derive(Debug, Clone)]
pub struct LocalScreenshots {
    root_dir: PathBuf,
    public_path: String,
}

impl LocalScreenshots {
    pub fn new(root_dir: impl Into<PathBuf>, public_path: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            public_path: public_path.into(),
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Full path for a relative key, rejecting keys that escape the root.
    fn path(&self, key: &str) -> ArtifactResult<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(ArtifactError::InvalidKey(key.to_string()));
        }
        Ok(self.root_dir.join(relative))
    }

    /// Public reference for a key.
    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_path.trim_end_matches('/'), key)
    }
}

#[async_trait]
impl ScreenshotBackend for LocalScreenshots {
    fn name(&self) -> &'static str {
        "local"
    }

    /// Write atomically (write to temp, then rename).
    async fn put(&self, key: &str, bytes: &[u8]) -> ArtifactResult<String> {
        let path = self.path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(self.public_url(key))
    }

    async fn delete(&self, key: &str) -> ArtifactResult<()> {
        match tokio::fs::remove_file(self.path(key)?).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ArtifactError::Io(e)),
        }
    }

    async fn delete_prefix(&self, prefix: &str) -> ArtifactResult<usize> {
        let dir = self.path(prefix.trim_end_matches('/'))?;

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(ArtifactError::Io(e)),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                removed += 1;
            }
        }

        tokio::fs::remove_dir_all(&dir).await?;
        Ok(removed)
    }
}
