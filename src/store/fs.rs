//! Filesystem image store.

use super::{join_url, ImageStore};
use crate::error::StoreError;
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Writes images below a root directory and serves them from a base URL.
///
/// Useful when the directory is exposed by a static file server or synced to
/// a CDN bucket.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn target_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(name);
        let safe = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StoreError::Config(format!(
                "refusing to write outside the store root: {name}"
            )));
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn upload(
        &self,
        name: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<String, StoreError> {
        let path = self.target_path(name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;
        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(join_url(&self.public_base_url, name))
    }

    fn backend(&self) -> &'static str {
        "fs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), "https://cdn.example.org/q/");
        let url = store
            .upload("uploads/abc.png", b"\x89PNG", "image/png")
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example.org/q/uploads/abc.png");
        let written = std::fs::read(dir.path().join("uploads/abc.png")).unwrap();
        assert_eq!(written, b"\x89PNG");
    }

    #[tokio::test]
    async fn rejects_escaping_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path(), "https://cdn");
        let err = store
            .upload("../evil.png", b"x", "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}
