//! In-memory image store.

use super::ImageStore;
use crate::error::StoreError;
use async_trait::async_trait;
use std::sync::Mutex;

/// One image held by [`MemoryImageStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Records uploads in memory and returns `memory://{name}` URLs.
///
/// Callers that persist images after review, and tests, use this to inspect
/// exactly what the relocator produced.
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    images: Mutex<Vec<StoredImage>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything stored so far, in upload completion order.
    pub fn images(&self) -> Vec<StoredImage> {
        self.images
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.images.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ImageStore for MemoryImageStore {
    async fn upload(
        &self,
        name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, StoreError> {
        let mut images = self
            .images
            .lock()
            .map_err(|_| StoreError::Request("memory store lock poisoned".into()))?;
        images.push(StoredImage {
            name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: bytes.to_vec(),
        });
        Ok(format!("memory://{name}"))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_uploads() {
        let store = MemoryImageStore::new();
        assert!(store.is_empty());
        let url = store.upload("a.png", b"1", "image/png").await.unwrap();
        assert_eq!(url, "memory://a.png");
        let images = store.images();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].content_type, "image/png");
    }
}
