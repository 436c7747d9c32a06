//! Data-URI image store for dry runs.

use super::ImageStore;
use crate::error::StoreError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Keeps images inside the output as `data:` URIs; nothing is written anywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineImageStore;

/// Encode `bytes` as a base64 data URI.
fn data_uri(bytes: &[u8], content_type: &str) -> String {
    format!("data:{};base64,{}", content_type, STANDARD.encode(bytes))
}

#[async_trait]
impl ImageStore for InlineImageStore {
    async fn upload(
        &self,
        _name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, StoreError> {
        Ok(data_uri(bytes, content_type))
    }

    fn backend(&self) -> &'static str {
        "inline"
    }
}
