//! Object-storage image store over HTTP.
//!
//! Speaks the bucket/object REST dialect used by hosted backends:
//!
//! ```text
//! POST {endpoint}/object/{bucket}/{name}          (upload, bearer auth)
//! GET  {endpoint}/object/public/{bucket}/{name}   (public URL)
//! ```

use super::{join_url, ImageStore};
use crate::error::StoreError;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Uploads images to a public object-storage bucket.
#[derive(Clone)]
pub struct HttpImageStore {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
    api_key: String,
    public_base_url: Option<String>,
}

impl fmt::Debug for HttpImageStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpImageStore")
            .field("endpoint", &self.endpoint)
            .field("bucket", &self.bucket)
            .field("api_key", &"<redacted>")
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}

impl HttpImageStore {
    /// Create a store for `bucket` at `endpoint` (e.g. `https://x.example.co/storage/v1`).
    pub fn new(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        api_key: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let endpoint = endpoint.into();
        let bucket = bucket.into();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(StoreError::Config(format!(
                "endpoint must be an HTTP(S) URL, got '{endpoint}'"
            )));
        }
        if bucket.trim().is_empty() {
            return Err(StoreError::Config("bucket name is empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|e| StoreError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket,
            api_key: api_key.into(),
            public_base_url: None,
        })
    }

    /// Serve objects from a CDN instead of the storage endpoint.
    pub fn with_public_base_url(mut self, url: impl Into<String>) -> Self {
        self.public_base_url = Some(url.into());
        self
    }

    fn upload_url(&self, name: &str) -> String {
        join_url(&format!("{}/object/{}", self.endpoint, self.bucket), name)
    }

    /// Public URL an object with `name` resolves to.
    pub fn public_url(&self, name: &str) -> String {
        match &self.public_base_url {
            Some(base) => join_url(base, name),
            None => join_url(
                &format!("{}/object/public/{}", self.endpoint, self.bucket),
                name,
            ),
        }
    }
}

#[async_trait]
impl ImageStore for HttpImageStore {
    async fn upload(
        &self,
        name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, StoreError> {
        let url = self.upload_url(name);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header("x-upsert", "false")
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Http {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Uploaded {} ({} bytes) to bucket {}", name, bytes.len(), self.bucket);
        Ok(self.public_url(name))
    }

    fn backend(&self) -> &'static str {
        "http"
    }
}
