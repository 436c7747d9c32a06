//! Image stores: where relocated images end up.
//!
//! The parser never talks to storage directly. Every `parse*` call receives a
//! `&dyn ImageStore`, and the relocator hands it one image at a time together
//! with a freshly generated, collision-free file name.
//!
//! | Store | URL returned |
//! |-------|--------------|
//! | [`FsImageStore`] | `{public_base_url}/{name}` |
//! | [`HttpImageStore`] | `{endpoint}/object/public/{bucket}/{name}` |
//! | [`InlineImageStore`] | `data:{type};base64,…` |
//! | [`MemoryImageStore`] | `memory://{name}` |

mod fs;
mod http;
mod inline;
mod memory;

pub use fs::FsImageStore;
pub use http::HttpImageStore;
pub use inline::InlineImageStore;
pub use memory::{MemoryImageStore, StoredImage};

use crate::error::StoreError;
use async_trait::async_trait;

/// Destination for embedded images.
///
/// Implementations must be safe to call concurrently; one document's images
/// are uploaded in parallel.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Persist `bytes` under `name` and return a publicly resolvable URL.
    ///
    /// `name` is unique per call and may contain `/` separated folders.
    async fn upload(
        &self,
        name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, StoreError>;

    /// Short backend identifier used in logs.
    fn backend(&self) -> &'static str;
}

/// Join a base URL and a relative object name with exactly one `/`.
pub(crate) fn join_url(base: &str, name: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        name.trim_start_matches('/')
    )
}
