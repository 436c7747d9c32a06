//! Image relocation: embedded picture bytes → stored object → public URL.
//!
//! Every image gets a random UUID file name with an extension derived from
//! its content type, so uploads never collide, whether they come from the
//! same document or from concurrent parses. Identical pictures appearing
//! under different questions are stored twice.
//!
//! ## Lossy degradation
//!
//! A store error or timeout never fails the document. The image's URL becomes
//! the empty string, an [`ImageError`] is recorded, and the question that owns
//! the picture is still emitted.

use crate::config::ParseConfig;
use crate::error::ImageError;
use crate::output::ImageResult;
use crate::pipeline::docx::EmbeddedImage;
use crate::store::ImageStore;
use futures::stream::{self, StreamExt};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

/// File extension for a MIME type.
pub fn extension_for(content_type: &str) -> &str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    match essence.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/gif" => "gif",
        "image/bmp" | "image/x-bmp" => "bmp",
        "image/tiff" => "tiff",
        "image/svg+xml" => "svg",
        "image/webp" => "webp",
        "image/x-emf" | "image/emf" => "emf",
        "image/x-wmf" | "image/wmf" => "wmf",
        _ => essence
            .split_once('/')
            .map(|(_, subtype)| subtype)
            .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin"),
    }
}

/// `"{prefix}/{uuid}.{ext}"`, or `"{uuid}.{ext}"` without a prefix.
pub fn synthesize_filename(content_type: &str, prefix: Option<&str>) -> String {
    let name = format!("{}.{}", Uuid::new_v4(), extension_for(content_type));
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}/{name}"),
        _ => name,
    }
}

/// Store one image; never fails.
pub async fn relocate_image(
    store: &dyn ImageStore,
    index: usize,
    total: usize,
    image: &EmbeddedImage,
    config: &ParseConfig,
) -> ImageResult {
    let start = Instant::now();
    let filename = synthesize_filename(&image.content_type, config.key_prefix.as_deref());

    if let Some(ref cb) = config.progress_callback {
        cb.on_image_start(index, total);
    }

    let timeout = Duration::from_secs(config.upload_timeout_secs);
    let outcome = tokio::time::timeout(
        timeout,
        store.upload(&filename, &image.bytes, &image.content_type),
    )
    .await;

    let (url, error) = match outcome {
        Ok(Ok(url)) => {
            debug!(
                "Image {}/{}: {} → {} ({} backend)",
                index + 1,
                total,
                image.part,
                url,
                store.backend()
            );
            (url, None)
        }
        Ok(Err(e)) => {
            warn!("Image {}/{} ({}) upload failed: {}", index + 1, total, image.part, e);
            (
                String::new(),
                Some(ImageError::UploadFailed {
                    index,
                    filename: filename.clone(),
                    detail: e.to_string(),
                }),
            )
        }
        Err(_) => {
            warn!(
                "Image {}/{} ({}) upload timed out after {}s",
                index + 1,
                total,
                image.part,
                config.upload_timeout_secs
            );
            (
                String::new(),
                Some(ImageError::Timeout {
                    index,
                    secs: config.upload_timeout_secs,
                }),
            )
        }
    };

    if let Some(ref cb) = config.progress_callback {
        match &error {
            None => cb.on_image_uploaded(index, total, &url),
            Some(e) => cb.on_image_error(index, total, &e.to_string()),
        }
    }

    ImageResult {
        index,
        content_type: image.content_type.clone(),
        filename,
        url,
        size_bytes: image.bytes.len(),
        duration_ms: start.elapsed().as_millis() as u64,
        error,
    }
}

/// Store every image of a document, at most `config.image_concurrency` at a
/// time. Results come back in document order.
pub async fn relocate_all(
    store: &dyn ImageStore,
    images: &[EmbeddedImage],
    config: &ParseConfig,
) -> Vec<ImageResult> {
    let total = images.len();
    stream::iter(
        images
            .iter()
            .enumerate()
            .map(|(index, image)| relocate_image(store, index, total, image, config)),
    )
    .buffered(config.image_concurrency.max(1))
    .collect()
    .await
}
