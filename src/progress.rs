//! Progress-callback trait for per-image parse events.
//!
//! Inject an [`Arc<dyn ParseProgressCallback>`] via
//! [`crate::config::ParseConfigBuilder::progress_callback`] to receive events
//! while the pipeline uploads embedded images and extracts questions.
//!
//! Image uploads are the only slow stage of a parse, so that is where the
//! events are. The trait is `Send + Sync` because uploads of one document run
//! concurrently.
//!
//! # Example
//!
//! ```rust
//! use qbank_docx::{ParseConfig, ParseProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     uploaded: AtomicUsize,
//! }
//!
//! impl ParseProgressCallback for CountingCallback {
//!     fn on_image_uploaded(&self, index: usize, total: usize, _url: &str) {
//!         let done = self.uploaded.fetch_add(1, Ordering::SeqCst) + 1;
//!         eprintln!("image {index} stored ({done}/{total})");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { uploaded: AtomicUsize::new(0) });
//!
//! let config = ParseConfig::builder()
//!     .progress_callback(counter as Arc<dyn ParseProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the parse pipeline as it processes a document.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
///
/// # Thread safety
///
/// `on_image_start`, `on_image_uploaded` and `on_image_error` may be called
/// concurrently for different images of the same document.
pub trait ParseProgressCallback: Send + Sync {
    /// Called once after the container is decoded, before any upload.
    ///
    /// # Arguments
    /// * `total_images` — number of embedded images that will be relocated
    fn on_parse_start(&self, total_images: usize) {
        let _ = total_images;
    }

    /// Called just before an image is handed to the store.
    ///
    /// `index` is 0-based in document order.
    fn on_image_start(&self, index: usize, total: usize) {
        let _ = (index, total);
    }

    /// Called when an image was stored and has a public URL.
    fn on_image_uploaded(&self, index: usize, total: usize, url: &str) {
        let _ = (index, total, url);
    }

    /// Called when an image could not be stored; its URL degrades to `""`.
    fn on_image_error(&self, index: usize, total: usize, error: &str) {
        let _ = (index, total, error);
    }

    /// Called once after extraction finished.
    ///
    /// # Arguments
    /// * `questions`     — number of questions emitted
    /// * `failed_images` — number of images whose upload failed
    fn on_parse_complete(&self, questions: usize, failed_images: usize) {
        let _ = (questions, failed_images);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ParseProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ParseConfig`].
pub type ProgressCallback = Arc<dyn ParseProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        total: AtomicUsize,
        starts: AtomicUsize,
        uploaded: AtomicUsize,
        errors: AtomicUsize,
        questions: AtomicUsize,
    }

    impl ParseProgressCallback for TrackingCallback {
        fn on_parse_start(&self, total_images: usize) {
            self.total.store(total_images, Ordering::SeqCst);
        }

        fn on_image_start(&self, _index: usize, _total: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_uploaded(&self, _index: usize, _total: usize, _url: &str) {
            self.uploaded.fetch_add(1, Ordering::SeqCst);
        }

        fn on_image_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_parse_complete(&self, questions: usize, _failed_images: usize) {
            self.questions.store(questions, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_parse_start(2);
        cb.on_image_start(0, 2);
        cb.on_image_uploaded(0, 2, "https://cdn/x.png");
        cb.on_image_error(1, 2, "boom");
        cb.on_parse_complete(5, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_parse_start(3);
        tracker.on_image_start(0, 3);
        tracker.on_image_uploaded(0, 3, "u0");
        tracker.on_image_start(1, 3);
        tracker.on_image_uploaded(1, 3, "u1");
        tracker.on_image_start(2, 3);
        tracker.on_image_error(2, 3, "HTTP 500");
        tracker.on_parse_complete(4, 1);

        assert_eq!(tracker.total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.uploaded.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.questions.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: Arc<dyn ParseProgressCallback> = Arc::new(NoopProgressCallback);
        cb.on_parse_start(1);
        cb.on_image_uploaded(0, 1, "u");
    }
}
