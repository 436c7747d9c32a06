//! Configuration types for DOCX question extraction.
//!
//! All parse behaviour is controlled through [`ParseConfig`], built via its
//! [`ParseConfigBuilder`]. The image store is *not* part of the config: it is
//! passed to every `parse*` call explicitly, so two concurrent parses can use
//! the same config with different stores.

use crate::error::ParseDocxError;
use crate::progress::ProgressCallback;
use std::fmt;

/// Difficulty assigned to every extracted question.
pub const DEFAULT_DIFFICULTY: &str = "medium";

/// Configuration for a DOCX-to-questions parse.
///
/// Built via [`ParseConfig::builder()`] or using [`ParseConfig::default()`].
///
/// # Example
/// ```rust
/// use qbank_docx::ParseConfig;
///
/// let config = ParseConfig::builder()
///     .difficulty("hard")
///     .image_concurrency(8)
///     .key_prefix("uploads/2024")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ParseConfig {
    /// Difficulty stamped on every [`crate::output::QuestionDraft`]. Default: `"medium"`.
    ///
    /// Documents carry no difficulty signal; the uploader picks it for the
    /// whole batch.
    pub difficulty: String,

    /// Number of concurrent image uploads for one document. Default: 4.
    ///
    /// URLs are substituted in document order regardless of completion order.
    pub image_concurrency: usize,

    /// Per-image upload timeout in seconds. Default: 30.
    ///
    /// A timed-out upload degrades to an empty URL like any other failure.
    pub upload_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional folder prefix for stored image names, e.g. `"uploads/42"`.
    /// Stored names become `"{prefix}/{uuid}.{ext}"`.
    pub key_prefix: Option<String>,

    /// Progress events for image uploads and completion. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY.to_string(),
            image_concurrency: 4,
            upload_timeout_secs: 30,
            download_timeout_secs: 120,
            key_prefix: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ParseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseConfig")
            .field("difficulty", &self.difficulty)
            .field("image_concurrency", &self.image_concurrency)
            .field("upload_timeout_secs", &self.upload_timeout_secs)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("key_prefix", &self.key_prefix)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ParseProgressCallback>"),
            )
            .finish()
    }
}

impl ParseConfig {
    /// Create a new builder for `ParseConfig`.
    pub fn builder() -> ParseConfigBuilder {
        ParseConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ParseConfig`].
#[derive(Debug)]
pub struct ParseConfigBuilder {
    config: ParseConfig,
}

impl ParseConfigBuilder {
    pub fn difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.config.difficulty = difficulty.into().trim().to_string();
        self
    }

    pub fn image_concurrency(mut self, n: usize) -> Self {
        self.config.image_concurrency = n.max(1);
        self
    }

    pub fn upload_timeout_secs(mut self, secs: u64) -> Self {
        self.config.upload_timeout_secs = secs.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Leading and trailing `/` are removed; an empty prefix clears it.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let prefix = prefix.trim_matches('/');
        self.config.key_prefix = if prefix.is_empty() {
            None
        } else {
            Some(prefix.to_string())
        };
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ParseConfig, ParseDocxError> {
        let c = &self.config;
        if c.difficulty.is_empty() {
            return Err(ParseDocxError::InvalidConfig(
                "Difficulty must not be empty".into(),
            ));
        }
        if c.image_concurrency == 0 {
            return Err(ParseDocxError::InvalidConfig(
                "Image concurrency must be ≥ 1".into(),
            ));
        }
        if let Some(prefix) = &c.key_prefix {
            if prefix.split('/').any(|seg| seg == "..") {
                return Err(ParseDocxError::InvalidConfig(format!(
                    "Key prefix must not contain '..': {prefix}"
                )));
            }
        }
        Ok(self.config)
    }
}
