//! Error types for the qbank-docx library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ParseDocxError`] — **Fatal**: the document cannot be parsed at all
//!   (file missing, not a DOCX container, `word/document.xml` corrupt).
//!   Returned as `Err(ParseDocxError)` from the top-level `parse*` functions
//!   and produces zero questions.
//!
//! * [`ImageError`] — **Non-fatal**: a single embedded image could not be
//!   stored. The image's URL degrades to the empty string, the failure is
//!   recorded in [`crate::output::ImageResult`], and extraction continues.
//!
//! [`StoreError`] is what an [`crate::store::ImageStore`] backend reports; the
//! relocator turns it into an [`ImageError`] and never propagates it.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the qbank-docx library.
#[derive(Debug, Error)]
pub enum ParseDocxError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("DOCX file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but does not start with a ZIP header.
    #[error("File is not a DOCX document: '{path}'\nFirst bytes: {magic:?}")]
    NotADocx { path: PathBuf, magic: [u8; 4] },

    // ── Document errors ───────────────────────────────────────────────────
    /// The container or its main part could not be decoded.
    #[error("Invalid DOCX document: {detail}")]
    DocumentFormat { detail: String },

    /// A required package part is absent from the container.
    #[error("DOCX document is missing required part '{part}'")]
    MissingPart { part: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ParseDocxError {
    /// True when the error comes from decoding the document itself rather than
    /// from locating or fetching it.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            ParseDocxError::NotADocx { .. }
                | ParseDocxError::DocumentFormat { .. }
                | ParseDocxError::MissingPart { .. }
        )
    }
}

/// A non-fatal error for a single embedded image.
///
/// Stored alongside [`crate::output::ImageResult`] when an upload fails.
/// The question that owns the image is still emitted, with an empty URL.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// The store rejected or failed the write.
    #[error("Image {index}: upload of '{filename}' failed: {detail}")]
    UploadFailed {
        index: usize,
        filename: String,
        detail: String,
    },

    /// The store did not answer in time.
    #[error("Image {index}: upload timed out after {secs}s")]
    Timeout { index: usize, secs: u64 },
}

/// Errors reported by [`crate::store::ImageStore`] backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem write failed.
    #[error("Failed to write '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Object storage answered with a non-success status.
    #[error("Storage returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error("Storage request failed: {0}")]
    Request(String),

    /// The store is misconfigured (bad endpoint, empty bucket, ...).
    #[error("Storage misconfigured: {0}")]
    Config(String),
}
