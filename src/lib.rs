//! # qbank-docx
//!
//! Extract multiple-choice exam questions from DOCX files.
//!
//! Teachers write question banks in a word processor: a numbered stem, four
//! lettered options, an `Answer:` line, an optional `Explanation:` line and
//! sometimes a picture. This crate turns such a document into structured
//! [`QuestionDraft`]s ready for a review queue, storing every embedded picture
//! through a caller-supplied [`ImageStore`] on the way.
//!
//! ## Pipeline Overview
//!
//! ```text
//! DOCX
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Read      unzip, walk word/document.xml (CPU-bound, spawn_blocking)
//!  ├─ 3. Relocate  upload pictures concurrently, UUID names, URL per picture
//!  ├─ 4. Render    one <p> per paragraph, <img src="URL" /> per picture
//!  ├─ 5. Segment   HTML → paragraph blocks (text + single image)
//!  └─ 6. Extract   rule table + fold → question drafts
//! ```
//!
//! A picture that cannot be stored never fails the document: its URL becomes
//! the empty string and the failure is listed in [`ParseOutput::images`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qbank_docx::{parse, FsImageStore, ParseConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FsImageStore::new("public/images", "https://cdn.example.com/images");
//!     let config = ParseConfig::builder().difficulty("easy").build()?;
//!     let output = parse("chapter-3.docx", &store, &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.questions)?);
//!     eprintln!("{} questions, {} images failed",
//!         output.stats.questions,
//!         output.stats.images_failed);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `qbank-docx` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! qbank-docx = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod parse;
pub mod pipeline;
pub mod progress;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ParseConfig, ParseConfigBuilder, DEFAULT_DIFFICULTY};
pub use error::{ImageError, ParseDocxError, StoreError};
pub use output::{
    Classification, DocumentSummary, ImageResult, ParseOutput, ParseStats, QuestionDraft,
    QuestionRecord, ReviewStatus, UploadStatus,
};
pub use parse::{convert_to_html, inspect, parse, parse_docx, parse_sync, parse_to_file};
pub use pipeline::html::HtmlConversion;
pub use progress::{NoopProgressCallback, ParseProgressCallback, ProgressCallback};
pub use store::{
    FsImageStore, HttpImageStore, ImageStore, InlineImageStore, MemoryImageStore, StoredImage,
};
