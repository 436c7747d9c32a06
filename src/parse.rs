//! Parse entry points.
//!
//! [`parse_docx`] is the core: bytes in, questions out. The other functions
//! wrap it for paths and URLs, file output, synchronous callers, and the two
//! partial runs ([`convert_to_html`] and [`inspect`]).

use crate::config::ParseConfig;
use crate::error::ParseDocxError;
use crate::output::{DocumentSummary, ParseOutput, ParseStats};
use crate::pipeline::extract::{classify, extract_questions, Line};
use crate::pipeline::html::{self, render_html, HtmlConversion};
use crate::pipeline::{docx, input, segment};
use crate::store::ImageStore;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Extract questions from DOCX bytes held in memory.
///
/// Embedded images are stored through `store` before any question is
/// built, so every `image_url` is final (or empty after a failed upload).
///
/// # Returns
/// `Ok(ParseOutput)` whenever the document decodes, even if images failed
/// (check `output.stats.images_failed`) or no question marker was found.
///
/// # Errors
/// Only for documents that cannot be decoded: not a ZIP container,
/// `word/document.xml` missing or malformed.
///
/// # Example
/// ```rust,no_run
/// use qbank_docx::{parse_docx, MemoryImageStore, ParseConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("quiz.docx")?;
/// let store = MemoryImageStore::new();
/// let output = parse_docx(bytes, &store, &ParseConfig::default()).await?;
/// for q in &output.questions {
///     println!("{} → {}", q.question_text, q.correct_answer);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn parse_docx(
    bytes: impl Into<Vec<u8>>,
    store: &dyn ImageStore,
    config: &ParseConfig,
) -> Result<ParseOutput, ParseDocxError> {
    let total_start = Instant::now();
    let bytes = bytes.into();
    info!("Parsing DOCX ({} bytes, {} store)", bytes.len(), store.backend());

    // ── Stages 1+2: container → HTML, images relocated ───────────────────
    let HtmlConversion {
        html,
        images,
        source_paragraphs,
        convert_duration_ms,
        upload_duration_ms,
    } = html::convert(bytes, store, config).await?;

    // ── Stage 3: paragraph blocks ────────────────────────────────────────
    let blocks = segment::segment(&html);
    debug!(
        "Segmented {} blocks from {} source paragraphs",
        blocks.len(),
        source_paragraphs
    );

    // ── Stage 4: questions ───────────────────────────────────────────────
    let extraction = extract_questions(&blocks, &config.difficulty);

    let images_failed = images.iter().filter(|r| r.error.is_some()).count();
    let stats = ParseStats {
        paragraphs: blocks.len(),
        questions: extraction.questions.len(),
        images_total: images.len(),
        images_uploaded: images.len() - images_failed,
        images_failed,
        dropped_paragraphs: extraction.dropped_paragraphs,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        convert_duration_ms,
        upload_duration_ms,
    };

    info!(
        "Parse complete: {} questions, {}/{} images stored, {}ms total",
        stats.questions, stats.images_uploaded, stats.images_total, stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_parse_complete(stats.questions, stats.images_failed);
    }

    Ok(ParseOutput {
        questions: extraction.questions,
        images,
        stats,
        html,
    })
}

/// Extract questions from a local DOCX file or an HTTP(S) URL.
pub async fn parse(
    input_str: impl AsRef<str>,
    store: &dyn ImageStore,
    config: &ParseConfig,
) -> Result<ParseOutput, ParseDocxError> {
    let input_str = input_str.as_ref();
    info!("Starting parse: {}", input_str);
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    parse_docx(resolved.bytes, store, config).await
}

/// Parse a DOCX and write the output as pretty JSON.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn parse_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    store: &dyn ImageStore,
    config: &ParseConfig,
) -> Result<ParseStats, ParseDocxError> {
    let output = parse(input_str, store, config).await?;
    let path = output_path.as_ref();
    let json = serde_json::to_vec_pretty(&output)
        .map_err(|e| ParseDocxError::Internal(format!("Failed to serialise output: {e}")))?;
    write_atomic(path, &json).await?;
    Ok(output.stats)
}

/// Synchronous wrapper around [`parse`].
///
/// Creates a temporary tokio runtime internally.
pub fn parse_sync(
    input_str: impl AsRef<str>,
    store: &dyn ImageStore,
    config: &ParseConfig,
) -> Result<ParseOutput, ParseDocxError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ParseDocxError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(parse(input_str, store, config))
}

/// Convert DOCX bytes to HTML, storing images, without extracting questions.
pub async fn convert_to_html(
    bytes: impl Into<Vec<u8>>,
    store: &dyn ImageStore,
    config: &ParseConfig,
) -> Result<HtmlConversion, ParseDocxError> {
    html::convert(bytes.into(), store, config).await
}

/// Count paragraphs, pictures and question markers without storing anything.
pub async fn inspect(bytes: impl Into<Vec<u8>>) -> Result<DocumentSummary, ParseDocxError> {
    let body = docx::read_docx_blocking(bytes.into()).await?;
    let blocks = segment::segment(&render_html(&body.paragraphs, &[]));
    let question_markers = blocks
        .iter()
        .filter(|b| matches!(classify(&b.text), Line::QuestionStart(_)))
        .count();
    Ok(DocumentSummary {
        paragraphs: blocks.len(),
        images: body.images.len(),
        question_markers,
    })
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ParseDocxError> {
    let write_err = |e| ParseDocxError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)
}
