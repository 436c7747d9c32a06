//! Output types: extracted questions, per-image results and parse stats.
//!
//! [`QuestionDraft`] is the unit the pipeline produces. Its serialised field
//! names are the contract with the persistence side of the question bank, so
//! they are spelled out explicitly and never renamed.

use crate::error::ImageError;
use serde::{Deserialize, Serialize};

/// One extracted multiple-choice question.
///
/// Drafts are created during a single parse and never mutated after they are
/// appended to [`ParseOutput::questions`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    /// Question stem with the numbering prefix removed.
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    /// Empty, or a single uppercase letter.
    pub correct_answer: String,
    pub explanation: String,
    /// Public URL of the question's image. `Some("")` when the upload failed.
    pub image_url: Option<String>,
    pub difficulty: String,
}

impl QuestionDraft {
    /// A fresh draft opened by a question-start marker.
    pub fn new(question_text: impl Into<String>, difficulty: impl Into<String>) -> Self {
        Self {
            question_text: question_text.into(),
            difficulty: difficulty.into(),
            ..Self::default()
        }
    }

    /// True while no option line has been seen, i.e. the stem may still grow.
    pub fn accepts_stem_text(&self) -> bool {
        self.option_a.is_empty()
    }

    /// True when an image may still be attached.
    ///
    /// An empty URL left by a failed upload does not claim the slot.
    pub fn accepts_image(&self) -> bool {
        self.image_url.as_deref().map_or(true, str::is_empty)
    }

    /// Number of the four option slots that are filled.
    pub fn option_count(&self) -> usize {
        [&self.option_a, &self.option_b, &self.option_c, &self.option_d]
            .iter()
            .filter(|o| !o.is_empty())
            .count()
    }
}

/// Outcome of relocating one embedded image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageResult {
    /// 0-based position in document order.
    pub index: usize,
    pub content_type: String,
    /// Name the image was stored under (empty when no name was needed).
    pub filename: String,
    /// Public URL; empty when the upload failed.
    pub url: String,
    pub size_bytes: usize,
    pub duration_ms: u64,
    pub error: Option<ImageError>,
}

/// Counters for one parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseStats {
    /// Paragraph blocks produced by the segmenter.
    pub paragraphs: usize,
    pub questions: usize,
    pub images_total: usize,
    pub images_uploaded: usize,
    pub images_failed: usize,
    /// Paragraphs seen while no question was open.
    pub dropped_paragraphs: usize,
    pub total_duration_ms: u64,
    pub convert_duration_ms: u64,
    pub upload_duration_ms: u64,
}

/// Everything a parse produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseOutput {
    /// Questions in document order.
    pub questions: Vec<QuestionDraft>,
    pub images: Vec<ImageResult>,
    pub stats: ParseStats,
    /// Intermediate HTML with relocated image URLs.
    #[serde(skip)]
    pub html: String,
}

impl ParseOutput {
    /// Attach caller-supplied curriculum identifiers to every question.
    pub fn into_records(self, classification: &Classification) -> Vec<QuestionRecord> {
        self.questions
            .into_iter()
            .map(|question| QuestionRecord {
                question,
                classification: classification.clone(),
                status: ReviewStatus::Pending,
            })
            .collect()
    }

    /// Upload status to report for this document.
    pub fn status(&self) -> UploadStatus {
        UploadStatus::Completed
    }
}

/// Curriculum placement chosen by the uploader.
///
/// The parser never infers these; they travel with the upload request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_id: Option<String>,
}

/// Review state of a stored question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// A draft plus its classification, ready for insertion into the review queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(flatten)]
    pub question: QuestionDraft,
    #[serde(flatten)]
    pub classification: Classification,
    pub status: ReviewStatus,
}

/// Status transition of the upload record that triggered a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    /// Parse succeeded, even with missing images or incomplete options.
    Completed,
    /// The document could not be decoded.
    Failed,
}

impl UploadStatus {
    pub fn from_result<T, E>(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => UploadStatus::Completed,
            Err(_) => UploadStatus::Failed,
        }
    }
}

/// Shape of a document, computed without storing any image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Non-blank body paragraphs.
    pub paragraphs: usize,
    /// Embedded pictures that resolved to package parts.
    pub images: usize,
    /// Paragraphs that open a question.
    pub question_markers: usize,
}
