//! Paragraph segmentation: converted HTML → ordered [`ParagraphBlock`]s.
//!
//! The HTML is split on closing `</p>` tags. Each fragment keeps its raw
//! markup, its plain text (tags stripped, entities decoded, trimmed) and the
//! `src` of its picture when it holds exactly one `<img>`. Fragments that are
//! only whitespace produce no block.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_PARAGRAPH_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)</p\s*>").unwrap());
static RE_PARAGRAPH_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*<p\b[^>]*>").unwrap());
static RE_IMG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<img\b[^>]*>").unwrap());
static RE_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\bsrc\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap());
static RE_BR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// One paragraph of converted HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphBlock {
    /// Inner markup without the surrounding `<p>` tags.
    pub html: String,
    /// Picture URL when the fragment contains exactly one `<img>`.
    pub image: Option<String>,
    /// Number of `<img>` tags in the fragment.
    pub image_count: usize,
    /// Plain text with markup removed.
    pub text: String,
}

impl ParagraphBlock {
    /// Build a block from the markup of a single paragraph.
    pub fn from_fragment(fragment: &str) -> Self {
        let html = RE_PARAGRAPH_START.replace(fragment, "").trim().to_string();
        let images: Vec<&str> = RE_IMG.find_iter(&html).map(|m| m.as_str()).collect();
        let image = match images.as_slice() {
            [only] => Some(img_src(only)),
            _ => None,
        };
        let text = strip_tags(&html);
        Self {
            image_count: images.len(),
            image,
            text,
            html,
        }
    }

    /// True when the fragment contains at least one picture.
    pub fn has_image(&self) -> bool {
        self.image_count > 0
    }
}

/// Split converted HTML into paragraph blocks in document order.
pub fn segment(html: &str) -> Vec<ParagraphBlock> {
    RE_PARAGRAPH_END
        .split(html)
        .filter(|fragment| !fragment.trim().is_empty())
        .map(ParagraphBlock::from_fragment)
        .filter(|block| !block.html.is_empty())
        .collect()
}

/// Remove all markup from a fragment and decode entities.
///
/// `<br>` becomes a space so words on either side of a line break stay apart.
pub fn strip_tags(fragment: &str) -> String {
    let spaced = RE_BR.replace_all(fragment, " ");
    let bare = RE_TAG.replace_all(&spaced, "");
    decode_entities(&bare).trim().to_string()
}

fn img_src(tag: &str) -> String {
    RE_SRC
        .captures(tag)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| decode_entities(m.as_str()))
        .unwrap_or_default()
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
