//! Rich-text-to-HTML conversion: DOCX bytes → HTML with relocated images.
//!
//! Runs the blocking container reader, relocates every embedded picture
//! through the injected store, then renders one `<p>` per non-blank body
//! paragraph. Pictures whose upload failed render as `<img src="" />` so the
//! paragraph structure the segmenter sees is the same either way.

use crate::config::ParseConfig;
use crate::error::ParseDocxError;
use crate::output::ImageResult;
use crate::pipeline::docx::{read_docx_blocking, Inline, RawParagraph};
use crate::pipeline::relocate::relocate_all;
use crate::store::ImageStore;
use std::time::Instant;
use tracing::debug;

/// Result of stages 1 and 2.
#[derive(Debug, Clone)]
pub struct HtmlConversion {
    pub html: String,
    /// One entry per embedded picture, in document order.
    pub images: Vec<ImageResult>,
    /// Body paragraphs read from the package, blank ones included.
    pub source_paragraphs: usize,
    pub convert_duration_ms: u64,
    pub upload_duration_ms: u64,
}

/// Convert a DOCX package to HTML, storing its images along the way.
pub async fn convert(
    bytes: Vec<u8>,
    store: &dyn ImageStore,
    config: &ParseConfig,
) -> Result<HtmlConversion, ParseDocxError> {
    let read_start = Instant::now();
    let body = read_docx_blocking(bytes).await?;
    let read_ms = read_start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_parse_start(body.images.len());
    }

    let upload_start = Instant::now();
    let images = relocate_all(store, &body.images, config).await;
    let upload_duration_ms = upload_start.elapsed().as_millis() as u64;

    let render_start = Instant::now();
    let urls: Vec<&str> = images.iter().map(|r| r.url.as_str()).collect();
    let html = render_html(&body.paragraphs, &urls);
    let convert_duration_ms = read_ms + render_start.elapsed().as_millis() as u64;

    debug!(
        "Rendered {} paragraphs ({} bytes of HTML, {} images)",
        body.paragraphs.len(),
        html.len(),
        images.len()
    );

    Ok(HtmlConversion {
        html,
        images,
        source_paragraphs: body.paragraphs.len(),
        convert_duration_ms,
        upload_duration_ms,
    })
}

/// Render paragraphs as HTML. `urls[i]` is the URL of image `i`.
pub fn render_html(paragraphs: &[RawParagraph], urls: &[&str]) -> String {
    let mut html = String::new();
    for paragraph in paragraphs.iter().filter(|p| !p.is_blank()) {
        html.push_str("<p>");
        for inline in &paragraph.inlines {
            match inline {
                Inline::Text(text) => push_escaped(&mut html, text),
                Inline::Break => html.push_str("<br />"),
                Inline::Image(i) => {
                    html.push_str("<img src=\"");
                    push_escaped(&mut html, urls.get(*i).copied().unwrap_or_default());
                    html.push_str("\" />");
                }
            }
        }
        html.push_str("</p>\n");
    }
    html
}

fn push_escaped(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Inline {
        Inline::Text(s.to_string())
    }

    #[test]
    fn renders_one_paragraph_per_non_blank_paragraph() {
        let paragraphs = vec![
            RawParagraph { inlines: vec![text("1. What is 2+2?")] },
            RawParagraph { inlines: vec![text("   ")] },
            RawParagraph::default(),
            RawParagraph { inlines: vec![text("A) 3")] },
        ];
        assert_eq!(
            render_html(&paragraphs, &[]),
            "<p>1. What is 2+2?</p>\n<p>A) 3</p>\n"
        );
    }

    #[test]
    fn escapes_text_and_keeps_breaks() {
        let paragraphs = vec![RawParagraph {
            inlines: vec![text("x < y & \"z\""), Inline::Break, text("next")],
        }];
        assert_eq!(
            render_html(&paragraphs, &[]),
            "<p>x &lt; y &amp; &quot;z&quot;<br />next</p>\n"
        );
    }

    #[test]
    fn images_use_relocated_urls() {
        let paragraphs = vec![
            RawParagraph { inlines: vec![text("1. Shape? "), Inline::Image(0)] },
            RawParagraph { inlines: vec![Inline::Image(1)] },
        ];
        let html = render_html(&paragraphs, &["https://cdn/a.png?x=1&y=2", ""]);
        assert_eq!(
            html,
            "<p>1. Shape? <img src=\"https://cdn/a.png?x=1&amp;y=2\" /></p>\n<p><img src=\"\" /></p>\n"
        );
    }

    #[test]
    fn image_only_paragraph_is_not_blank() {
        let paragraphs = vec![RawParagraph { inlines: vec![Inline::Image(0)] }];
        assert!(render_html(&paragraphs, &["u"]).contains("<img src=\"u\" />"));
    }
}
