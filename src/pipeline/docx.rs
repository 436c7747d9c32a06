//! DOCX container reading: ZIP package → paragraphs with inline images.
//!
//! Only what question extraction needs is read: body paragraphs in document
//! order, their run text, tabs and line breaks, and the bytes of every
//! embedded picture. Styles, numbering, footnotes and comments are ignored.
//!
//! Reading is synchronous and CPU-bound; [`read_docx_blocking`] moves it onto
//! tokio's blocking pool.

use crate::error::ParseDocxError;
use roxmltree::{Document as XmlDoc, Node};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

const DOCUMENT_PART: &str = "word/document.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// Largest package part read into memory, checked against both the size the
/// ZIP header declares and the bytes actually inflated.
pub const MAX_PART_BYTES: u64 = 256 * 1024 * 1024;

/// One piece of paragraph content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Break,
    /// Index into [`DocxBody::images`].
    Image(usize),
}

/// A body paragraph in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParagraph {
    pub inlines: Vec<Inline>,
}

impl RawParagraph {
    /// True when the paragraph has no image and only whitespace text.
    pub fn is_blank(&self) -> bool {
        self.inlines.iter().all(|inline| match inline {
            Inline::Text(t) => t.trim().is_empty(),
            Inline::Break => true,
            Inline::Image(_) => false,
        })
    }
}

/// An embedded picture, one entry per occurrence in the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    /// Relationship id that referenced the picture, e.g. `rId7`.
    pub rel_id: String,
    /// Package part the bytes came from, e.g. `word/media/image1.png`.
    pub part: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Decoded document body.
#[derive(Debug, Clone, Default)]
pub struct DocxBody {
    pub paragraphs: Vec<RawParagraph>,
    pub images: Vec<EmbeddedImage>,
}

/// [`read_docx`] on the blocking pool.
pub async fn read_docx_blocking(bytes: Vec<u8>) -> Result<DocxBody, ParseDocxError> {
    tokio::task::spawn_blocking(move || read_docx(&bytes))
        .await
        .map_err(|e| ParseDocxError::Internal(format!("DOCX reader task panicked: {e}")))?
}

/// Decode a DOCX package held in memory.
///
/// # Errors
/// [`ParseDocxError::DocumentFormat`] when the bytes are not a ZIP container
/// or the main part is not well-formed XML, [`ParseDocxError::MissingPart`]
/// when `word/document.xml` is absent.
pub fn read_docx(bytes: &[u8]) -> Result<DocxBody, ParseDocxError> {
    let mut zip = ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        ParseDocxError::DocumentFormat {
            detail: format!("not a ZIP container: {e}"),
        }
    })?;

    let document_xml = read_part_text(&mut zip, DOCUMENT_PART)?.ok_or_else(|| {
        ParseDocxError::MissingPart {
            part: DOCUMENT_PART.to_string(),
        }
    })?;
    let relationships = read_relationships(&mut zip);
    let content_types = read_content_types(&mut zip);

    let xml = XmlDoc::parse(strip_bom(&document_xml)).map_err(|e| {
        ParseDocxError::DocumentFormat {
            detail: format!("{DOCUMENT_PART} is not well-formed XML: {e}"),
        }
    })?;

    let mut body = DocxBody::default();
    let Some(root) = xml.descendants().find(|n| is_tag(n, "body")) else {
        debug!("{} has no body element", DOCUMENT_PART);
        return Ok(body);
    };

    for p in root.descendants().filter(|n| is_tag(n, "p")) {
        // Text-box paragraphs are read as part of the paragraph hosting them.
        if p.ancestors().skip(1).any(|a| is_tag(&a, "p")) {
            continue;
        }
        let paragraph = read_paragraph(&p, &relationships, &content_types, &mut zip, &mut body.images);
        body.paragraphs.push(paragraph);
    }

    debug!(
        "Read {} paragraphs and {} images from DOCX",
        body.paragraphs.len(),
        body.images.len()
    );
    Ok(body)
}

fn read_paragraph<R: Read + Seek>(
    p: &Node,
    rels: &Relationships,
    types: &ContentTypes,
    zip: &mut ZipArchive<R>,
    images: &mut Vec<EmbeddedImage>,
) -> RawParagraph {
    let mut paragraph = RawParagraph::default();

    for node in p.descendants().skip(1).filter(|n| n.is_element()) {
        // AlternateContent carries the same picture twice; the Choice branch wins.
        if node.ancestors().any(|a| is_tag(&a, "Fallback")) {
            continue;
        }
        let in_run = node.parent().is_some_and(|parent| is_tag(&parent, "r"));
        match node.tag_name().name() {
            "t" => {
                if let Some(text) = node.text() {
                    push_text(&mut paragraph, text);
                }
            }
            "tab" if in_run => push_text(&mut paragraph, "\t"),
            "br" | "cr" if in_run => paragraph.inlines.push(Inline::Break),
            "blip" => {
                let rel_id = get_attr_local(&node, "embed").or_else(|| get_attr_local(&node, "link"));
                push_image(&mut paragraph, rel_id, rels, types, zip, images);
            }
            "imagedata" => {
                let rel_id = get_attr_local(&node, "id");
                push_image(&mut paragraph, rel_id, rels, types, zip, images);
            }
            _ => {}
        }
    }

    paragraph
}

fn push_text(paragraph: &mut RawParagraph, text: &str) {
    if let Some(Inline::Text(last)) = paragraph.inlines.last_mut() {
        last.push_str(text);
    } else {
        paragraph.inlines.push(Inline::Text(text.to_string()));
    }
}

fn push_image<R: Read + Seek>(
    paragraph: &mut RawParagraph,
    rel_id: Option<&str>,
    rels: &Relationships,
    types: &ContentTypes,
    zip: &mut ZipArchive<R>,
    images: &mut Vec<EmbeddedImage>,
) {
    let Some(rel_id) = rel_id else {
        return;
    };
    if let Some(image) = load_image(rel_id, rels, types, zip) {
        paragraph.inlines.push(Inline::Image(images.len()));
        images.push(image);
    }
}

fn load_image<R: Read + Seek>(
    rel_id: &str,
    rels: &Relationships,
    types: &ContentTypes,
    zip: &mut ZipArchive<R>,
) -> Option<EmbeddedImage> {
    let Some(rel) = rels.get(rel_id) else {
        debug!("Image relationship {} not found; skipping", rel_id);
        return None;
    };
    if rel.external {
        debug!("Image {} is linked externally ({}); skipping", rel_id, rel.target);
        return None;
    }

    let part = resolve_part("word", &rel.target);
    let bytes = match read_part(zip, &part) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            warn!("Image part {} referenced by {} is missing", part, rel_id);
            return None;
        }
        Err(e) => {
            warn!("Image part {} could not be read: {}", part, e);
            return None;
        }
    };

    let content_type = types
        .lookup(&part)
        .map(str::to_string)
        .or_else(|| sniff_content_type(&bytes))
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Some(EmbeddedImage {
        rel_id: rel_id.to_string(),
        part,
        content_type,
        bytes,
    })
}

fn sniff_content_type(bytes: &[u8]) -> Option<String> {
    image::guess_format(bytes)
        .ok()
        .map(|format| format.to_mime_type().to_string())
}

// ── Package parts ────────────────────────────────────────────────────────

fn read_part<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    path: &str,
) -> Result<Option<Vec<u8>>, ParseDocxError> {
    let mut file = match zip.by_name(path) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(ParseDocxError::DocumentFormat {
                detail: format!("cannot open part '{path}': {e}"),
            })
        }
    };
    if file.size() > MAX_PART_BYTES {
        return Err(ParseDocxError::DocumentFormat {
            detail: format!(
                "part '{path}' declares {} bytes (limit {MAX_PART_BYTES})",
                file.size()
            ),
        });
    }
    read_capped(&mut file, MAX_PART_BYTES, path).map(Some)
}

/// Read at most `limit` bytes; more than that is a format error.
fn read_capped<R: Read>(reader: R, limit: u64, path: &str) -> Result<Vec<u8>, ParseDocxError> {
    let mut buf = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut buf)
        .map_err(|e| ParseDocxError::DocumentFormat {
            detail: format!("cannot read part '{path}': {e}"),
        })?;
    if buf.len() as u64 > limit {
        return Err(ParseDocxError::DocumentFormat {
            detail: format!("part '{path}' exceeds {limit} bytes"),
        });
    }
    Ok(buf)
}

fn read_part_text<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    path: &str,
) -> Result<Option<String>, ParseDocxError> {
    match read_part(zip, path)? {
        Some(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| ParseDocxError::DocumentFormat {
                detail: format!("part '{path}' is not UTF-8: {e}"),
            }),
        None => Ok(None),
    }
}

/// Resolve a relationship target relative to the folder of its source part.
fn resolve_part(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return normalise_segments(absolute.split('/').collect());
    }
    let segments = base_dir.split('/').chain(target.split('/')).collect();
    normalise_segments(segments)
}

fn normalise_segments(segments: Vec<&str>) -> String {
    let mut out: Vec<&str> = Vec::with_capacity(segments.len());
    for seg in segments {
        match seg {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            s => out.push(s),
        }
    }
    out.join("/")
}

// ── Relationships ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Relationship {
    target: String,
    external: bool,
}

#[derive(Debug, Clone, Default)]
struct Relationships {
    by_id: HashMap<String, Relationship>,
}

impl Relationships {
    fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id)
    }
}

fn read_relationships<R: Read + Seek>(zip: &mut ZipArchive<R>) -> Relationships {
    let Ok(Some(text)) = read_part_text(zip, DOCUMENT_RELS_PART) else {
        return Relationships::default();
    };
    let Ok(xml) = XmlDoc::parse(strip_bom(&text)) else {
        warn!("{} is not well-formed; images will be skipped", DOCUMENT_RELS_PART);
        return Relationships::default();
    };
    let by_id = xml
        .descendants()
        .filter(|n| is_tag(n, "Relationship"))
        .filter_map(|rel| {
            let id = get_attr_local(&rel, "Id")?;
            let target = get_attr_local(&rel, "Target")?;
            let external = get_attr_local(&rel, "TargetMode")
                .is_some_and(|mode| mode.eq_ignore_ascii_case("External"));
            Some((
                id.to_string(),
                Relationship {
                    target: target.to_string(),
                    external,
                },
            ))
        })
        .collect();
    Relationships { by_id }
}

// ── Content types ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct ContentTypes {
    /// Lowercase extension → MIME type.
    defaults: HashMap<String, String>,
    /// Part name without leading `/` → MIME type.
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    fn lookup(&self, part: &str) -> Option<&str> {
        if let Some(ct) = self.overrides.get(part) {
            return Some(ct);
        }
        let ext = part.rsplit_once('.')?.1.to_ascii_lowercase();
        self.defaults.get(&ext).map(String::as_str)
    }
}

fn read_content_types<R: Read + Seek>(zip: &mut ZipArchive<R>) -> ContentTypes {
    let Ok(Some(text)) = read_part_text(zip, CONTENT_TYPES_PART) else {
        return ContentTypes::default();
    };
    let Ok(xml) = XmlDoc::parse(strip_bom(&text)) else {
        return ContentTypes::default();
    };
    let mut types = ContentTypes::default();
    for node in xml.descendants().filter(|n| n.is_element()) {
        let Some(ct) = get_attr_local(&node, "ContentType") else {
            continue;
        };
        match node.tag_name().name() {
            "Default" => {
                if let Some(ext) = get_attr_local(&node, "Extension") {
                    types
                        .defaults
                        .insert(ext.to_ascii_lowercase(), ct.to_string());
                }
            }
            "Override" => {
                if let Some(part) = get_attr_local(&node, "PartName") {
                    types
                        .overrides
                        .insert(part.trim_start_matches('/').to_string(), ct.to_string());
                }
            }
            _ => {}
        }
    }
    types
}

// ── XML helpers ──────────────────────────────────────────────────────────

fn strip_bom(s: &str) -> &str {
    s.strip_prefix('\u{FEFF}').unwrap_or(s)
}

fn is_tag(node: &Node, local: &str) -> bool {
    node.is_element() && node.tag_name().name() == local
}

fn get_attr_local<'a>(node: &Node<'a, 'a>, local: &str) -> Option<&'a str> {
    node.attributes()
        .find(|a| {
            let name = a.name();
            match name.rsplit_once(':') {
                Some((_, l)) => l == local,
                None => name == local,
            }
        })
        .map(|a| a.value())
}
