//! Pipeline stages for DOCX-to-question extraction.
//!
//! Each submodule implements exactly one transformation step, and data flows
//! one way:
//!
//! ```text
//! input ──▶ docx ──▶ relocate ──▶ html ──▶ segment ──▶ extract
//! (path/URL) (zip+xml) (store)    (<p>)    (blocks)    (drafts)
//! ```
//!
//! 1. [`input`]    — load a local path or URL into memory, check the ZIP header
//! 2. [`docx`]     — read body paragraphs and embedded pictures; runs in
//!    `spawn_blocking` because ZIP inflation and XML walking are CPU-bound
//! 3. [`relocate`] — store each picture under a UUID name through the
//!    injected [`crate::store::ImageStore`]; the only stage with network I/O
//! 4. [`html`]     — render paragraphs as `<p>` HTML with relocated URLs
//! 5. [`segment`]  — split the HTML back into paragraph blocks
//! 6. [`extract`]  — rule-table classification folded into question drafts

pub mod docx;
pub mod extract;
pub mod html;
pub mod input;
pub mod relocate;
pub mod segment;
