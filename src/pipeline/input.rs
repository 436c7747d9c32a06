//! Input resolution: normalise a user-supplied path or URL to DOCX bytes.
//!
//! The container reader works on an in-memory buffer, so both local files and
//! downloads end up as a `Vec<u8>`. The ZIP local-file-header signature
//! (`PK\x03\x04`) is checked here so callers get a clear "not a DOCX" error
//! instead of a container-decoding failure.

use crate::error::ParseDocxError;
use std::path::PathBuf;
use tracing::{debug, info};

/// Leading bytes of every ZIP package.
pub const ZIP_MAGIC: [u8; 4] = *b"PK\x03\x04";

/// Where the document bytes came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOrigin {
    Local(PathBuf),
    Url(String),
}

impl std::fmt::Display for InputOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputOrigin::Local(path) => write!(f, "{}", path.display()),
            InputOrigin::Url(url) => f.write_str(url),
        }
    }
}

/// A document loaded into memory.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub origin: InputOrigin,
    pub bytes: Vec<u8>,
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to the bytes of a DOCX package.
///
/// URLs are downloaded with the given timeout; anything else is read as a
/// local path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ParseDocxError> {
    let input = input.trim();
    if input.is_empty() || (input.contains("://") && !is_url(input)) {
        return Err(ParseDocxError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input).await
    }
}

/// Fail with [`ParseDocxError::NotADocx`] unless `bytes` start with a ZIP
/// header. Buffers shorter than the header are left to the container reader.
pub fn check_magic(bytes: &[u8], path: impl Into<PathBuf>) -> Result<(), ParseDocxError> {
    if bytes.len() >= ZIP_MAGIC.len() && bytes[..4] != ZIP_MAGIC {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(ParseDocxError::NotADocx {
            path: path.into(),
            magic,
        });
    }
    Ok(())
}

async fn resolve_local(path_str: &str) -> Result<ResolvedInput, ParseDocxError> {
    let path = PathBuf::from(path_str);

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ParseDocxError::PermissionDenied { path });
        }
        Err(_) => return Err(ParseDocxError::FileNotFound { path }),
    };
    check_magic(&bytes, &path)?;

    debug!("Resolved local DOCX: {} ({} bytes)", path.display(), bytes.len());
    Ok(ResolvedInput {
        origin: InputOrigin::Local(path),
        bytes,
    })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ParseDocxError> {
    info!("Downloading DOCX from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ParseDocxError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let map_err = |e: reqwest::Error| {
        if e.is_timeout() {
            ParseDocxError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ParseDocxError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(map_err)?;
    if !response.status().is_success() {
        return Err(ParseDocxError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(map_err)?.to_vec();
    check_magic(&bytes, filename_from_url(url))?;

    info!("Downloaded {} bytes", bytes.len());
    Ok(ResolvedInput {
        origin: InputOrigin::Url(url.to_string()),
        bytes,
    })
}

/// Last path segment of a URL, used to name the document in errors.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty())
        .unwrap_or_else(|| "downloaded.docx".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/quiz.docx"));
        assert!(is_url("http://example.com/quiz.docx"));
        assert!(!is_url("/tmp/quiz.docx"));
        assert!(!is_url("quiz.docx"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_from_url_uses_last_segment() {
        assert_eq!(filename_from_url("https://x.test/a/b/quiz.docx"), "quiz.docx");
        assert_eq!(filename_from_url("https://x.test/"), "downloaded.docx");
    }

    #[test]
    fn magic_check() {
        assert!(check_magic(b"PK\x03\x04rest", "a.docx").is_ok());
        assert!(check_magic(b"PK", "a.docx").is_ok());
        let err = check_magic(b"%PDF-1.7", "a.docx").unwrap_err();
        assert!(matches!(err, ParseDocxError::NotADocx { magic, .. } if &magic == b"%PDF"));
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = resolve_input("/definitely/not/here.docx", 5).await.unwrap_err();
        assert!(matches!(err, ParseDocxError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn unsupported_scheme_is_invalid_input() {
        let err = resolve_input("ftp://host/quiz.docx", 5).await.unwrap_err();
        assert!(matches!(err, ParseDocxError::InvalidInput { .. }));
        let err = resolve_input("   ", 5).await.unwrap_err();
        assert!(matches!(err, ParseDocxError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn local_file_is_read_and_checked() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("quiz.docx");
        std::fs::write(&good, b"PK\x03\x04payload").unwrap();
        let resolved = resolve_input(good.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(resolved.origin, InputOrigin::Local(good));
        assert_eq!(resolved.bytes.len(), 11);

        let bad = dir.path().join("notes.txt");
        std::fs::write(&bad, b"hello world").unwrap();
        let err = resolve_input(bad.to_str().unwrap(), 5).await.unwrap_err();
        assert!(matches!(err, ParseDocxError::NotADocx { .. }));
    }
}
