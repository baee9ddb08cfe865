//! Text extraction for files passed to `ragdesk ingest --file`.
//!
//! Plain text and Markdown are read as UTF-8; PDF goes through
//! `pdf-extract`. The returned text is what gets stored as document content.

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        path: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("no text could be extracted from {0}")]
    Empty(String),
}

/// Extract plain text from the file at `path`, dispatching on extension.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let text = match ext.as_deref() {
        Some("pdf") => extract_pdf(&bytes)?,
        None | Some("txt") | Some("md") | Some("markdown") => {
            String::from_utf8(bytes).map_err(|source| ExtractError::InvalidUtf8 {
                path: path.display().to_string(),
                source,
            })?
        }
        Some(other) => return Err(ExtractError::Unsupported(other.to_string())),
    };

    if text.trim().is_empty() {
        return Err(ExtractError::Empty(path.display().to_string()));
    }
    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}
