//! Text extraction: turns an uploaded document into plain text.
//!
//! Only two kinds are accepted, PDF and UTF-8 plain text. Extraction is a pure
//! function of the bytes; the async wrapper only moves PDF parsing off the
//! runtime threads.

pub mod pdf;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("document is not valid UTF-8 text (invalid byte sequence at offset {valid_up_to})")]
    Decode { valid_up_to: usize },

    #[error("document is not a well-formed PDF: {0}")]
    Malformed(String),

    #[error("PDF is encrypted and cannot be read")]
    Encrypted,

    #[error("unsupported document type: {0}")]
    UnsupportedKind(String),
}

/// Declared media kind of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Resolves the kind from what the uploader declared.
    ///
    /// Content type wins over file extension, which wins over magic bytes.
    pub fn detect(
        file_name: Option<&str>,
        content_type: Option<&str>,
        head: &[u8],
    ) -> Result<Self, ExtractionError> {
        let mime = content_type
            .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty());

        match mime.as_deref() {
            Some("application/pdf") => return Ok(DocumentKind::Pdf),
            Some("text/plain") => return Ok(DocumentKind::PlainText),
            _ => {}
        }

        let extension = file_name
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => return Ok(DocumentKind::Pdf),
            Some("txt") => return Ok(DocumentKind::PlainText),
            _ => {}
        }

        if head.starts_with(PDF_MAGIC) {
            return Ok(DocumentKind::Pdf);
        }

        let declared = mime
            .or_else(|| extension.map(|ext| format!(".{ext}")))
            .unwrap_or_else(|| "unknown".to_string());
        Err(ExtractionError::UnsupportedKind(format!(
            "{declared} (expected a PDF or plain-text file)"
        )))
    }
}

/// An uploaded document, immutable once received.
#[derive(Debug, Clone)]
pub struct Document {
    pub kind: DocumentKind,
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

impl Document {
    pub fn new(kind: DocumentKind, file_name: Option<String>, bytes: Bytes) -> Self {
        Self {
            kind,
            file_name,
            bytes,
        }
    }
}

/// Converts a document into plain text.
///
/// A document with no text layer yields `Ok("")`; callers decide what an
/// empty input means.
pub fn extract(document: &Document) -> Result<String, ExtractionError> {
    match document.kind {
        DocumentKind::PlainText => decode_utf8(&document.bytes),
        DocumentKind::Pdf => pdf::extract_pdf_text(&document.bytes),
    }
}

/// Same as [`extract`], with PDF parsing moved onto the blocking pool.
/// A panic inside the PDF library surfaces as `Malformed`.
pub async fn extract_off_runtime(document: Document) -> Result<String, ExtractionError> {
    match document.kind {
        DocumentKind::PlainText => extract(&document),
        DocumentKind::Pdf => tokio::task::spawn_blocking(move || extract(&document))
            .await
            .map_err(|e| ExtractionError::Malformed(format!("PDF parser aborted: {e}")))?,
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String, ExtractionError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| ExtractionError::Decode {
            valid_up_to: e.valid_up_to(),
        })
}
