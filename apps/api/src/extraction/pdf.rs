//! PDF text extraction via `pdf-extract`.
//!
//! Pages come out in document order, concatenated without explicit markers.

use tracing::debug;

use super::ExtractionError;

const ENCRYPT_KEY: &[u8] = b"/Encrypt";
const TRAILER_KEY: &[u8] = b"trailer";
const STARTXREF_KEY: &[u8] = b"startxref";
const STREAM_KEY: &[u8] = b"stream";

pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => {
            debug!("Extracted {} chars from {} byte PDF", text.chars().count(), bytes.len());
            Ok(text)
        }
        Err(e) if has_encryption_dictionary(bytes) => {
            debug!("PDF extraction failed on encrypted document: {e}");
            Err(ExtractionError::Encrypted)
        }
        Err(e) => Err(ExtractionError::Malformed(e.to_string())),
    }
}

/// True when the trailer, or the cross-reference stream dictionary standing
/// in for it, has an `/Encrypt` entry. Body text mentioning it does not count.
fn has_encryption_dictionary(bytes: &[u8]) -> bool {
    trailer_dictionary(bytes).is_some_and(|dict| find(dict, ENCRYPT_KEY).is_some())
}

fn trailer_dictionary(bytes: &[u8]) -> Option<&[u8]> {
    if let Some(at) = rfind(bytes, TRAILER_KEY) {
        return Some(&bytes[at..]);
    }

    // PDF 1.5+: startxref points at an XRef stream object instead.
    let after = &bytes[rfind(bytes, STARTXREF_KEY)? + STARTXREF_KEY.len()..];
    let offset: String = after
        .iter()
        .skip_while(|b| b.is_ascii_whitespace())
        .take_while(|b| b.is_ascii_digit())
        .map(|&b| char::from(b))
        .collect();
    let object = bytes.get(offset.parse::<usize>().ok()?..)?;
    let end = find(object, STREAM_KEY).unwrap_or(object.len());
    Some(&object[..end])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|window| window == needle)
}
