//! Input format detection.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Persisted document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Paged HTML
    Html,
    /// The JSON document model
    Json,
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Html => write!(f, "HTML"),
            InputFormat::Json => write!(f, "JSON"),
        }
    }
}

/// Bytes read from a file to detect its format.
const SNIFF_LEN: usize = 512;

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

/// Detect the format of a file from its leading bytes.
///
/// # Example
/// ```no_run
/// use pageflow::detect::{detect_format_from_path, InputFormat};
///
/// let format = detect_format_from_path("report.html").unwrap();
/// assert_eq!(format, InputFormat::Html);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<InputFormat> {
    let file = File::open(path)?;
    let mut header = Vec::with_capacity(SNIFF_LEN);
    BufReader::new(file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect the format from the leading bytes of a document.
///
/// JSON documents start with `{`; HTML starts with `<`. Leading whitespace
/// and a UTF-8 byte order mark are ignored.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<InputFormat> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    match data.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') => Ok(InputFormat::Json),
        Some(b'<') => Ok(InputFormat::Html),
        _ => Err(Error::UnknownFormat),
    }
}

/// Check if bytes look like a paged HTML document.
pub fn is_html_bytes(data: &[u8]) -> bool {
    matches!(detect_format_from_bytes(data), Ok(InputFormat::Html))
}

/// Check if bytes look like a JSON document.
pub fn is_json_bytes(data: &[u8]) -> bool {
    matches!(detect_format_from_bytes(data), Ok(InputFormat::Json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_html() {
        assert_eq!(
            detect_format_from_bytes(b"<!DOCTYPE html><html>").unwrap(),
            InputFormat::Html
        );
        assert!(is_html_bytes(b"\n  <div class=\"page\"></div>"));
    }

    #[test]
    fn test_detect_json() {
        assert_eq!(
            detect_format_from_bytes(b"\xef\xbb\xbf {\"pages\": []}").unwrap(),
            InputFormat::Json
        );
        assert!(is_json_bytes(b"{}"));
        assert!(!is_json_bytes(b"<p>{}</p>"));
    }

    #[test]
    fn test_detect_unknown() {
        assert!(matches!(
            detect_format_from_bytes(b"%PDF-1.7"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(detect_format_from_bytes(b"   "), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_detect_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{\"pages\": []}").unwrap();
        assert_eq!(detect_format_from_path(&path).unwrap(), InputFormat::Json);
    }
}
