//! Document reading and text extraction
//!
//! This module handles:
//! - Format detection from the file extension
//! - Plain text reading (UTF-8, binary content rejected)
//! - PDF page text extraction (behind the `pdf` feature)
//!
//! Reading never fails the caller: any problem is logged and the document
//! degrades to empty text, so one bad file cannot abort a batch.

mod pdf;
mod text;

pub use pdf::*;
pub use text::*;

use crate::error::Result;
use std::path::Path;
use tracing::{debug, warn};

/// Document formats we can read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    PlainText,
}

impl DocumentFormat {
    /// Detect format from file extension (case-insensitive); anything not PDF is text
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("pdf") => DocumentFormat::Pdf,
            _ => DocumentFormat::PlainText,
        }
    }

    /// Extract the document's text
    pub fn extract(self, path: &Path) -> Result<String> {
        match self {
            DocumentFormat::Pdf => read_pdf(path),
            DocumentFormat::PlainText => read_plain_text(path),
        }
    }
}

/// Read a document's text, degrading to an empty string on any failure
pub fn read_document(path: &Path) -> String {
    let format = DocumentFormat::from_path(path);
    debug!(path = %path.display(), ?format, "Reading document");

    match format.extract(path) {
        Ok(text) => text,
        Err(e) => {
            if !path.exists() {
                warn!("File not found: {}", path.display());
            } else {
                warn!("Error reading {:?} file {}: {}", format, path.display(), e);
            }
            String::new()
        }
    }
}

/// Whether a path's extension is in the allowed list (case-insensitive, no dot)
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(ext)))
}

/// Check if content appears to be binary
pub fn is_binary_content(data: &[u8]) -> bool {
    // Check for null bytes in the first 8KB
    let check_len = std::cmp::min(data.len(), 8192);
    data[..check_len].iter().any(|&b| b == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            DocumentFormat::from_path(Path::new("paper.pdf")),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("PAPER.PDF")),
            DocumentFormat::Pdf
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("notes.txt")),
            DocumentFormat::PlainText
        );
        assert_eq!(
            DocumentFormat::from_path(Path::new("README")),
            DocumentFormat::PlainText
        );
    }

    #[test]
    fn test_read_missing_document_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(read_document(&tmp.path().join("missing.txt")), "");
        assert_eq!(read_document(&tmp.path().join("missing.pdf")), "");
    }

    #[test]
    fn test_read_plain_document() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.md");
        std::fs::write(&path, "# Title\n\nBody").unwrap();
        assert_eq!(read_document(&path), "# Title\n\nBody");
    }

    #[test]
    fn test_corrupt_pdf_is_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.4 this is not really a pdf").unwrap();
        assert_eq!(read_document(&path), "");
    }

    #[test]
    fn test_has_extension() {
        let exts = vec!["txt".to_string(), "md".to_string()];
        assert!(has_extension(Path::new("a.txt"), &exts));
        assert!(has_extension(Path::new("a.TXT"), &exts));
        assert!(has_extension(Path::new("a.md"), &exts));
        assert!(!has_extension(Path::new("a.pdf"), &exts));
        assert!(!has_extension(Path::new("Makefile"), &exts));
    }

    #[test]
    fn test_binary_detection() {
        assert!(is_binary_content(&[0x00, 0x01, 0x02]));
        assert!(!is_binary_content(b"Hello world"));
    }
}
