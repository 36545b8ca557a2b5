//! PDF text extraction

use crate::error::{Error, Result};
use std::path::Path;

/// Extract page text from a PDF, each page followed by a newline
#[cfg(feature = "pdf")]
pub fn read_pdf(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;

    // pdf-extract panics on some malformed inputs
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(&bytes))
        .map_err(|_| Error::Parse(format!("{}: PDF parser panicked", path.display())))?
        .map_err(|e| Error::Parse(format!("{}: {}", path.display(), e)))?;

    let mut text = String::new();
    for page in pages {
        text.push_str(&page);
        text.push('\n');
    }
    Ok(text)
}

/// PDF support is compiled out
#[cfg(not(feature = "pdf"))]
pub fn read_pdf(path: &Path) -> Result<String> {
    Err(Error::Parse(format!(
        "{}: PDF support is disabled (build with the 'pdf' feature)",
        path.display()
    )))
}
