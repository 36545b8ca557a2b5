//! Plain text reading

use super::is_binary_content;
use crate::error::{Error, Result};
use std::path::Path;

/// Read a file as UTF-8 text; binary or non-UTF-8 content is an error
pub fn read_plain_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;

    if is_binary_content(&bytes) {
        return Err(Error::Parse(format!(
            "{} looks like a binary file",
            path.display()
        )));
    }

    String::from_utf8(bytes)
        .map_err(|e| Error::Parse(format!("{} is not valid UTF-8: {}", path.display(), e)))
}
