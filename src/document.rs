//! Document text extraction
//!
//! Reads the raw text the segmenter operates on. Only plain UTF-8 text
//! files are supported; anything else is an unsupported-format load error.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Read the raw text of a document
pub fn read_text(path: &Path) -> Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("txt") => fs::read_to_string(path).map_err(|e| {
            Error::Load(format!("cannot read {}: {}", path.display(), e))
        }),
        _ => Err(Error::Load(format!(
            "unsupported document format: {} (expected .txt)",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_txt() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "Hello. World.").unwrap();

        let text = read_text(file.path()).unwrap();
        assert!(text.starts_with("Hello. World."));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        let err = read_text(file.path()).unwrap_err();
        assert!(matches!(err, Error::Load(_)));
        assert!(err.to_string().contains("unsupported"));
    }

    #[test]
    fn test_missing_file() {
        let err = read_text(Path::new("/nonexistent/file.txt")).unwrap_err();
        assert!(matches!(err, Error::Load(_)));
    }
}
