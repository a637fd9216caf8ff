use std::path::Path;

use mupdf::{Document, TextPageFlags};

use refcheck_core::{BackendError, PdfBackend};

/// MuPDF-based implementation of [`PdfBackend`].
///
/// This crate isolates the mupdf dependency (AGPL-3.0) so that the rest of
/// the workspace does not link it transitively.
///
/// Within a page, text lines are joined with single spaces; pages are joined
/// with newlines. Layout beyond that is not preserved, which is all the LLM
/// prompt needs.
#[derive(Debug, Default)]
pub struct MupdfBackend;

impl MupdfBackend {
    pub fn new() -> Self {
        Self
    }
}

fn page_error(e: mupdf::Error) -> BackendError {
    BackendError::ExtractionError(e.to_string())
}

impl PdfBackend for MupdfBackend {
    fn extract_text(&self, path: &Path) -> Result<String, BackendError> {
        if !path.exists() {
            return Err(BackendError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} does not exist", path.display()),
            )));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| BackendError::OpenError("invalid path encoding".into()))?;

        let document =
            Document::open(path_str).map_err(|e| BackendError::OpenError(e.to_string()))?;

        let mut pages_text = Vec::new();
        for page_result in document.pages().map_err(page_error)? {
            let page = page_result.map_err(page_error)?;
            let text_page = page
                .to_text_page(TextPageFlags::empty())
                .map_err(page_error)?;

            let mut items = Vec::new();
            for block in text_page.blocks() {
                for line in block.lines() {
                    let line_text: String = line
                        .chars()
                        .map(|c| c.char().unwrap_or('\u{FFFD}'))
                        .collect();
                    let line_text = line_text.trim();
                    if !line_text.is_empty() {
                        items.push(line_text.to_string());
                    }
                }
            }
            pages_text.push(items.join(" "));
        }

        tracing::debug!(path = %path.display(), pages = pages_text.len(), "PDF text extracted");
        Ok(pages_text.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MupdfBackend::new()
            .extract_text(&dir.path().join("absent.pdf"))
            .unwrap_err();
        assert!(matches!(err, BackendError::Io(_)));
    }

    #[test]
    fn non_pdf_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"plain text, not a PDF").unwrap();
        assert!(MupdfBackend::new().extract_text(&path).is_err());
    }
}
