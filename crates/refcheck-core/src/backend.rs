use std::path::Path;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to open PDF: {0}")]
    OpenError(String),
    #[error("failed to extract text: {0}")]
    ExtractionError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Turns a PDF into plain text for the LLM extraction step.
pub trait PdfBackend: Send + Sync {
    /// Text of every page in order. Text items on a page are joined with
    /// spaces, pages with newlines.
    fn extract_text(&self, path: &Path) -> Result<String, BackendError>;
}
