//! Error types for document extraction.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while extracting documents or writing the report.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("Failed to access file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to make sense of the slide deck structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// Failed to load or walk the page document.
    #[error("PDF parsing error: {0}")]
    PdfParseError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// An embedded image could not be decoded or re-encoded.
    #[error("Image error: {0}")]
    ImageError(String),

    /// The catalog file is missing, malformed, or empty.
    #[error("Catalog error: {0}")]
    CatalogError(String),
}
