pub mod types;
pub mod sanitize;
pub mod text;
pub mod pdf;
pub mod ooxml;
pub mod docx;
pub mod pptx;
pub mod spreadsheet;
pub mod orchestrator;

pub use types::*;
pub use sanitize::*;
pub use orchestrator::*;

use thiserror::Error;

use crate::models::ErrorKind;

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Text encoding error: {0}")]
    Encoding(String),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("Office archive unreadable: {0}")]
    Archive(String),

    #[error("Spreadsheet unreadable: {0}")]
    Spreadsheet(String),

    #[error("Document converter failed: {0}")]
    Converter(String),
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            _ => ErrorKind::ExtractionFailure,
        }
    }
}

impl From<zip::result::ZipError> for ExtractionError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Archive(e.to_string())
    }
}
