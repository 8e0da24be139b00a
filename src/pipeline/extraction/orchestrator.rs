use std::path::Path;
use std::time::Instant;

use uuid::Uuid;

use super::docx::{extract_docx, DocumentConverter};
use super::pdf::extract_pdf;
use super::pptx::extract_pptx;
use super::spreadsheet::{extract_csv, extract_workbook};
use super::text::extract_plain_text;
use super::types::SourceFormat;
use super::ExtractionError;
use crate::models::{ExtractedContent, FileTask};

/// Turns a file into the textual projection the oracle judges.
///
/// The format is chosen from the declared file name's extension, never
/// from the bytes. Extraction is read-only on the source file.
#[derive(Debug, Clone, Default)]
pub struct ContentExtractor {
    converter: Option<DocumentConverter>,
}

impl ContentExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render Word documents through an external converter for true
    /// page layout.
    pub fn with_converter(mut self, converter: Option<DocumentConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn extract(&self, task: &FileTask) -> Result<ExtractedContent, ExtractionError> {
        let extension = task.extension().unwrap_or_default();
        let format = SourceFormat::from_extension(&extension)
            .ok_or_else(|| ExtractionError::UnsupportedFormat(extension.clone()))?;

        let started = Instant::now();
        let text = self.extract_path(&task.source_path, format)?;

        tracing::info!(
            task_id = %task.task_id,
            format = %format,
            chars = text.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Content extracted"
        );

        Ok(ExtractedContent { extension, text })
    }

    fn extract_path(&self, path: &Path, format: SourceFormat) -> Result<String, ExtractionError> {
        match format {
            SourceFormat::PlainText => extract_plain_text(path),
            SourceFormat::WordDocument => extract_docx(path, self.converter.as_ref()),
            SourceFormat::Presentation => extract_pptx(path),
            SourceFormat::DelimitedTable => extract_csv(path),
            SourceFormat::Spreadsheet(kind) => extract_workbook(path, kind),
            SourceFormat::PortableDocument => extract_pdf(path),
        }
    }
}

/// Log an extraction fault without leaking content.
pub fn log_extraction_failure(task_id: Uuid, err: &ExtractionError) {
    tracing::warn!(
        task_id = %task_id,
        kind = %err.kind(),
        error = %err,
        "Content extraction failed"
    );
}
