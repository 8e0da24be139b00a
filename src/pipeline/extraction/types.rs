use std::fmt;

/// Source formats the extractor understands, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    PlainText,
    WordDocument,
    Presentation,
    DelimitedTable,
    Spreadsheet(SpreadsheetKind),
    PortableDocument,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetKind {
    /// BIFF `.xls`
    Legacy,
    /// OOXML `.xlsx`
    Modern,
}

impl SourceFormat {
    /// Flat dispatch on a lowercased extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "txt" => Some(Self::PlainText),
            "docx" => Some(Self::WordDocument),
            "pptx" => Some(Self::Presentation),
            "csv" => Some(Self::DelimitedTable),
            "xls" => Some(Self::Spreadsheet(SpreadsheetKind::Legacy)),
            "xlsx" => Some(Self::Spreadsheet(SpreadsheetKind::Modern)),
            "pdf" => Some(Self::PortableDocument),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "text",
            Self::WordDocument => "docx",
            Self::Presentation => "pptx",
            Self::DelimitedTable => "csv",
            Self::Spreadsheet(SpreadsheetKind::Legacy) => "xls",
            Self::Spreadsheet(SpreadsheetKind::Modern) => "xlsx",
            Self::PortableDocument => "pdf",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text of one physical page (or slide), numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page_number: usize,
    pub text: String,
}

/// Render pages with `--- Page N ---` markers.
///
/// Pages without text are skipped, but numbering keeps the physical
/// position so markers still match the source document.
pub fn render_pages(pages: &[PageText]) -> String {
    let mut out = String::new();
    for page in pages {
        if page.text.trim().is_empty() {
            continue;
        }
        out.push_str(&format!("\n--- Page {} ---\n{}\n", page.page_number, page.text));
    }
    out
}
