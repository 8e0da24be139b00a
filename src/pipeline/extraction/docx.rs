use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use docx_rs::{
    read_docx, Break, BreakType, DocumentChild, Paragraph, ParagraphChild, Run, RunChild, Table,
    TableCellContent, TableChild, TableRowChild,
};

use super::pdf::extract_pdf;
use super::sanitize::normalize_text;
use super::types::{render_pages, PageText};
use super::ExtractionError;

const DEFAULT_CONVERTER_TIMEOUT: Duration = Duration::from_secs(120);
const CONVERTER_POLL: Duration = Duration::from_millis(50);

/// External office converter (e.g. `soffice`) used to obtain true page
/// layout by rendering the document to PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentConverter {
    program: String,
    leading_args: Vec<String>,
    timeout: Duration,
}

impl DocumentConverter {
    /// Parse a whitespace-separated command line: program then fixed args.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            leading_args: parts.collect(),
            timeout: DEFAULT_CONVERTER_TIMEOUT,
        })
    }

    /// Upper bound on one conversion; the process is killed past it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Convert `source` to PDF inside `out_dir`, returning the PDF path.
    fn convert_to_pdf(&self, source: &Path, out_dir: &Path) -> Result<PathBuf, ExtractionError> {
        // Fixed input name so the output name is predictable.
        let input = out_dir.join("input.docx");
        std::fs::copy(source, &input)?;

        // stderr goes to a file so a chatty converter cannot fill a pipe.
        let log_path = out_dir.join("converter.log");
        let log = File::create(&log_path)?;

        let mut child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(["--headless", "--convert-to", "pdf", "--outdir"])
            .arg(out_dir)
            .arg(&input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(log)
            .spawn()
            .map_err(|e| ExtractionError::Converter(format!("{}: {e}", self.program)))?;

        let status = self.wait_with_deadline(&mut child)?;
        if !status.success() {
            let stderr = std::fs::read_to_string(&log_path).unwrap_or_default();
            return Err(ExtractionError::Converter(format!(
                "{} exited with {}: {}",
                self.program,
                status,
                stderr.trim()
            )));
        }

        let pdf = out_dir.join("input.pdf");
        if !pdf.exists() {
            return Err(ExtractionError::Converter(format!(
                "{} produced no PDF",
                self.program
            )));
        }
        Ok(pdf)
    }

    fn wait_with_deadline(&self, child: &mut Child) -> Result<ExitStatus, ExtractionError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                if let Err(e) = child.kill().and_then(|()| child.wait()) {
                    tracing::warn!(program = %self.program, error = %e, "Could not stop converter");
                }
                return Err(ExtractionError::Converter(format!(
                    "{} timed out after {:?}",
                    self.program, self.timeout
                )));
            }
            std::thread::sleep(CONVERTER_POLL);
        }
    }
}

/// Extract a Word document with page markers.
///
/// With a converter the document is rendered to PDF in a scratch
/// directory that is removed on every exit path. Without one, pages are
/// split at the explicit page breaks in the document body.
pub fn extract_docx(
    path: &Path,
    converter: Option<&DocumentConverter>,
) -> Result<String, ExtractionError> {
    match converter {
        Some(converter) => {
            let scratch = tempfile::tempdir()?;
            let pdf = converter.convert_to_pdf(path, scratch.path())?;
            extract_pdf(&pdf)
        }
        None => {
            let bytes = std::fs::read(path)?;
            let pages = docx_pages(&bytes)?;
            Ok(render_pages(&pages))
        }
    }
}

/// Pages of a docx package, walking body paragraphs and tables in order.
/// Drawing content (text boxes, shapes) is not part of the flow.
pub fn docx_pages(bytes: &[u8]) -> Result<Vec<PageText>, ExtractionError> {
    let docx = read_docx(bytes).map_err(|e| ExtractionError::Archive(e.to_string()))?;

    let mut pages = PageCollector::default();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => pages.paragraph(p),
            DocumentChild::Table(t) => pages.table(t),
            _ => {}
        }
    }
    Ok(pages.finish())
}

struct PageCollector {
    pages: Vec<String>,
    page_break: Break,
}

impl Default for PageCollector {
    fn default() -> Self {
        Self {
            pages: vec![String::new()],
            page_break: Break::new(BreakType::Page),
        }
    }
}

impl PageCollector {
    fn current(&mut self) -> &mut String {
        if self.pages.is_empty() {
            self.pages.push(String::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn paragraph(&mut self, paragraph: &Paragraph) {
        for child in &paragraph.children {
            self.paragraph_child(child);
        }
        self.current().push('\n');
    }

    fn paragraph_child(&mut self, child: &ParagraphChild) {
        match child {
            ParagraphChild::Run(run) => self.run(run),
            ParagraphChild::Hyperlink(link) => {
                for inner in &link.children {
                    self.paragraph_child(inner);
                }
            }
            _ => {}
        }
    }

    fn run(&mut self, run: &Run) {
        for child in &run.children {
            match child {
                RunChild::Text(t) => self.current().push_str(&t.text),
                RunChild::Tab(_) => self.current().push('\t'),
                RunChild::Break(br) if *br == self.page_break => self.pages.push(String::new()),
                RunChild::Break(_) => self.current().push('\n'),
                _ => {}
            }
        }
    }

    fn table(&mut self, table: &Table) {
        for row in &table.rows {
            if let TableChild::TableRow(row) = row {
                for cell in &row.cells {
                    if let TableRowChild::TableCell(cell) = cell {
                        for content in &cell.children {
                            match content {
                                TableCellContent::Paragraph(p) => self.paragraph(p),
                                TableCellContent::Table(t) => self.table(t),
                                _ => {}
                            }
                        }
                    }
                }
            }
        }
    }

    fn finish(self) -> Vec<PageText> {
        self.pages
            .iter()
            .enumerate()
            .map(|(i, text)| PageText {
                page_number: i + 1,
                text: normalize_text(text),
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{make_test_docx, paragraph, text_box};
    use super::*;

    const PAGE_BREAK: &str = r#"<w:p><w:r><w:br w:type="page"/></w:r></w:p>"#;

    #[test]
    fn single_page_without_breaks() {
        let body = format!("{}{}", paragraph("Curriculum Vitae"), paragraph("Rust &amp; Go"));
        let pages = docx_pages(&make_test_docx(&body)).unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].text, "Curriculum Vitae\nRust & Go");
    }

    #[test]
    fn explicit_page_breaks_split_pages() {
        let body = format!("{}{PAGE_BREAK}{}", paragraph("One"), paragraph("Two"));
        let pages = docx_pages(&make_test_docx(&body)).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].text, "One");
        assert_eq!(pages[1].text, "Two");
    }

    #[test]
    fn line_break_and_tab_inside_paragraph() {
        let body = r#"<w:p><w:r><w:t>Name:</w:t><w:tab/><w:t>Ada</w:t><w:br/><w:t>Role</w:t></w:r></w:p>"#;
        let pages = docx_pages(&make_test_docx(body)).unwrap();
        assert_eq!(pages[0].text, "Name:\tAda\nRole");
    }

    #[test]
    fn table_cells_read_in_order() {
        let body = format!(
            "{}<w:tbl><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>{}",
            paragraph("Skills"),
            paragraph("Rust"),
            paragraph("SQL"),
            paragraph("End"),
        );
        let pages = docx_pages(&make_test_docx(&body)).unwrap();
        assert_eq!(pages[0].text, "Skills\nRust\nSQL\nEnd");
    }

    #[test]
    fn text_box_alternate_content_not_doubled() {
        let body = format!("{}{}", text_box("CONFIDENTIAL"), paragraph("Quarterly report"));
        let pages = docx_pages(&make_test_docx(&body)).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].text.contains("Quarterly report"));
        assert!(pages[0].text.matches("CONFIDENTIAL").count() <= 1, "{}", pages[0].text);
    }

    #[test]
    fn extract_renders_markers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.docx");
        let body = format!("{}{PAGE_BREAK}{}", paragraph("Intro"), paragraph("Body"));
        std::fs::write(&path, make_test_docx(&body)).unwrap();

        let text = extract_docx(&path, None).unwrap();
        assert_eq!(text, "\n--- Page 1 ---\nIntro\n\n--- Page 2 ---\nBody\n");
    }

    #[test]
    fn not_a_zip_is_archive_error() {
        let err = docx_pages(b"plain bytes").unwrap_err();
        assert!(matches!(err, ExtractionError::Archive(_)));
    }

    #[test]
    fn converter_command_line_parsed() {
        let conv = DocumentConverter::parse("flatpak run org.libreoffice.LibreOffice").unwrap();
        assert_eq!(conv.program, "flatpak");
        assert_eq!(conv.leading_args, vec!["run", "org.libreoffice.LibreOffice"]);
        assert_eq!(conv.timeout(), Duration::from_secs(120));
        assert!(DocumentConverter::parse("   ").is_none());

        let conv = conv.with_timeout(Duration::from_secs(30));
        assert_eq!(conv.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn missing_converter_program_is_converter_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.docx");
        std::fs::write(&path, make_test_docx(&paragraph("x"))).unwrap();

        let conv = DocumentConverter::parse("munch-no-such-converter-binary").unwrap();
        let err = extract_docx(&path, Some(&conv)).unwrap_err();
        assert!(matches!(err, ExtractionError::Converter(_)));
    }

    #[cfg(unix)]
    #[test]
    fn converter_output_paginated_as_pdf() {
        use crate::pipeline::extraction::pdf::fixtures::make_test_pdf;

        let dir = tempfile::tempdir().unwrap();
        let rendered = dir.path().join("rendered.pdf");
        std::fs::write(&rendered, make_test_pdf(&["Converted page", "Next page"])).unwrap();

        // Stand-in converter: args are --headless --convert-to pdf --outdir DIR SRC
        let script = dir.path().join("convert.sh");
        std::fs::write(
            &script,
            format!("cp '{}' \"$5/input.pdf\"\n", rendered.display()),
        )
        .unwrap();

        let source = dir.path().join("a.docx");
        std::fs::write(&source, make_test_docx(&paragraph("ignored"))).unwrap();

        let conv = DocumentConverter::parse(&format!("sh {}", script.display())).unwrap();
        let text = extract_docx(&source, Some(&conv)).unwrap();
        assert!(text.contains("--- Page 1 ---"));
        assert!(text.contains("--- Page 2 ---"));
        assert!(text.contains("Converted"));
        assert!(!text.contains("ignored"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_converter_reports_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fail.sh");
        std::fs::write(&script, "echo 'no display' >&2\nexit 3\n").unwrap();
        let source = dir.path().join("a.docx");
        std::fs::write(&source, make_test_docx(&paragraph("x"))).unwrap();

        let conv = DocumentConverter::parse(&format!("sh {}", script.display())).unwrap();
        let err = extract_docx(&source, Some(&conv)).unwrap_err();
        assert!(err.to_string().contains("no display"));
    }

    #[cfg(unix)]
    #[test]
    fn hung_converter_killed_at_deadline() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("hang.sh");
        std::fs::write(&script, "exec sleep 30\n").unwrap();
        let source = dir.path().join("a.docx");
        let original = make_test_docx(&paragraph("x"));
        std::fs::write(&source, &original).unwrap();

        let conv = DocumentConverter::parse(&format!("sh {}", script.display()))
            .unwrap()
            .with_timeout(Duration::from_millis(300));
        let started = Instant::now();
        let err = extract_docx(&source, Some(&conv)).unwrap_err();

        assert!(matches!(err, ExtractionError::Converter(_)));
        assert!(err.to_string().contains("timed out"), "{err}");
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(std::fs::read(&source).unwrap(), original);
    }
}
