use std::io::Cursor;
use std::path::Path;

use calamine::{Reader, Xls, Xlsx};

use super::types::SpreadsheetKind;
use super::ExtractionError;

/// Extract a delimited text table as a grid table.
pub fn extract_csv(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes.as_slice());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ExtractionError::Spreadsheet(e.to_string()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(render_grid(&rows))
}

/// Extract the first worksheet of a workbook as a grid table.
pub fn extract_workbook(path: &Path, kind: SpreadsheetKind) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path)?;
    let rows = match kind {
        SpreadsheetKind::Legacy => {
            let mut workbook = Xls::new(Cursor::new(bytes))
                .map_err(|e| ExtractionError::Spreadsheet(e.to_string()))?;
            first_sheet_rows(&mut workbook)?
        }
        SpreadsheetKind::Modern => {
            let mut workbook = Xlsx::new(Cursor::new(bytes))
                .map_err(|e| ExtractionError::Spreadsheet(e.to_string()))?;
            first_sheet_rows(&mut workbook)?
        }
    };
    Ok(render_grid(&rows))
}

fn first_sheet_rows<R>(workbook: &mut R) -> Result<Vec<Vec<String>>, ExtractionError>
where
    R: Reader<Cursor<Vec<u8>>>,
    R::Error: std::fmt::Display,
{
    let Some(range) = workbook.worksheet_range_at(0) else {
        return Ok(Vec::new());
    };
    let range = range.map_err(|e| ExtractionError::Spreadsheet(e.to_string()))?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

/// Render rows as a grid table. The first row is the header and is
/// underlined with `=`; ragged rows are padded with empty cells.
pub fn render_grid(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    if columns == 0 {
        return String::new();
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            (0..columns)
                .map(|i| {
                    row.get(i)
                        .map(|c| c.replace(['\r', '\n'], " ").trim().to_string())
                        .unwrap_or_default()
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = (0..columns)
        .map(|i| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let rule = |fill: char| -> String {
        let mut line = String::from("+");
        for w in &widths {
            line.extend(std::iter::repeat(fill).take(w + 2));
            line.push('+');
        }
        line
    };
    let render_row = |row: &[String]| -> String {
        let mut line = String::from("|");
        for (cell, w) in row.iter().zip(&widths) {
            let pad = w - cell.chars().count();
            line.push(' ');
            line.push_str(cell);
            line.extend(std::iter::repeat(' ').take(pad + 1));
            line.push('|');
        }
        line
    };

    let mut lines = vec![rule('-')];
    for (i, row) in cells.iter().enumerate() {
        lines.push(render_row(row));
        lines.push(rule(if i == 0 { '=' } else { '-' }));
    }
    lines.join("\n")
}
