use std::path::Path;

use super::sanitize::normalize_text;
use super::ExtractionError;

/// Read a UTF-8 text file and normalize it. Invalid UTF-8 is an error,
/// never silently replaced.
pub fn extract_plain_text(path: &Path) -> Result<String, ExtractionError> {
    let bytes = std::fs::read(path)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| ExtractionError::Encoding(format!("not valid UTF-8: {e}")))?;
    Ok(normalize_text(&text))
}
