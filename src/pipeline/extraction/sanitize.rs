/// Normalize extracted text before it reaches the prompt.
///
/// Strips a leading BOM, unifies line endings to `\n`, trims trailing
/// whitespace per line, drops control characters other than newline and
/// tab, collapses runs of blank lines to one, and trims blank lines at
/// both ends. Interior indentation is preserved.
pub fn normalize_text(raw: &str) -> String {
    let raw = raw.strip_prefix('\u{FEFF}').unwrap_or(raw);
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0usize;
    for line in unified.split('\n') {
        let cleaned: String = line
            .chars()
            .filter(|c| *c == '\t' || !c.is_control())
            .collect();
        let cleaned = cleaned.trim_end();

        if cleaned.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blank_run > 0 {
                out.push('\n');
            }
        }
        blank_run = 0;
        out.push_str(cleaned);
    }
    out
}
