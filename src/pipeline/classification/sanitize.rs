//! Strips model artifacts from raw oracle output before decoding.

use std::sync::LazyLock;

use regex::Regex;

static THINK_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>").expect("valid regex"));

static UNUSED_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<unused\d+>").expect("valid regex"));

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json|JSON)?").expect("valid regex"));

/// Remove reasoning blocks, stray tokenizer markers and code fences.
///
/// Handles:
/// 1. Closed `<think>…</think>` blocks
/// 2. A dangling prefix ending in `</think>` (opening tag lost upstream)
/// 3. An unclosed trailing `<think>` (answer cut off mid-reasoning)
/// 4. `<unusedN>` tokens from Gemma-family tokenizers
/// 5. Markdown code fences
pub fn sanitize_oracle_output(raw: &str) -> String {
    let mut text = THINK_BLOCK_RE.replace_all(raw, "").into_owned();

    if let Some(idx) = text.rfind("</think>") {
        text = text[idx + "</think>".len()..].to_string();
    }
    if let Some(idx) = text.find("<think>") {
        text.truncate(idx);
    }

    text = UNUSED_TOKEN_RE.replace_all(&text, "").into_owned();
    text = FENCE_RE.replace_all(&text, "").into_owned();

    text.trim().to_string()
}
