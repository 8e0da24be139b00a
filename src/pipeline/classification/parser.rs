use serde::Deserialize;
use serde_json::Value;

use super::sanitize::sanitize_oracle_output;
use super::ClassificationError;
use crate::models::{DestinationId, Verdict};

/// Oracle answer after decoding, before it is checked against a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAnswer {
    pub candidate: Verdict,
    /// Every destination the oracle reported as fully satisfied, when given.
    pub qualified: Option<Vec<DestinationId>>,
}

#[derive(Deserialize)]
struct RawAnswer {
    #[serde(default, alias = "destination_id")]
    folder_id: Option<Value>,
    #[serde(default)]
    qualified: Option<Vec<Value>>,
}

/// Sanitize and decode raw oracle output.
///
/// Never defaults to `Unmatched` on a decoding problem: anything that is
/// not a JSON object with a usable `folder_id` is `MalformedResponse`.
pub fn parse_oracle_response(raw: &str) -> Result<ParsedAnswer, ClassificationError> {
    let cleaned = sanitize_oracle_output(raw);
    if cleaned.is_empty() {
        return Err(ClassificationError::MalformedResponse(
            "empty answer after sanitation".into(),
        ));
    }

    let object = decode_object(&cleaned)?;
    let answer: RawAnswer = serde_json::from_value(object)
        .map_err(|e| ClassificationError::MalformedResponse(e.to_string()))?;

    let candidate = match answer.folder_id {
        None | Some(Value::Null) => {
            return Err(ClassificationError::MalformedResponse(
                "answer is missing folder_id".into(),
            ))
        }
        Some(value) => parse_verdict(&value)?,
    };

    let qualified = answer
        .qualified
        .map(|values| {
            values
                .iter()
                .map(parse_identifier)
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    Ok(ParsedAnswer {
        candidate,
        qualified,
    })
}

/// Decode the answer as a JSON object, falling back to the outermost
/// `{…}` span when the model wrapped it in prose.
fn decode_object(text: &str) -> Result<Value, ClassificationError> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => return Ok(value),
        Ok(other) => {
            return Err(ClassificationError::MalformedResponse(format!(
                "expected a JSON object, got {}",
                json_type_name(&other)
            )))
        }
        Err(_) => {}
    }

    let span = text
        .find('{')
        .zip(text.rfind('}'))
        .filter(|(start, end)| start < end);

    let Some((start, end)) = span else {
        return Err(ClassificationError::MalformedResponse(
            "no JSON object in answer".into(),
        ));
    };

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(other) => Err(ClassificationError::MalformedResponse(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
        Err(e) => Err(ClassificationError::MalformedResponse(e.to_string())),
    }
}

fn parse_verdict(value: &Value) -> Result<Verdict, ClassificationError> {
    if let Value::String(s) = value {
        if is_none_sentinel(s) {
            return Ok(Verdict::Unmatched);
        }
    }
    parse_identifier(value).map(Verdict::Matched)
}

fn parse_identifier(value: &Value) -> Result<DestinationId, ClassificationError> {
    match value {
        Value::String(s) => s.parse::<DestinationId>().map_err(|_| {
            ClassificationError::MalformedResponse(format!("'{s}' is not a folder identifier"))
        }),
        Value::Number(n) => n.as_i64().map(DestinationId).ok_or_else(|| {
            ClassificationError::MalformedResponse(format!("{n} is not a folder identifier"))
        }),
        other => Err(ClassificationError::MalformedResponse(format!(
            "folder identifier must be a string or integer, got {}",
            json_type_name(other)
        ))),
    }
}

fn is_none_sentinel(s: &str) -> bool {
    let s = s.trim();
    s.eq_ignore_ascii_case("none") || s.eq_ignore_ascii_case("n/a")
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorKind;

    fn matched(raw: &str) -> i64 {
        match parse_oracle_response(raw).unwrap().candidate {
            Verdict::Matched(id) => id.0,
            Verdict::Unmatched => panic!("expected a match for {raw}"),
        }
    }

    fn malformed(raw: &str) {
        let err = parse_oracle_response(raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedResponse, "input: {raw}");
    }

    #[test]
    fn string_identifier() {
        assert_eq!(matched(r#"{"folder_id": "5"}"#), 5);
    }

    #[test]
    fn integer_identifier() {
        assert_eq!(matched(r#"{"folder_id": 12}"#), 12);
    }

    #[test]
    fn destination_id_alias() {
        assert_eq!(matched(r#"{"destination_id": "8"}"#), 8);
    }

    #[test]
    fn sentinels_are_unmatched() {
        for raw in [
            r#"{"folder_id": "none"}"#,
            r#"{"folder_id": "None"}"#,
            r#"{"folder_id": "N/A"}"#,
            r#"{"folder_id": "n/a"}"#,
        ] {
            assert_eq!(parse_oracle_response(raw).unwrap().candidate, Verdict::Unmatched);
        }
    }

    #[test]
    fn think_wrapped_answer() {
        let raw = "<think>\nFolder 3 requires pdf, this is txt.\n</think>\n\n{\"folder_id\": \"N/A\"}";
        assert_eq!(parse_oracle_response(raw).unwrap().candidate, Verdict::Unmatched);
    }

    #[test]
    fn fenced_answer() {
        assert_eq!(matched("```json\n{\"folder_id\": \"4\"}\n```"), 4);
    }

    #[test]
    fn prose_around_object_tolerated() {
        assert_eq!(matched("The answer is {\"folder_id\": \"6\"} as requested."), 6);
    }

    #[test]
    fn reasoning_field_ignored() {
        let raw = r#"{"folder_id": "2", "reasoning": ["req 1 passes", "req 2 passes"]}"#;
        assert_eq!(matched(raw), 2);
    }

    #[test]
    fn qualified_list_decoded() {
        let raw = r#"{"folder_id": "2", "qualified": ["2", 5]}"#;
        let parsed = parse_oracle_response(raw).unwrap();
        assert_eq!(parsed.qualified, Some(vec![DestinationId(2), DestinationId(5)]));
    }

    #[test]
    fn bare_identifier_is_malformed() {
        malformed("5");
        malformed("\"5\"");
    }

    #[test]
    fn free_text_is_malformed() {
        malformed("I think it belongs in folder five.");
    }

    #[test]
    fn missing_field_is_malformed() {
        malformed(r#"{"answer": "5"}"#);
        malformed(r#"{"folder_id": null}"#);
    }

    #[test]
    fn non_numeric_identifier_is_malformed() {
        malformed(r#"{"folder_id": "invoices"}"#);
        malformed(r#"{"folder_id": 2.5}"#);
        malformed(r#"{"folder_id": ["2"]}"#);
    }

    #[test]
    fn bad_qualified_entry_is_malformed() {
        malformed(r#"{"folder_id": "2", "qualified": ["none"]}"#);
    }

    #[test]
    fn empty_and_truncated_are_malformed() {
        malformed("");
        malformed("<think>never finished");
        malformed(r#"{"folder_id": "#);
    }
}
