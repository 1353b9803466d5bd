//! Post-processing: turn the interpreter's reply into a JSON object.
//!
//! Models are told to answer with bare JSON but frequently wrap it in a
//! ` ```json … ``` ` block anyway. The cleanup is literal: trim, delete every
//! fence marker, parse. No JSON repair is attempted; a reply that still does
//! not parse is reported to the client as a parse failure.

use crate::error::StatementError;
use serde_json::Value;

/// Strip surrounding whitespace and every literal code-fence marker.
pub fn strip_code_fences(raw: &str) -> String {
    raw.trim().replace("```json", "").replace("```", "")
}

/// Clean and parse an interpreter reply, requiring a top-level object.
pub fn parse_interpreter_json(raw: &str) -> Result<Value, StatementError> {
    let cleaned = strip_code_fences(raw);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|source| StatementError::ResponseParse { source })?;

    if value.is_object() {
        Ok(value)
    } else {
        Err(StatementError::UnexpectedResponseShape {
            found: json_kind(&value),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
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
    use serde_json::json;

    const BARE: &str = r#"{"account_number":null,"sort_code":"12-34-56","currency":"GBP","transactions":[]}"#;

    #[test]
    fn fenced_and_bare_parse_identically() {
        let fenced = format!("```json\n{BARE}\n```");
        assert_eq!(
            parse_interpreter_json(&fenced).unwrap(),
            parse_interpreter_json(BARE).unwrap()
        );
    }

    #[test]
    fn plain_fence_and_whitespace_are_removed() {
        let fenced = format!("\n\n  ```\n{BARE}\n```  \n");
        let value = parse_interpreter_json(&fenced).unwrap();
        assert_eq!(value["sort_code"], json!("12-34-56"));
        assert!(value["account_number"].is_null());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        let err = parse_interpreter_json("Sorry, I cannot read this statement.").unwrap_err();
        assert!(matches!(err, StatementError::ResponseParse { .. }));
    }

    #[test]
    fn non_object_is_rejected() {
        let err = parse_interpreter_json("```json\n[1, 2]\n```").unwrap_err();
        assert!(matches!(
            err,
            StatementError::UnexpectedResponseShape { found: "array" }
        ));
    }

    #[test]
    fn strip_only_touches_fences() {
        assert_eq!(strip_code_fences("  {\"a\": \"x\"}  "), "{\"a\": \"x\"}");
    }
}
