//! Request and response bodies of the HTTP API.

use crate::validate::{validate_account, validate_sort_code};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `GET /health` body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            message: "API is running".to_string(),
        }
    }
}

/// Validity of the two identifiers in a parsed statement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub account_number_valid: bool,
    pub sort_code_valid: bool,
}

impl ValidationReport {
    /// Validate `account_number` and `sort_code` of a statement object.
    ///
    /// Missing, null, or non-string values count as the empty string.
    pub fn for_statement(data: &Value) -> Self {
        Self {
            account_number_valid: validate_account(str_field(data, "account_number")),
            sort_code_valid: validate_sort_code(str_field(data, "sort_code")),
        }
    }
}

fn str_field<'a>(data: &'a Value, name: &str) -> &'a str {
    data.get(name).and_then(Value::as_str).unwrap_or("")
}

/// `POST /parse-statement` success body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseResponse {
    pub success: bool,
    /// The interpreter's JSON object, unmodified.
    pub data: Value,
    pub validation: ValidationReport,
    pub extracted_text_preview: String,
}

/// `POST /validate` request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidateRequest {
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub sort_code: Option<String>,
}

/// `POST /validate` response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidateResponse {
    pub account_number: String,
    pub account_valid: bool,
    pub sort_code: String,
    pub sort_code_valid: bool,
}

impl From<ValidateRequest> for ValidateResponse {
    fn from(req: ValidateRequest) -> Self {
        let account_number = req.account_number.unwrap_or_default();
        let sort_code = req.sort_code.unwrap_or_default();
        Self {
            account_valid: validate_account(&account_number),
            sort_code_valid: validate_sort_code(&sort_code),
            account_number,
            sort_code,
        }
    }
}

/// First `n` characters of `text`.
pub fn preview(text: &str, n: usize) -> String {
    text.chars().take(n).collect()
}
