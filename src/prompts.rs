//! Prompt template sent to the statement interpreter.
//!
//! Kept in one place so the contract with the model (field names, null
//! handling, currency) can be inspected by unit tests without an LLM.

/// Instructions that precede the statement text.
///
/// The JSON shape listed here is the contract the response handler relies on:
/// `account_number` and `sort_code` are read back for validation, the rest is
/// returned to the client untouched.
pub const STATEMENT_PROMPT: &str = r#"You are an expert UK bank statement parser.
Extract information from ANY UK bank statement.
RULES:
- Account number = 8 digits
- Sort code format = XX-XX-XX
- Currency = GBP
- Identify debit vs credit automatically
- Return ONLY valid JSON
- Use null where data is missing
JSON FORMAT:
{
  "account_number": "",
  "sort_code": "",
  "currency": "GBP",
  "transactions": [
    {
      "date": "",
      "description": "",
      "debit": null,
      "credit": null,
      "balance": null
    }
  ]
}
STATEMENT TEXT:
"#;

/// Build the full prompt for one statement.
pub fn statement_prompt(statement_text: &str) -> String {
    format!("{STATEMENT_PROMPT}{statement_text}\n")
}
