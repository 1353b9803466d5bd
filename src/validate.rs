//! Format checks for UK bank identifiers.
//!
//! Both checks are total: any input, including the empty string, yields a
//! boolean. Callers holding an optional value pass `value.unwrap_or("")`.

use once_cell::sync::Lazy;
use regex::Regex;

// `[0-9]` rather than `\d`: the regex crate's `\d` matches every Unicode digit.
static RE_ACCOUNT_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{8}$").unwrap());

static RE_SORT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{2}-[0-9]{2}-[0-9]{2}$").unwrap());

/// `true` iff `value` is exactly eight ASCII digits.
pub fn validate_account(value: &str) -> bool {
    RE_ACCOUNT_NUMBER.is_match(value)
}

/// `true` iff `value` has the shape `DD-DD-DD`.
pub fn validate_sort_code(value: &str) -> bool {
    RE_SORT_CODE.is_match(value)
}
