//! Error types for the statement2json service.
//!
//! Every orchestration step returns `Result<_, StatementError>`; nothing is
//! caught by a blanket handler. The variant decides both the HTTP status and
//! the message the client sees:
//!
//! * **Client input** (400): missing file, bad extension, no JSON body, or a
//!   PDF with no recoverable text.
//! * **Payload too large** (413): the request body exceeded the upload cap.
//! * **Interpreter output** (500): the model answered with something that is
//!   not a JSON object.
//! * **Unhandled** (500): extraction, storage, provider and LLM call failures.
//!   These are reported with a generic message plus the error's display string
//!   as `details`.

use axum::http::StatusCode;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// All errors produced while serving a request.
#[derive(Debug, Error)]
pub enum StatementError {
    // ── Client input ─────────────────────────────────────────────────────
    /// The multipart body has no `file` field (or is not multipart at all).
    #[error("No file provided")]
    MissingFile,

    /// The `file` field was sent with an empty filename.
    #[error("No file selected")]
    NoFileSelected,

    /// The uploaded filename does not end in `.pdf`.
    #[error("Only PDF files are allowed")]
    UnsupportedFileType { filename: String },

    /// The multipart stream broke off mid-body.
    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    /// The body exceeded the configured upload cap.
    #[error("File too large: the upload limit is {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// `/validate` was called without a usable JSON object.
    #[error("No JSON data provided")]
    NoJsonBody,

    // ── Extraction ───────────────────────────────────────────────────────
    /// Every page of the PDF was blank or image-only.
    #[error("Could not extract text from PDF")]
    NoExtractableText,

    /// The PDF library refused the file.
    #[error("Text extraction failed for '{path}': {detail}")]
    Extraction { path: PathBuf, detail: String },

    // ── Interpreter ──────────────────────────────────────────────────────
    /// The interpreter response was not valid JSON.
    #[error("Failed to parse AI response as JSON")]
    ResponseParse {
        #[source]
        source: serde_json::Error,
    },

    /// The interpreter response parsed, but is not a JSON object.
    #[error("Interpreter returned a JSON {found}, expected an object")]
    UnexpectedResponseShape { found: &'static str },

    /// The LLM call itself failed.
    #[error("LLM API error: {message}")]
    Interpreter { message: String },

    /// The configured provider could not be initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O ──────────────────────────────────────────────────────────────
    /// Could not create or write the temporary upload file.
    #[error("Failed to store upload in '{dir}': {source}")]
    Storage {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config ───────────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body sent for every failed request.
#[derive(Debug, Clone, Serialize, serde::Deserialize, PartialEq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl StatementError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            StatementError::MissingFile
            | StatementError::NoFileSelected
            | StatementError::UnsupportedFileType { .. }
            | StatementError::MalformedUpload(_)
            | StatementError::NoJsonBody
            | StatementError::NoExtractableText => StatusCode::BAD_REQUEST,
            StatementError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure was caused by the caller rather than the service.
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }

    /// Render the client-facing body.
    pub fn body(&self) -> ErrorBody {
        match self {
            StatementError::ResponseParse { source } => ErrorBody {
                error: self.to_string(),
                details: Some(source.to_string()),
            },
            e if e.is_client_error() => ErrorBody {
                error: e.to_string(),
                details: None,
            },
            e => ErrorBody {
                error: "An error occurred while processing the file".to_string(),
                details: Some(e.to_string()),
            },
        }
    }
}
