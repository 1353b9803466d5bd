//! # statement2json
//!
//! An HTTP service that turns PDF bank statements into structured JSON.
//!
//! The PDF's text layer is read with pdfium; a large language model (Gemini
//! by default, any `edgequake-llm` provider works) converts that text into
//! account details and transactions; the account number and sort code are
//! then checked against UK formats.
//!
//! ## Request Flow
//!
//! ```text
//! POST /parse-statement (multipart `file`)
//!  │
//!  ├─ 1. Upload    check filename, write to a unique temp file
//!  ├─ 2. Extract   page text via pdfium (spawn_blocking), temp file removed
//!  ├─ 3. Interpret one LLM call with the statement prompt
//!  ├─ 4. Clean     strip ```json fences, parse the JSON object
//!  ├─ 5. Validate  account number (8 digits) and sort code (DD-DD-DD)
//!  └─ 6. Respond   {success, data, validation, extracted_text_preview}
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use statement2json::{AppState, LlmInterpreter, PdfiumExtractor, ServerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY from the environment
//!     let config = ServerConfig::builder().provider_name("gemini").build()?;
//!     let interpreter = LlmInterpreter::from_config(&config)?;
//!     let state = AppState::new(Arc::new(PdfiumExtractor::new()), Arc::new(interpreter), &config);
//!     statement2json::serve(&config, state).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Testing without pdfium or an API key
//!
//! Both collaborators sit behind traits ([`TextExtractor`],
//! [`StatementInterpreter`]); pass stub implementations to [`AppState::new`]
//! and drive [`router`] in-process.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod parse;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::{ErrorBody, StatementError};
pub use output::{HealthResponse, ParseResponse, ValidateRequest, ValidateResponse, ValidationReport};
pub use parse::StatementParser;
pub use pipeline::extract::{PdfiumExtractor, TextExtractor};
pub use pipeline::interpret::{LlmInterpreter, StatementInterpreter};
pub use pipeline::upload::Upload;
pub use server::{router, serve, AppState};
pub use validate::{validate_account, validate_sort_code};
