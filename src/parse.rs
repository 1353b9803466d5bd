//! Statement parsing: the `/parse-statement` flow, independent of HTTP.
//!
//! ```text
//! Upload ─▶ store ─▶ extract ─▶ discard ─▶ interpret ─▶ postprocess ─▶ validate
//!          (temp)   (pdfium)   (temp)     (LLM)        (fences/JSON)   (regex)
//! ```
//!
//! Each stage returns `Result<_, StatementError>` and the first failure ends
//! the request. The temporary file is removed as soon as the text is out; if
//! storing or extraction fails, dropping [`crate::pipeline::upload::StoredUpload`]
//! removes it instead.

use crate::config::ServerConfig;
use crate::error::StatementError;
use crate::output::{preview, ParseResponse, ValidationReport};
use crate::pipeline::extract::{self, TextExtractor};
use crate::pipeline::interpret::StatementInterpreter;
use crate::pipeline::postprocess;
use crate::pipeline::upload::{self, Upload};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Everything one `/parse-statement` request needs, shared across requests.
#[derive(Clone)]
pub struct StatementParser {
    extractor: Arc<dyn TextExtractor>,
    interpreter: Arc<dyn StatementInterpreter>,
    upload_dir: PathBuf,
    preview_chars: usize,
}

impl fmt::Debug for StatementParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementParser")
            .field("extractor", &"<dyn TextExtractor>")
            .field("interpreter", &"<dyn StatementInterpreter>")
            .field("upload_dir", &self.upload_dir)
            .field("preview_chars", &self.preview_chars)
            .finish()
    }
}

impl StatementParser {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        interpreter: Arc<dyn StatementInterpreter>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            extractor,
            interpreter,
            upload_dir: config.upload_dir.clone(),
            preview_chars: config.preview_chars,
        }
    }

    /// Parse one uploaded statement into the response body.
    ///
    /// # Errors
    /// - [`StatementError::NoExtractableText`] when the PDF has no text layer
    /// - [`StatementError::ResponseParse`] / [`StatementError::UnexpectedResponseShape`]
    ///   when the interpreter reply is not a JSON object
    /// - storage, extraction and interpreter failures as their own variants
    pub async fn parse(&self, upload: &Upload) -> Result<ParseResponse, StatementError> {
        let start = Instant::now();
        info!("Parsing statement '{}' ({} bytes)", upload.filename, upload.size());

        // ── Step 1: Store upload ─────────────────────────────────────────
        let stored = upload::store(upload, &self.upload_dir).await?;
        debug!("Stored upload at {}", stored.path().display());

        // ── Step 2: Extract text ─────────────────────────────────────────
        let extracted =
            extract::extract_text(Arc::clone(&self.extractor), stored.path().to_path_buf()).await;
        stored.discard();
        let statement_text = extracted?;

        if statement_text.trim().is_empty() {
            return Err(StatementError::NoExtractableText);
        }

        // ── Step 3: Interpret ────────────────────────────────────────────
        let raw = self.interpreter.interpret(&statement_text).await?;
        debug!("Interpreter reply: {} bytes", raw.len());

        // ── Step 4: Clean and parse ──────────────────────────────────────
        let data = postprocess::parse_interpreter_json(&raw)?;

        // ── Step 5: Validate ─────────────────────────────────────────────
        let validation = ValidationReport::for_statement(&data);

        info!(
            "Parsed '{}' in {}ms (account valid: {}, sort code valid: {})",
            upload.filename,
            start.elapsed().as_millis(),
            validation.account_number_valid,
            validation.sort_code_valid
        );

        Ok(ParseResponse {
            success: true,
            data,
            validation,
            extracted_text_preview: preview(&statement_text, self.preview_chars),
        })
    }
}
