//! Text extraction: pull the text layer out of every page of a PDF.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is neither async-aware
//! nor cheap on large documents. [`extract_text`] moves the work onto Tokio's
//! blocking pool so request-serving worker threads never stall on it.
//!
//! Extraction sits behind the [`TextExtractor`] trait so the HTTP layer can be
//! exercised in tests without a pdfium library on the machine.

use crate::error::StatementError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Produces the concatenated text of a PDF file.
///
/// Implementations are called from a blocking thread and may do synchronous I/O.
pub trait TextExtractor: Send + Sync {
    /// Return the text of every page in order. Blank pages contribute nothing.
    fn extract_text(&self, path: &Path) -> Result<String, StatementError>;
}

/// [`TextExtractor`] backed by pdfium, bound through `pdfium-auto`.
///
/// The library is located via `PDFIUM_LIB_PATH` or the `pdfium-auto` cache,
/// and downloaded on first use when neither has it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumExtractor;

impl PdfiumExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Make sure the pdfium library is available and return its path.
    ///
    /// With the `bundled` feature the embedded library is extracted into the
    /// `pdfium-auto` cache; otherwise it is downloaded if not cached yet.
    /// Blocking. Call once at startup so the first request does not pay for it.
    pub fn prepare() -> Result<PathBuf, StatementError> {
        #[cfg(feature = "bundled")]
        let resolved = pdfium_auto::ensure_pdfium_bundled();
        #[cfg(not(feature = "bundled"))]
        let resolved = pdfium_auto::ensure_pdfium_library(None);

        resolved.map_err(|e| StatementError::Internal(format!("PDFium unavailable: {}", e)))
    }
}

impl TextExtractor for PdfiumExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, StatementError> {
        let pdfium = pdfium_auto::bind_pdfium_silent().map_err(|e| StatementError::Extraction {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let document = pdfium.load_pdf_from_file(path, None).map_err(|e: PdfiumError| {
            let err_str = format!("{:?}", e);
            let detail = if err_str.contains("Password") || err_str.contains("password") {
                "PDF is encrypted and requires a password".to_string()
            } else {
                err_str
            };
            StatementError::Extraction {
                path: path.to_path_buf(),
                detail,
            }
        })?;

        let pages = document.pages();
        debug!("PDF loaded: {} pages", pages.len());

        let mut texts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let text = page.text().map_err(|e| StatementError::Extraction {
                path: path.to_path_buf(),
                detail: format!("page {}: {:?}", idx + 1, e),
            })?;
            texts.push(text.all());
        }

        Ok(join_pages(texts))
    }
}

/// Concatenate page texts, each non-empty page followed by a newline.
pub fn join_pages<I>(pages: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut full_text = String::new();
    for page in pages {
        let page = page.as_ref();
        if !page.is_empty() {
            full_text.push_str(page);
            full_text.push('\n');
        }
    }
    full_text
}

/// Run `extractor` on `path` inside the blocking pool.
pub async fn extract_text(
    extractor: Arc<dyn TextExtractor>,
    path: PathBuf,
) -> Result<String, StatementError> {
    let text = tokio::task::spawn_blocking(move || extractor.extract_text(&path))
        .await
        .map_err(|e| StatementError::Internal(format!("Extraction task panicked: {}", e)))??;

    info!("Extracted {} characters of text", text.chars().count());
    Ok(text)
}
