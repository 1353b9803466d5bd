//! Upload intake: read the multipart `file` field and park it on disk.
//!
//! ## Why a uniquely named temp file?
//!
//! pdfium opens documents by path, so the upload has to touch the file
//! system. Naming the file after the client's filename would let two
//! concurrent uploads of `statement.pdf` overwrite each other; instead every
//! upload gets a random name from [`tempfile`] with the sanitised original
//! filename appended for log readability. The file lives inside a
//! [`NamedTempFile`], so it is removed when the [`StoredUpload`] is dropped on
//! any exit path, including `?` propagation and panics.

use crate::error::StatementError;
use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Name of the multipart field carrying the statement.
pub const FILE_FIELD: &str = "file";

/// Used when sanitising strips the whole client filename.
const FALLBACK_FILENAME: &str = "statement.pdf";

/// Longest sanitised filename kept in the temp file name.
const MAX_SANITISED_LEN: usize = 64;

/// An upload received from the client, held in memory.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Filename as sent by the client.
    pub filename: String,
    /// Raw file content.
    pub bytes: Bytes,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Declared size of the upload in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// An upload written to the upload directory.
///
/// Dropping the value deletes the file; [`StoredUpload::discard`] does the
/// same but logs a failed deletion.
#[derive(Debug)]
pub struct StoredUpload {
    file: NamedTempFile,
}

impl StoredUpload {
    /// Path of the stored file.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the file now. Failures are logged and otherwise ignored.
    pub fn discard(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            warn!("Failed to delete upload {}: {}", path.display(), e);
        } else {
            debug!("Deleted upload {}", path.display());
        }
    }
}

/// `true` if the text after the last `.` is `pdf`, ignoring case.
pub fn is_pdf_filename(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
}

/// Reduce a client filename to a safe ASCII name.
///
/// Path separators become word breaks, whitespace runs become `_`, anything
/// outside `[A-Za-z0-9_.-]` is dropped, and leading/trailing `.`/`_` are
/// trimmed so the result can never name a parent directory or a dotfile.
pub fn secure_filename(filename: &str) -> String {
    let spaced: String = filename
        .chars()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    let kept: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let trimmed = kept.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    // Keep the tail so the extension survives truncation.
    let skip = trimmed.len().saturating_sub(MAX_SANITISED_LEN);
    trimmed[skip..].to_string()
}

/// Check the client-supplied filename of the `file` field.
fn check_filename(filename: Option<&str>) -> Result<String, StatementError> {
    match filename {
        None => Err(StatementError::MissingFile),
        Some("") => Err(StatementError::NoFileSelected),
        Some(name) if !is_pdf_filename(name) => Err(StatementError::UnsupportedFileType {
            filename: name.to_string(),
        }),
        Some(name) => Ok(name.to_string()),
    }
}

fn map_multipart_error(e: MultipartError, limit: usize) -> StatementError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        StatementError::PayloadTooLarge { limit }
    } else {
        StatementError::MalformedUpload(e.body_text())
    }
}

/// Pull the statement out of a multipart body.
///
/// Other fields are skipped. The filename is checked before the content is
/// read, so a rejected upload is never buffered or written.
pub async fn read_upload(mut multipart: Multipart, limit: usize) -> Result<Upload, StatementError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| map_multipart_error(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = check_filename(field.file_name())?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| map_multipart_error(e, limit))?;

        debug!("Received upload '{}' ({} bytes)", filename, bytes.len());
        return Ok(Upload::new(filename, bytes));
    }

    Err(StatementError::MissingFile)
}

/// Write `upload` to a fresh, uniquely named file inside `dir`.
pub async fn store(upload: &Upload, dir: &Path) -> Result<StoredUpload, StatementError> {
    let dir: PathBuf = dir.to_path_buf();
    let suffix = format!("-{}", secure_filename(&upload.filename));
    let bytes = upload.bytes.clone();

    tokio::task::spawn_blocking(move || {
        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(&dir)
            .map_err(|source| StatementError::Storage {
                dir: dir.clone(),
                source,
            })?;

        file.write_all(&bytes)
            .and_then(|_| file.flush())
            .map_err(|source| StatementError::Storage { dir, source })?;

        Ok(StoredUpload { file })
    })
    .await
    .map_err(|e| StatementError::Internal(format!("Storage task panicked: {}", e)))?
}
