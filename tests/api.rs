//! HTTP-level tests for statement2json.
//!
//! The router runs in-process via `tower::ServiceExt::oneshot`. pdfium and the
//! LLM are replaced by stubs: the extractor reads the "PDF" as UTF-8 text (or
//! fails on demand) and remembers every path it was handed, the interpreter
//! returns a canned reply and remembers the text it received.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use futures::future::BoxFuture;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use statement2json::{
    router, AppState, ServerConfig, StatementError, StatementInterpreter, TextExtractor,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

// ── Stubs ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct FileTextExtractor {
    seen: Mutex<Vec<PathBuf>>,
    fail_with: Option<String>,
}

impl FileTextExtractor {
    fn failing(detail: impl Into<String>) -> Self {
        Self {
            seen: Mutex::default(),
            fail_with: Some(detail.into()),
        }
    }
}

impl TextExtractor for FileTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, StatementError> {
        self.seen.lock().unwrap().push(path.to_path_buf());
        assert!(path.exists(), "upload must be on disk during extraction");
        if let Some(ref detail) = self.fail_with {
            return Err(StatementError::Extraction {
                path: path.to_path_buf(),
                detail: detail.clone(),
            });
        }
        let bytes = std::fs::read(path).map_err(|e| StatementError::Extraction {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

struct CannedInterpreter {
    reply: Result<String, String>,
    received: Mutex<Vec<String>>,
}

impl CannedInterpreter {
    fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
            received: Mutex::new(Vec::new()),
        }
    }

    fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(message.into()),
            received: Mutex::new(Vec::new()),
        }
    }
}

impl StatementInterpreter for CannedInterpreter {
    fn interpret<'a>(&'a self, statement_text: &'a str) -> BoxFuture<'a, Result<String, StatementError>> {
        Box::pin(async move {
            self.received.lock().unwrap().push(statement_text.to_string());
            self.reply
                .clone()
                .map_err(|message| StatementError::Interpreter { message })
        })
    }
}

// ── Harness ──────────────────────────────────────────────────────────────────

const STATEMENT_JSON: &str = r#"{
  "account_number": "12345678",
  "sort_code": "12-34-56",
  "currency": "GBP",
  "transactions": [
    {"date": "01/03/2024", "description": "CARD PAYMENT TESCO", "debit": 12.5, "credit": null, "balance": 987.5}
  ]
}"#;

const STATEMENT_TEXT: &str = "Sort code 12-34-56 Account 12345678\n01/03/2024 CARD PAYMENT TESCO 12.50 987.50";

struct Harness {
    app: Router,
    extractor: Arc<FileTextExtractor>,
    interpreter: Arc<CannedInterpreter>,
    upload_dir: TempDir,
}

impl Harness {
    fn new(interpreter: CannedInterpreter) -> Self {
        Self::with_limit(interpreter, 16 * 1024 * 1024)
    }

    fn with_limit(interpreter: CannedInterpreter, max_upload_bytes: usize) -> Self {
        Self::build(FileTextExtractor::default(), interpreter, max_upload_bytes)
    }

    fn with_extractor(extractor: FileTextExtractor, interpreter: CannedInterpreter) -> Self {
        Self::build(extractor, interpreter, 16 * 1024 * 1024)
    }

    fn build(
        extractor: FileTextExtractor,
        interpreter: CannedInterpreter,
        max_upload_bytes: usize,
    ) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let upload_dir = tempfile::tempdir().unwrap();
        let config = ServerConfig::builder()
            .upload_dir(upload_dir.path())
            .max_upload_bytes(max_upload_bytes)
            .build()
            .unwrap();

        let extractor = Arc::new(extractor);
        let interpreter = Arc::new(interpreter);
        let state = AppState::new(
            Arc::clone(&extractor) as Arc<dyn TextExtractor>,
            Arc::clone(&interpreter) as Arc<dyn StatementInterpreter>,
            &config,
        );

        Self {
            app: router(state),
            extractor,
            interpreter,
            upload_dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn seen_paths(&self) -> Vec<PathBuf> {
        self.extractor.seen.lock().unwrap().clone()
    }

    fn upload_dir_is_empty(&self) -> bool {
        std::fs::read_dir(self.upload_dir.path()).unwrap().next().is_none()
    }
}

const BOUNDARY: &str = "statement2json-test-boundary";

fn multipart_body(field: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"{field}\"; filename=\"{name}\""),
        None => format!("form-data; name=\"{field}\""),
    };
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: application/pdf\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::post("/parse-statement")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn statement_upload(filename: &str, content: &str) -> Request<Body> {
    upload_request(multipart_body("file", Some(filename), content.as_bytes()))
}

fn json_request(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// ── /health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn health_reports_healthy() {
    let h = Harness::new(CannedInterpreter::replying(STATEMENT_JSON));
    let (status, body) = h
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "message": "API is running"}));
}

// ── /validate ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn validate_accepts_well_formed_identifiers() {
    let h = Harness::new(CannedInterpreter::replying(STATEMENT_JSON));
    let (status, body) = h
        .send(json_request(
            "/validate",
            r#"{"account_number":"12345678","sort_code":"11-22-33"}"#,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "account_number": "12345678",
            "account_valid": true,
            "sort_code": "11-22-33",
            "sort_code_valid": true
        })
    );
}

#[tokio::test]
async fn validate_empty_object_echoes_empty_strings() {
    let h = Harness::new(CannedInterpreter::replying(STATEMENT_JSON));
    let (status, body) = h.send(json_request("/validate", "{}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account_number"], "");
    assert_eq!(body["sort_code"], "");
    assert_eq!(body["account_valid"], false);
    assert_eq!(body["sort_code_valid"], false);
}

#[tokio::test]
async fn validate_rejects_malformed_values() {
    let h = Harness::new(CannedInterpreter::replying(STATEMENT_JSON));
    let (status, body) = h
        .send(json_request(
            "/validate",
            r#"{"account_number":"1234567","sort_code":"12/34/56"}"#,
        ))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["account_valid"], false);
    assert_eq!(body["sort_code_valid"], false);
}

#[tokio::test]
async fn validate_without_json_body_is_400() {
    let h = Harness::new(CannedInterpreter::replying(STATEMENT_JSON));

    let no_body = Request::post("/validate").body(Body::empty()).unwrap();
    let (status, body) = h.send(no_body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No JSON data provided");

    let (status, _) = h.send(json_request("/validate", "null")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = h.send(json_request("/validate", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ── /parse-statement: input checks ───────────────────────────────────────────

#[tokio::test]
async fn parse_without_file_field_is_400() {
    let h = Harness::new(CannedInterpreter::replying(STATEMENT_JSON));
    let (status, body) = h
        .send(upload_request(multipart_body("other", Some("a.pdf"), b"x")))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file provided");
    assert!(h.seen_paths().is_empty());
}

#[tokio::test]
async fn parse_non_multipart_body_is_400() {
    let h = Harness::new(CannedInterpreter::replying(STATEMENT_JSON));
    let (status, body) = h.send(json_request("/parse-statement", "{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file provided");
}

#[tokio::test]
async fn parse_empty_filename_is_400() {
    let h = Harness::new(CannedInterpreter::replying(STATEMENT_JSON));
    let (status, body) = h.send(statement_upload("", STATEMENT_TEXT)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file selected");
}

#[tokio::test]
async fn parse_txt_file_is_400_and_writes_nothing() {
    let h = Harness::new(CannedInterpreter::replying(STATEMENT_JSON));
    let (status, body) = h.send(statement_upload("statement.txt", STATEMENT_TEXT)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Only PDF files are allowed");
    assert!(h.seen_paths().is_empty());
    assert!(h.upload_dir_is_empty());
}

#[tokio::test]
async fn parse_oversized_body_is_413() {
    let h = Harness::with_limit(CannedInterpreter::replying(STATEMENT_JSON), 1024);
    let big = "x".repeat(8 * 1024);
    let (status, _) = h.send(statement_upload("statement.pdf", &big)).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(h.seen_paths().is_empty());
}

// ── /parse-statement: happy path ─────────────────────────────────────────────

#[tokio::test]
async fn parse_returns_data_validation_and_preview() {
    let h = Harness::new(CannedInterpreter::replying(STATEMENT_JSON));
    let (status, body) = h.send(statement_upload("March.PDF", STATEMENT_TEXT)).await;

    assert_eq!(status, StatusCode::OK, "body: {body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"], serde_json::from_str::<Value>(STATEMENT_JSON).unwrap());
    assert_eq!(
        body["validation"],
        json!({"account_number_valid": true, "sort_code_valid": true})
    );
    assert_eq!(body["extracted_text_preview"], STATEMENT_TEXT);

    let received = h.interpreter.received.lock().unwrap().clone();
    assert_eq!(received, vec![STATEMENT_TEXT.to_string()]);
}

#[tokio::test]
async fn parse_fenced_reply_matches_bare_reply() {
    let bare = Harness::new(CannedInterpreter::replying(STATEMENT_JSON));
    let fenced = Harness::new(CannedInterpreter::replying(format!(
        "```json\n{STATEMENT_JSON}\n```"
    )));

    let (s1, b1) = bare.send(statement_upload("s.pdf", STATEMENT_TEXT)).await;
    let (s2, b2) = fenced.send(statement_upload("s.pdf", STATEMENT_TEXT)).await;

    assert_eq!(s1, StatusCode::OK);
    assert_eq!(s2, StatusCode::OK);
    assert_eq!(b1, b2);
}

#[tokio::test]
async fn parse_null_identifiers_are_invalid() {
    let reply = r#"{"account_number":null,"sort_code":null,"currency":"GBP","transactions":[]}"#;
    let h = Harness::new(CannedInterpreter::replying(reply));
    let (status, body) = h.send(statement_upload("s.pdf", STATEMENT_TEXT)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["account_number"].is_null());
    assert_eq!(
        body["validation"],
        json!({"account_number_valid": false, "sort_code_valid": false})
    );
}

#[tokio::test]
async fn parse_preview_is_first_500_characters() {
    let h = Harness::new(CannedInterpreter::replying(STATEMENT_JSON));
    let long_text = "£".repeat(800);
    let (status, body) = h.send(statement_upload("s.pdf", &long_text)).await;

    assert_eq!(status, StatusCode::OK);
    let preview = body["extracted_text_preview"].as_str().unwrap();
    assert_eq!(preview.chars().count(), 500);
    assert!(preview.chars().all(|c| c == '£'));
}

// ── /parse-statement: failures ───────────────────────────────────────────────

#[tokio::test]
async fn parse_whitespace_only_text_is_400() {
    let h = Harness::new(CannedInterpreter::replying(STATEMENT_JSON));
    let (status, body) = h.send(statement_upload("scan.pdf", " \n\t \n")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Could not extract text from PDF");
    assert!(h.interpreter.received.lock().unwrap().is_empty());
    assert!(h.upload_dir_is_empty());
}

#[tokio::test]
async fn parse_non_json_reply_is_500_with_details() {
    let h = Harness::new(CannedInterpreter::replying("I could not find any transactions."));
    let (status, body) = h.send(statement_upload("s.pdf", STATEMENT_TEXT)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Failed to parse AI response as JSON");
    assert!(body["details"].as_str().is_some_and(|d| !d.is_empty()));
    assert!(body.get("data").is_none());
    assert!(h.upload_dir_is_empty());
}

#[tokio::test]
async fn parse_array_reply_is_500() {
    let h = Harness::new(CannedInterpreter::replying("[]"));
    let (status, body) = h.send(statement_upload("s.pdf", STATEMENT_TEXT)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "An error occurred while processing the file");
}

#[tokio::test]
async fn parse_interpreter_failure_is_500() {
    let h = Harness::new(CannedInterpreter::failing("quota exceeded"));
    let (status, body) = h.send(statement_upload("s.pdf", STATEMENT_TEXT)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "An error occurred while processing the file");
    assert!(body["details"].as_str().unwrap().contains("quota exceeded"));
    assert!(h.upload_dir_is_empty());
}

#[tokio::test]
async fn parse_extractor_failure_is_500_and_removes_upload() {
    let h = Harness::with_extractor(
        FileTextExtractor::failing("corrupt xref table"),
        CannedInterpreter::replying(STATEMENT_JSON),
    );
    let (status, body) = h.send(statement_upload("broken.pdf", STATEMENT_TEXT)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "An error occurred while processing the file");
    assert!(body["details"].as_str().unwrap().contains("corrupt xref table"));

    let seen = h.seen_paths();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].exists());
    assert!(h.upload_dir_is_empty());
    assert!(h.interpreter.received.lock().unwrap().is_empty());
}

// ── Temporary files ──────────────────────────────────────────────────────────

#[tokio::test]
async fn temp_file_is_removed_after_success() {
    let h = Harness::new(CannedInterpreter::replying(STATEMENT_JSON));
    let (status, _) = h.send(statement_upload("statement.pdf", STATEMENT_TEXT)).await;
    assert_eq!(status, StatusCode::OK);

    let seen = h.seen_paths();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].starts_with(h.upload_dir.path()));
    assert!(!seen[0].exists());
    assert!(h.upload_dir_is_empty());
}

#[tokio::test]
async fn concurrent_identical_filenames_use_distinct_paths() {
    let h = Harness::new(CannedInterpreter::replying(STATEMENT_JSON));
    let (a, b) = tokio::join!(
        h.send(statement_upload("statement.pdf", "first statement")),
        h.send(statement_upload("statement.pdf", "second statement")),
    );
    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);
    assert_eq!(a.1["extracted_text_preview"], "first statement");
    assert_eq!(b.1["extracted_text_preview"], "second statement");

    let seen = h.seen_paths();
    assert_eq!(seen.len(), 2);
    assert_ne!(seen[0], seen[1]);
    assert!(h.upload_dir_is_empty());
}
