//! HTTP layer: routes, shared state, and error rendering.
//!
//! | Method | Path               | Handler            |
//! |--------|--------------------|--------------------|
//! | GET    | `/health`          | [`health_check`]   |
//! | POST   | `/parse-statement` | [`parse_statement`] |
//! | POST   | `/validate`        | [`validate_data`]  |

use crate::config::ServerConfig;
use crate::error::StatementError;
use crate::output::{HealthResponse, ParseResponse, ValidateRequest, ValidateResponse};
use crate::parse::StatementParser;
use crate::pipeline::extract::TextExtractor;
use crate::pipeline::interpret::StatementInterpreter;
use crate::pipeline::upload;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

/// Shared application state.
#[derive(Clone, Debug)]
pub struct AppState {
    parser: Arc<StatementParser>,
    max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        interpreter: Arc<dyn StatementInterpreter>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            parser: Arc::new(StatementParser::new(extractor, interpreter, config)),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

impl IntoResponse for StatementError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            debug!("Rejected request: {}", self);
        }
        (status, Json(self.body())).into_response()
    }
}

/// Build the router with every route and layer.
pub fn router(state: AppState) -> Router {
    let limit = state.max_upload_bytes;
    Router::new()
        .route("/health", get(health_check))
        .route("/parse-statement", post(parse_statement))
        .route("/validate", post(validate_data))
        .with_state(state)
        .layer(DefaultBodyLimit::max(limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// POST /parse-statement — multipart field `file` holding a PDF.
pub async fn parse_statement(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ParseResponse>, StatementError> {
    let multipart = multipart.map_err(|_| StatementError::MissingFile)?;
    let upload = upload::read_upload(multipart, state.max_upload_bytes).await?;
    let response = state.parser.parse(&upload).await?;
    Ok(Json(response))
}

/// POST /validate — JSON `{account_number?, sort_code?}`.
pub async fn validate_data(
    payload: Result<Json<Option<ValidateRequest>>, JsonRejection>,
) -> Result<Json<ValidateResponse>, StatementError> {
    let request = match payload {
        Ok(Json(Some(request))) => request,
        Ok(Json(None)) => return Err(StatementError::NoJsonBody),
        Err(rejection) => {
            debug!("Invalid /validate body: {}", rejection.body_text());
            return Err(StatementError::NoJsonBody);
        }
    };
    Ok(Json(ValidateResponse::from(request)))
}

/// Bind `config.bind_addr` and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<(), StatementError> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| StatementError::Internal(format!("Failed to bind {}: {}", config.bind_addr, e)))?;

    info!("Listening on http://{}", config.bind_addr);
    info!("  GET  /health           - Health check");
    info!("  POST /parse-statement  - Parse PDF bank statement");
    info!("  POST /validate         - Validate account number and sort code");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| StatementError::Internal(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutting down");
    }
}
