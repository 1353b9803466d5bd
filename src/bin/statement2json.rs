//! Server binary for statement2json.
//!
//! A thin shim over the library crate that maps CLI flags to `ServerConfig`,
//! builds the pdfium extractor and LLM interpreter once, and serves.

use anyhow::{Context, Result};
use clap::Parser;
use statement2json::{AppState, LlmInterpreter, PdfiumExtractor, ServerConfig};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"ENDPOINTS:
  GET  /health           Health check
  POST /parse-statement  Parse PDF bank statement (multipart field "file")
  POST /validate         Validate account number and sort code (JSON body)

EXAMPLES:
  # Serve on the default port with Gemini
  GEMINI_API_KEY=... statement2json

  # Parse a statement
  curl -F file=@statement.pdf http://localhost:5000/parse-statement

  # Validate identifiers
  curl -H 'content-type: application/json' \
       -d '{"account_number":"12345678","sort_code":"12-34-56"}' \
       http://localhost:5000/validate

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (GENAI_API_KEY is accepted too)
  OPENAI_API_KEY          OpenAI API key, with --provider openai
  ANTHROPIC_API_KEY       Anthropic API key, with --provider anthropic
  EDGEQUAKE_LLM_PROVIDER  Provider used with EDGEQUAKE_MODEL when --provider is unset
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download
  PDFIUM_AUTO_CACHE_DIR   Override the default pdfium cache directory
  RUST_LOG                Log filter, e.g. statement2json=debug,tower_http=debug
"#;

/// Serve the PDF bank statement parser over HTTP.
#[derive(Parser, Debug)]
#[command(
    name = "statement2json",
    version,
    about = "Turn PDF bank statements into structured JSON over HTTP",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "STATEMENT2JSON_BIND", default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set\n\
          (GEMINI_API_KEY selects gemini).\n\
          Supported: gemini, openai, anthropic, azure, ollama."
    )]
    provider: Option<String>,

    /// LLM model ID (default: gemini-3-pro-preview).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// Directory for temporary uploads (default: the OS temp dir).
    #[arg(long, env = "STATEMENT2JSON_UPLOAD_DIR")]
    upload_dir: Option<PathBuf>,

    /// Maximum upload size in MiB.
    #[arg(long, env = "STATEMENT2JSON_MAX_UPLOAD_MB", default_value_t = 16,
          value_parser = clap::value_parser!(u64).range(1..=1024))]
    max_upload_mb: u64,

    /// Characters of extracted text returned as a preview.
    #[arg(long, default_value_t = 500)]
    preview_chars: usize,

    /// Sampling temperature forwarded to the model.
    #[arg(long)]
    temperature: Option<f32>,

    /// Maximum output tokens forwarded to the model.
    #[arg(long)]
    max_tokens: Option<usize>,

    /// Debug-level logs.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Errors only.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // Must happen before the runtime spawns worker threads.
    alias_genai_key();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    // ── Ensure PDFium engine is available ────────────────────────────────
    // With `--features bundled` the embedded library is extracted into the
    // pdfium-auto cache. Otherwise the first start downloads it (~30 MB);
    // later starts only check the path.
    let lib_path = tokio::task::block_in_place(PdfiumExtractor::prepare)
        .context("Failed to prepare PDFium engine")?;
    info!("PDFium library: {}", lib_path.display());

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    match config.provider_name {
        Some(ref name) => info!("Using provider '{}' with model '{}'", name, config.model_or_default()),
        None => info!("No --provider given, auto-detecting from environment"),
    }

    let interpreter =
        LlmInterpreter::from_config(&config).context("Failed to initialise LLM provider")?;
    let state = AppState::new(
        Arc::new(PdfiumExtractor::new()),
        Arc::new(interpreter),
        &config,
    );

    statement2json::serve(&config, state)
        .await
        .context("Server stopped with an error")
}

/// Map CLI args to `ServerConfig`.
fn build_config(cli: &Cli) -> Result<ServerConfig> {
    let mut builder = ServerConfig::builder()
        .bind_addr(cli.bind)
        .max_upload_bytes((cli.max_upload_mb * 1024 * 1024) as usize)
        .preview_chars(cli.preview_chars);

    if let Some(ref dir) = cli.upload_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create upload directory {:?}", dir))?;
        builder = builder.upload_dir(dir.clone());
    }
    if let Some(ref name) = cli.provider {
        builder = builder.provider_name(name);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(t) = cli.temperature {
        builder = builder.temperature(t);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }

    builder.build().context("Invalid configuration")
}

/// Accept `GENAI_API_KEY` as an alias for `GEMINI_API_KEY`.
fn alias_genai_key() {
    let gemini_set = std::env::var("GEMINI_API_KEY").is_ok_and(|v| !v.is_empty());
    if gemini_set {
        return;
    }
    if let Ok(key) = std::env::var("GENAI_API_KEY") {
        if !key.is_empty() {
            std::env::set_var("GEMINI_API_KEY", key);
        }
    }
}
