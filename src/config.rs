//! Configuration for the statement service.
//!
//! All runtime knobs live in [`ServerConfig`], built via
//! [`ServerConfig::builder()`]. The binary maps CLI flags and environment
//! variables onto the builder; tests build it directly.

use crate::error::StatementError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Default request-body cap for `/parse-statement`: 16 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Default number of characters of extracted text echoed back to the client.
pub const DEFAULT_PREVIEW_CHARS: usize = 500;

/// Provider named in the hint when none can be resolved from the environment.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Default LLM model.
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

/// Configuration for the HTTP service.
///
/// # Example
/// ```rust
/// use statement2json::ServerConfig;
///
/// let config = ServerConfig::builder()
///     .bind_addr("127.0.0.1:8080".parse().unwrap())
///     .preview_chars(200)
///     .build()
///     .unwrap();
/// assert_eq!(config.preview_chars, 200);
/// ```
#[derive(Clone)]
pub struct ServerConfig {
    /// Socket address the server listens on. Default: `0.0.0.0:5000`.
    pub bind_addr: SocketAddr,

    /// Maximum accepted request body for uploads, in bytes. Default: 16 MiB.
    ///
    /// Bodies above this are rejected with 413 before the handler runs.
    pub max_upload_bytes: usize,

    /// Directory temporary uploads are written to. Default: the OS temp dir.
    ///
    /// Each upload gets its own randomly named file here, removed before the
    /// response is sent.
    pub upload_dir: PathBuf,

    /// Characters of extracted text returned as `extracted_text_preview`. Default: 500.
    pub preview_chars: usize,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic"). If None, the
    /// provider is resolved from the environment, so `GEMINI_API_KEY` alone
    /// selects gemini.
    pub provider_name: Option<String>,

    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature forwarded to the provider, if set.
    pub temperature: Option<f32>,

    /// Maximum output tokens forwarded to the provider, if set.
    pub max_tokens: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            upload_dir: std::env::temp_dir(),
            preview_chars: DEFAULT_PREVIEW_CHARS,
            provider_name: None,
            model: None,
            provider: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("upload_dir", &self.upload_dir)
            .field("preview_chars", &self.preview_chars)
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl ServerConfig {
    /// Create a new builder for `ServerConfig`.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model to request, falling back to [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn bind_addr(mut self, addr: SocketAddr) -> Self {
        self.config.bind_addr = addr;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = dir.into();
        self
    }

    pub fn preview_chars(mut self, n: usize) -> Self {
        self.config.preview_chars = n;
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, StatementError> {
        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err(StatementError::InvalidConfig(
                "Upload limit must be ≥ 1 byte".into(),
            ));
        }
        if c.upload_dir.as_os_str().is_empty() {
            return Err(StatementError::InvalidConfig(
                "Upload directory must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
