//! Statement interpretation: hand the raw text to an LLM and return its reply.
//!
//! The call is made exactly once per request. There is no retry and no local
//! timeout; whatever the provider enforces applies. Prompt wording lives in
//! [`crate::prompts`], response cleanup in [`super::postprocess`].

use crate::config::{ServerConfig, DEFAULT_PROVIDER};
use crate::error::StatementError;
use crate::prompts::statement_prompt;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Turns raw statement text into a reply expected to contain a JSON object.
///
/// Shared read-only across requests, so implementations must be `Send + Sync`.
pub trait StatementInterpreter: Send + Sync {
    fn interpret<'a>(&'a self, statement_text: &'a str) -> BoxFuture<'a, Result<String, StatementError>>;
}

/// [`StatementInterpreter`] backed by an `edgequake-llm` provider.
pub struct LlmInterpreter {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl fmt::Debug for LlmInterpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmInterpreter")
            .field("provider", &"<dyn LLMProvider>")
            .field("temperature", &self.options.temperature)
            .field("max_tokens", &self.options.max_tokens)
            .finish()
    }
}

impl LlmInterpreter {
    /// Wrap an already-built provider.
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ServerConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }

    /// Resolve the provider described by `config` and wrap it.
    pub fn from_config(config: &ServerConfig) -> Result<Self, StatementError> {
        let provider = resolve_provider(config)?;
        Ok(Self::new(provider, config))
    }
}

impl StatementInterpreter for LlmInterpreter {
    fn interpret<'a>(&'a self, statement_text: &'a str) -> BoxFuture<'a, Result<String, StatementError>> {
        Box::pin(async move {
            let start = Instant::now();
            let messages = vec![ChatMessage::user(statement_prompt(statement_text))];

            let response = self
                .provider
                .chat(&messages, Some(&self.options))
                .await
                .map_err(|e| StatementError::Interpreter {
                    message: e.to_string(),
                })?;

            debug!(
                "Interpreter: {} input tokens, {} output tokens",
                response.prompt_tokens, response.completion_tokens
            );
            info!("Interpreter replied in {:?}", start.elapsed());

            Ok(response.content)
        })
    }
}

/// Build `CompletionOptions` from the server config.
fn build_options(config: &ServerConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
        ..Default::default()
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, StatementError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        StatementError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model` or the
///    default model. The factory reads the matching API key
///    (`GEMINI_API_KEY`, `OPENAI_API_KEY`, …) from the environment.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`.
/// 4. **Gemini key** `GEMINI_API_KEY` selects [`DEFAULT_PROVIDER`] with
///    `config.model` or the default model.
/// 5. **Auto-detection** via `ProviderFactory::from_env`.
pub fn resolve_provider(config: &ServerConfig) -> Result<Arc<dyn LLMProvider>, StatementError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if std::env::var("GEMINI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_provider(DEFAULT_PROVIDER, config.model_or_default());
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| StatementError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY (default provider: {}), or another provider's key.\n\
                Error: {}",
                DEFAULT_PROVIDER, e
            ),
        })?;

    Ok(llm_provider)
}
