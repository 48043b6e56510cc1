//! Completion calls: turn one page's text into the model's raw reply.
//!
//! Prompt text lives in [`crate::prompts`] and parsing in [`super::parse`].
//! This module builds the two messages, calls the service once, and
//! classifies the outcome:
//!
//! | Outcome | Result |
//! |---------|--------|
//! | reply with text | `Ok(text)` |
//! | empty reply | WARN, `Ok("")` (zero rows) |
//! | service error | ERROR, `Err(PageError::CompletionFailed)` |
//!
//! There is no retry. A failed page is reported, never parsed.

use crate::config::ExtractionConfig;
use crate::error::{CompletionError, PageError, Pdf2XlsxError};
use crate::prompts::{task_prompt, SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// A text-completion backend.
///
/// Passed explicitly into the orchestrator so tests can substitute a
/// scripted stub for the network service.
pub trait CompletionService: Send + Sync {
    /// Send one system instruction and one user message; return the reply text.
    fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: usize,
    ) -> impl Future<Output = Result<String, CompletionError>> + Send;
}

/// [`CompletionService`] backed by an edgequake-llm provider.
#[derive(Clone)]
pub struct ProviderCompletion {
    provider: Arc<dyn LLMProvider>,
    temperature: Option<f32>,
}

impl ProviderCompletion {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Resolve the provider from the config.
    ///
    /// 1. **Pre-built provider** (`config.provider`) — used as-is.
    /// 2. **Named provider + model** — `config.provider_name` (default
    ///    `anthropic`) and `config.model` (default `claude-3-opus-20240229`)
    ///    through [`ProviderFactory::create_llm_provider`], which reads the
    ///    provider's API key (`ANTHROPIC_API_KEY`, …) from the environment.
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, Pdf2XlsxError> {
        let provider = match config.provider {
            Some(ref provider) => Arc::clone(provider),
            None => {
                let name = config.provider_name_or_default();
                let model = config.model_or_default();
                ProviderFactory::create_llm_provider(name, model).map_err(|e| {
                    Pdf2XlsxError::ProviderNotConfigured {
                        provider: name.to_string(),
                        hint: format!(
                            "Could not create provider '{name}' with model '{model}'.\n\
                            Set ANTHROPIC_API_KEY (or the key for your provider).\n\
                            Error: {e}"
                        ),
                    }
                })?
            }
        };
        Ok(Self::new(provider).with_temperature(config.temperature))
    }

    fn options(&self, max_tokens: usize) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_tokens: Some(max_tokens),
            ..Default::default()
        }
    }
}

impl CompletionService for ProviderCompletion {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: usize,
    ) -> Result<String, CompletionError> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(user)];
        let options = self.options(max_tokens);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| CompletionError::new(e.to_string()))?;

        debug!(
            "{} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Ask the service for the three-column extraction of one page.
///
/// `page_num` is 1-indexed and only used for logging and error reporting.
/// `system_prompt` overrides [`SYSTEM_PROMPT`] when given.
pub async fn request_extraction<C: CompletionService>(
    service: &C,
    page_num: usize,
    page_text: &str,
    system_prompt: Option<&str>,
    max_tokens: usize,
) -> Result<String, PageError> {
    let start = Instant::now();
    let system = system_prompt.unwrap_or(SYSTEM_PROMPT);
    let user = task_prompt(page_text);

    match service.complete(system, &user, max_tokens).await {
        Ok(reply) if reply.trim().is_empty() => {
            warn!("Page {}: response is empty or has no text content", page_num);
            Ok(String::new())
        }
        Ok(reply) => {
            debug!(
                "Page {}: {} reply chars in {:?}",
                page_num,
                reply.chars().count(),
                start.elapsed()
            );
            Ok(reply)
        }
        Err(e) => {
            error!("Page {}: error in API response: {}", page_num, e);
            Err(PageError::CompletionFailed {
                page: page_num,
                detail: e.to_string(),
            })
        }
    }
}
