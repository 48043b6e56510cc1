//! Configuration types for a batch run.
//!
//! Every knob lives in [`ExtractionConfig`], built via
//! [`ExtractionConfigBuilder`]. The binary fills it from environment
//! variables and flags; library callers set only what they need and rely on
//! the defaults below for the rest.

use crate::error::Pdf2XlsxError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default input directory, relative to the working directory.
pub const DEFAULT_INPUT_DIR: &str = "PDFs";
/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "ExcelFiles";
/// Default completion token ceiling per page.
pub const DEFAULT_MAX_TOKENS: usize = 4000;
/// Provider used when none is named.
pub const DEFAULT_PROVIDER: &str = "anthropic";
/// Model used when none is named.
pub const DEFAULT_MODEL: &str = "claude-3-opus-20240229";

/// Configuration for a PDF-to-spreadsheet batch run.
///
/// # Example
/// ```rust
/// use pdf2xlsx::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .input_dir("reports")
///     .output_dir("sheets")
///     .max_tokens(2000)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 2000);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Directory scanned (non-recursively) for `*.pdf` files. Default: `PDFs`.
    pub input_dir: PathBuf,

    /// Directory receiving one `.xlsx` per input PDF. Default: `ExcelFiles`.
    /// Created if missing.
    pub output_dir: PathBuf,

    /// Maximum tokens the model may generate per page. Default: 4000.
    pub max_tokens: usize,

    /// Sampling temperature. `None` leaves the provider default in place.
    pub temperature: Option<f32>,

    /// Model identifier. If None, uses [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// edgequake-llm provider name (e.g. "anthropic", "openai").
    /// If None, uses [`DEFAULT_PROVIDER`].
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Custom system instruction. If None, uses
    /// [`crate::prompts::SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Pages of one file in flight at once. Default: 1 (sequential).
    ///
    /// Row order is the same for every value; only wall-clock time changes.
    pub concurrency: usize,

    /// Explicit pdfium library to bind to. If None, the working directory
    /// and then the system library are tried.
    pub pdfium_lib_path: Option<PathBuf>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            model: None,
            provider_name: None,
            provider: None,
            system_prompt: None,
            concurrency: 1,
            pdfium_lib_path: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("concurrency", &self.concurrency)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Model id after applying the default.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Provider name after applying the default.
    pub fn provider_name_or_default(&self) -> &str {
        self.provider_name.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Pdf2XlsxError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(Pdf2XlsxError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(Pdf2XlsxError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.input_dir == c.output_dir {
            return Err(Pdf2XlsxError::InvalidConfig(format!(
                "Input and output directory are both '{}'",
                c.input_dir.display()
            )));
        }
        Ok(self.config)
    }
}
