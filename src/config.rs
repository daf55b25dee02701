//! Configuration types for a split-and-convert run.
//!
//! All run behaviour is controlled through [`SplitConfig`], built via its
//! [`SplitConfigBuilder`]. Settings that only matter to the vision converter
//! live in the nested [`VisionOptions`] so the default offline path does not
//! carry LLM knobs around.

use crate::error::SplitError;
use crate::progress::SplitProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for a split-and-convert run.
///
/// # Example
/// ```rust
/// use pdfsplit2md::{SplitConfig, WriteFailurePolicy};
///
/// let config = SplitConfig::builder()
///     .on_write_error(WriteFailurePolicy::Skip)
///     .build()
///     .unwrap();
/// assert_eq!(config.on_write_error, WriteFailurePolicy::Skip);
/// ```
#[derive(Clone, Default)]
pub struct SplitConfig {
    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// What to do when a page's Markdown file cannot be written. Default: abort.
    pub on_write_error: WriteFailurePolicy,

    /// Receives per-page progress events. `None` means silent.
    pub progress_callback: Option<Arc<dyn SplitProgressCallback>>,

    /// Settings for [`crate::converter::VisionConverter`].
    pub vision: VisionOptions,
}

impl fmt::Debug for SplitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitConfig")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("on_write_error", &self.on_write_error)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn SplitProgressCallback>"),
            )
            .field("vision", &self.vision)
            .finish()
    }
}

impl SplitConfig {
    /// Create a new builder for `SplitConfig`.
    pub fn builder() -> SplitConfigBuilder {
        SplitConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Upper bound for [`VisionOptions::max_retries`].
pub const MAX_RETRIES: u32 = 10;

/// Options used only by the vision (VLM) converter.
#[derive(Clone)]
pub struct VisionOptions {
    /// Rendering DPI. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Cap on the longest rendered edge in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// LLM model identifier. If None, the provider default is used.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per page. Default: 4096.
    pub max_tokens: usize,

    /// Retry attempts on a failed VLM call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Custom system prompt. If None, uses [`crate::prompts::DEFAULT_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,
}

impl Default for VisionOptions {
    fn default() -> Self {
        Self {
            dpi: 150,
            max_rendered_pixels: 2000,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.1,
            max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 500,
            api_timeout_secs: 60,
            system_prompt: None,
        }
    }
}

impl fmt::Debug for VisionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionOptions")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

/// Builder for [`SplitConfig`].
#[derive(Debug)]
pub struct SplitConfigBuilder {
    config: SplitConfig,
}

impl SplitConfigBuilder {
    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn on_write_error(mut self, policy: WriteFailurePolicy) -> Self {
        self.config.on_write_error = policy;
        self
    }

    pub fn progress_callback(mut self, cb: Arc<dyn SplitProgressCallback>) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.vision.dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.vision.max_rendered_pixels = px.max(100);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.vision.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.vision.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.vision.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.vision.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.vision.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.vision.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.vision.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.vision.api_timeout_secs = secs;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.vision.system_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SplitConfig, SplitError> {
        let v = &self.config.vision;
        if v.dpi < 72 || v.dpi > 400 {
            return Err(SplitError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                v.dpi
            )));
        }
        if v.max_tokens == 0 {
            return Err(SplitError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if v.max_retries > MAX_RETRIES {
            return Err(SplitError::InvalidConfig(format!(
                "max_retries must be 0–{MAX_RETRIES}, got {}",
                v.max_retries
            )));
        }
        if v.api_timeout_secs == 0 {
            return Err(SplitError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How the driver reacts when a page's Markdown file cannot be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteFailurePolicy {
    /// Stop the run with [`SplitError::OutputWriteFailed`]. (default)
    #[default]
    Abort,
    /// Log the failure, record a [`crate::error::PageError::WriteFailed`], continue.
    Skip,
}

/// Which markup converter a run should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConverterKind {
    /// Offline text-layer extraction with layout heuristics. (default)
    #[default]
    TextLayer,
    /// Render the page and transcribe it with a vision LLM.
    Vision,
}
