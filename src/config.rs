//! Configuration for an analysis run.
//!
//! All pipeline behaviour is controlled through [`AnalyzeConfig`], built via
//! its [`AnalyzeConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share a config across runs and to log the exact settings a
//! run executed with.

use crate::error::AnalyzeError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for the résumé analysis pipeline.
///
/// Built via [`AnalyzeConfig::builder()`] or [`AnalyzeConfig::default()`].
///
/// # Example
/// ```rust
/// use resumind::AnalyzeConfig;
///
/// let config = AnalyzeConfig::builder()
///     .preview_scale(3.0)
///     .stage_timeout_secs(60)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalyzeConfig {
    /// Scale factor applied to the first page's native size when rendering
    /// the preview. Range: 1.0–8.0. Default: 2.0.
    ///
    /// At 1.0 small fonts blur into illegibility in the preview; 2.0 keeps
    /// body text legible while the PNG stays comfortably under upload
    /// limits.
    pub preview_scale: f32,

    /// Maximum preview dimension (width or height) in pixels. Default: 2000.
    ///
    /// A safety cap independent of scale: an A3 page at 4× would otherwise
    /// produce a ~13 000 px image and exhaust memory. Either dimension is
    /// capped, the other scales proportionally.
    pub max_preview_pixels: u32,

    /// Per-stage deadline for collaborator calls. `None` disables.
    /// Default: 120 s.
    ///
    /// Without a deadline a stuck storage or AI call stalls the run
    /// indefinitely with the last status still showing; with one, the run
    /// terminates in a timeout error naming the stage.
    pub stage_timeout_secs: Option<u64>,

    /// Maximum retry attempts on a transient AI-service failure. Default: 3.
    ///
    /// Applies inside [`crate::services::LlmFeedbackService`] only; the
    /// orchestrator itself never retries a stage.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (doubles per attempt). Default: 500.
    pub retry_backoff_ms: u64,

    /// Sampling temperature for the AI completion. Default: 0.1.
    ///
    /// Low temperature keeps the rating rubric stable across runs; higher
    /// values make scores drift for identical input.
    pub temperature: f32,

    /// Maximum tokens the AI may generate. Default: 4096.
    ///
    /// The structured feedback for a dense résumé runs 1–2 k tokens;
    /// anything lower risks truncating the JSON mid-object, which surfaces
    /// as a format error.
    pub max_tokens: usize,

    /// AI model identifier, e.g. "gpt-4.1-mini". If `None`, provider default.
    pub model: Option<String>,

    /// AI provider name (e.g. "openai", "anthropic"). If `None` along with
    /// `provider`, auto-detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed AI provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Full instruction-prompt override. If `None`, the instruction is
    /// composed from the job title and description via [`crate::prompts`].
    pub instructions: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Observer for stage transitions. If `None`, no events are emitted.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            preview_scale: 2.0,
            max_preview_pixels: 2000,
            stage_timeout_secs: Some(120),
            max_retries: 3,
            retry_backoff_ms: 500,
            temperature: 0.1,
            max_tokens: 4096,
            model: None,
            provider_name: None,
            provider: None,
            instructions: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalyzeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyzeConfig")
            .field("preview_scale", &self.preview_scale)
            .field("max_preview_pixels", &self.max_preview_pixels)
            .field("stage_timeout_secs", &self.stage_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl AnalyzeConfig {
    /// Create a new builder for `AnalyzeConfig`.
    pub fn builder() -> AnalyzeConfigBuilder {
        AnalyzeConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`AnalyzeConfig`].
#[derive(Debug)]
pub struct AnalyzeConfigBuilder {
    config: AnalyzeConfig,
}

impl AnalyzeConfigBuilder {
    pub fn preview_scale(mut self, scale: f32) -> Self {
        self.config.preview_scale = scale.clamp(1.0, 8.0);
        self
    }

    pub fn max_preview_pixels(mut self, px: u32) -> Self {
        self.config.max_preview_pixels = px.max(100);
        self
    }

    pub fn stage_timeout_secs(mut self, secs: u64) -> Self {
        self.config.stage_timeout_secs = Some(secs);
        self
    }

    /// Disable the per-stage deadline entirely.
    pub fn no_stage_timeout(mut self) -> Self {
        self.config.stage_timeout_secs = None;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
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

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.config.instructions = Some(instructions.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalyzeConfig, AnalyzeError> {
        let c = &self.config;
        if !(1.0..=8.0).contains(&c.preview_scale) {
            return Err(AnalyzeError::InvalidConfig(format!(
                "preview scale must be 1.0–8.0, got {}",
                c.preview_scale
            )));
        }
        if c.stage_timeout_secs == Some(0) {
            return Err(AnalyzeError::InvalidConfig(
                "stage timeout must be ≥ 1s (or disabled)".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(AnalyzeError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
