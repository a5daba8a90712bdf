//! AI feedback backend: submit a document reference plus an instruction
//! prompt, get back free-form or structured text.
//!
//! The wire shape is deliberately loose — the backend may answer with plain
//! string content or with a sequence of parts whose first element carries
//! the text. [`MessageContent`] models that as an explicit tagged union
//! with one extraction function, so no caller ever does runtime shape
//! inspection.

use crate::config::AnalyzeConfig;
use crate::error::AnalyzeError;
use crate::pipeline::{encode, render};
use crate::services::storage::StorageGateway;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// One element of a multi-part content sequence.
///
/// Only `text` matters to the pipeline; any other fields (type tags,
/// annotations) are carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

/// Response content: a plain string, or a sequence of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Extract the textual payload, if any.
    ///
    /// For the sequence form only the first element is consulted — later
    /// parts are annotations, not alternative payloads. Empty text counts
    /// as absent.
    pub fn extract_text(&self) -> Option<&str> {
        let text = match self {
            MessageContent::Text(s) => s.as_str(),
            MessageContent::Parts(parts) => parts.first()?.text.as_deref()?,
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// The message carried by a feedback response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackMessage {
    pub content: MessageContent,
}

/// A raw response from the feedback backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub message: FeedbackMessage,
}

impl FeedbackResponse {
    /// Convenience constructor for plain-text responses.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            message: FeedbackMessage {
                content: MessageContent::Text(content.into()),
            },
        }
    }
}

/// The AI feedback collaborator.
///
/// `Ok(None)` means the backend answered with nothing at all; the
/// orchestrator reports that as a feedback-service failure.
#[async_trait]
pub trait FeedbackService: Send + Sync {
    async fn feedback(
        &self,
        document_path: &str,
        prompt: &str,
    ) -> Result<Option<FeedbackResponse>, AnalyzeError>;
}

/// Production feedback service backed by an `edgequake-llm` provider.
///
/// The backend takes a *storage reference*, so this wrapper reads the
/// document back from the gateway, rasterises its first page, and submits
/// the image with the instruction prompt as a vision chat call. Transient
/// API failures are retried with exponential backoff; the orchestrator
/// above never retries, so this is the only retry loop in the pipeline.
pub struct LlmFeedbackService {
    provider: Arc<dyn LLMProvider>,
    storage: Arc<dyn StorageGateway>,
    config: AnalyzeConfig,
}

impl LlmFeedbackService {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        storage: Arc<dyn StorageGateway>,
        config: AnalyzeConfig,
    ) -> Self {
        Self {
            provider,
            storage,
            config,
        }
    }

    /// Construct with a provider resolved from the config.
    ///
    /// Resolution order, most-specific first:
    /// 1. a pre-built `config.provider`
    /// 2. `config.provider_name` (+ optional model) via [`ProviderFactory`]
    /// 3. full auto-detection from environment API keys
    pub fn from_config(
        storage: Arc<dyn StorageGateway>,
        config: AnalyzeConfig,
    ) -> Result<Self, AnalyzeError> {
        let provider = resolve_provider(&config)?;
        Ok(Self::new(provider, storage, config))
    }
}

fn resolve_provider(config: &AnalyzeConfig) -> Result<Arc<dyn LLMProvider>, AnalyzeError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or("gpt-4.1-mini");
        return ProviderFactory::create_llm_provider(name, model).map_err(|e| {
            AnalyzeError::ProviderNotConfigured {
                provider: name.clone(),
                hint: format!("{e}"),
            }
        });
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| AnalyzeError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No AI provider could be auto-detected from environment.\n\
                 Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                 Error: {e}"
            ),
        })?;
    Ok(provider)
}

#[async_trait]
impl FeedbackService for LlmFeedbackService {
    async fn feedback(
        &self,
        document_path: &str,
        prompt: &str,
    ) -> Result<Option<FeedbackResponse>, AnalyzeError> {
        let bytes = self
            .storage
            .read(document_path)
            .await?
            .ok_or_else(|| AnalyzeError::FeedbackService {
                detail: format!("document '{document_path}' is not readable"),
            })?;

        let preview = render::render_first_page(&bytes, &self.config).await?;
        let image = encode::to_image_data(&preview).map_err(|e| AnalyzeError::FeedbackService {
            detail: format!("preview encoding failed: {e}"),
        })?;

        let messages = vec![
            ChatMessage::system(prompt),
            ChatMessage::user_with_images("", vec![image]),
        ];
        let options = CompletionOptions {
            temperature: Some(self.config.temperature),
            max_tokens: Some(self.config.max_tokens),
            ..Default::default()
        };

        let mut last_err: Option<String> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = self.config.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "Feedback call: retry {}/{} after {}ms",
                    attempt, self.config.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.provider.chat(&messages, Some(&options)).await {
                Ok(response) => {
                    debug!(
                        "Feedback call: {} input tokens, {} output tokens",
                        response.prompt_tokens, response.completion_tokens
                    );
                    return Ok(Some(FeedbackResponse::text(response.content)));
                }
                Err(e) => {
                    let detail = format!("{e}");
                    warn!("Feedback call: attempt {} failed — {}", attempt + 1, detail);
                    last_err = Some(detail);
                }
            }
        }

        Err(AnalyzeError::FeedbackService {
            detail: last_err.unwrap_or_else(|| "unknown provider error".to_string()),
        })
    }
}
