//! Extraction client: send the prompt plus document to the model, get text back.
//!
//! The model sits behind [`ExtractionBackend`] so the orchestrator never
//! touches a provider directly. Production uses [`LlmBackend`] over an
//! `edgequake_llm` provider; tests inject fakes.
//!
//! One attempt per upload. A failed or slow call surfaces immediately as an
//! extraction error and the user re-uploads; there is no backoff loop here.

use crate::config::IngestConfig;
use crate::error::ReceiptError;
use crate::pipeline::encode::DocumentPayload;
use crate::prompts::extraction_prompt;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Raw reply from the extraction capability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendReply {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl BackendReply {
    /// A reply with no token accounting.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// The external document-understanding capability.
#[async_trait]
pub trait ExtractionBackend: Send + Sync {
    /// Answer `prompt` about `document`.
    async fn generate(
        &self,
        prompt: &str,
        document: &DocumentPayload,
    ) -> Result<BackendReply, ReceiptError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "backend"
    }
}

/// [`ExtractionBackend`] over an `edgequake_llm` vision provider.
#[derive(Clone)]
pub struct LlmBackend {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmBackend {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &IngestConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }
}

impl fmt::Debug for LlmBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmBackend")
            .field("provider", &"<dyn LLMProvider>")
            .field("temperature", &self.options.temperature)
            .field("max_tokens", &self.options.max_tokens)
            .finish()
    }
}

#[async_trait]
impl ExtractionBackend for LlmBackend {
    async fn generate(
        &self,
        prompt: &str,
        document: &DocumentPayload,
    ) -> Result<BackendReply, ReceiptError> {
        // Prompt and document travel in one user turn, prompt first.
        let messages = vec![ChatMessage::user_with_images(
            prompt,
            vec![document.to_image_data()],
        )];

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| ReceiptError::ExtractionFailed {
                message: e.to_string(),
            })?;

        Ok(BackendReply {
            text: response.content,
            input_tokens: response.prompt_tokens as usize,
            output_tokens: response.completion_tokens as usize,
        })
    }

    fn name(&self) -> &str {
        "llm"
    }
}

/// Build `CompletionOptions` from the ingestion config.
fn build_options(config: &IngestConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// A successful extraction call.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub reply: BackendReply,
    pub duration_ms: u64,
}

/// Run one bounded extraction call for an encoded document.
///
/// Resolves the prompt and waits at most
/// `config.api_timeout_secs`. A whitespace-only reply counts as a failure.
pub async fn extract(
    backend: &dyn ExtractionBackend,
    document: &DocumentPayload,
    config: &IngestConfig,
) -> Result<Extraction, ReceiptError> {
    let start = Instant::now();
    let prompt = extraction_prompt(config.extraction_prompt.as_deref());
    let limit = Duration::from_secs(config.api_timeout_secs);

    let reply = match timeout(limit, backend.generate(prompt, document)).await {
        Ok(Ok(reply)) => reply,
        Ok(Err(e)) => {
            warn!("Extraction via {} failed — {}", backend.name(), e);
            return Err(e);
        }
        Err(_) => {
            warn!(
                "Extraction via {} timed out after {}s",
                backend.name(),
                config.api_timeout_secs
            );
            return Err(ReceiptError::ExtractionTimeout {
                secs: config.api_timeout_secs,
            });
        }
    };

    if reply.text.trim().is_empty() {
        return Err(ReceiptError::ExtractionFailed {
            message: format!("{} returned an empty response", backend.name()),
        });
    }

    let duration_ms = start.elapsed().as_millis() as u64;
    debug!(
        "Extraction: {} input tokens, {} output tokens, {}ms",
        reply.input_tokens, reply.output_tokens, duration_ms
    );

    Ok(Extraction { reply, duration_ms })
}
