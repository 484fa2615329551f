//! Ingestion orchestrator: one upload in, one candidate list (or one error) out.
//!
//! A run is linear and never retried:
//!
//! 1. store the upload in transient storage
//! 2. classify the file name into a media type
//! 3. send the stored bytes to the extraction backend
//! 4. normalise the reply into candidates
//! 5. delete the stored upload, whatever happened in 2–4
//!
//! Candidates are not tagged with a user and not persisted here. The caller
//! submits each one to the transaction store, which attaches the
//! authenticated user. Those submissions are independent, so a batch can be
//! partially persisted.

use crate::config::{IngestConfig, DEFAULT_MODEL, DEFAULT_PROVIDER};
use crate::error::ReceiptError;
use crate::output::{CandidateTransaction, IngestionOutput, IngestionStats};
use crate::pipeline::classify::MediaType;
use crate::pipeline::encode::DocumentPayload;
use crate::pipeline::input::{self, Upload};
use crate::pipeline::llm::{self, Extraction, ExtractionBackend, LlmBackend};
use crate::pipeline::normalize;
use crate::pipeline::storage::TransientUpload;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Drives uploads through the pipeline.
///
/// Holds only immutable configuration and a shared backend, so one instance
/// can serve concurrent requests behind an `Arc`.
#[derive(Clone)]
pub struct Ingestor {
    backend: Arc<dyn ExtractionBackend>,
    config: IngestConfig,
}

impl fmt::Debug for Ingestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ingestor")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Ingestor {
    /// Build an ingestor around an explicit backend.
    pub fn new(backend: Arc<dyn ExtractionBackend>, config: IngestConfig) -> Self {
        Self { backend, config }
    }

    /// Build an ingestor whose backend is the LLM provider resolved from
    /// `config` and the environment. Call once at startup.
    pub fn from_config(config: IngestConfig) -> Result<Self, ReceiptError> {
        let provider = resolve_provider(&config)?;
        let backend = LlmBackend::new(provider, &config);
        Ok(Self::new(Arc::new(backend), config))
    }

    /// Ingest one upload.
    ///
    /// # Errors
    /// - [`ReceiptError::UploadMissing`] for an empty upload, before anything is stored
    /// - [`ReceiptError::InvalidInput`] for an upload over `max_upload_bytes`
    /// - [`ReceiptError::TransientStorage`] if the upload cannot be stored or read back
    /// - [`ReceiptError::ExtractionFailed`] / [`ReceiptError::ExtractionTimeout`]
    ///   if the backend call fails
    /// - [`ReceiptError::MalformedOutput`] if the reply is not a JSON array of objects
    pub async fn ingest(&self, upload: Upload) -> Result<IngestionOutput, ReceiptError> {
        let total_start = Instant::now();
        upload.ensure_present()?;
        upload.ensure_within(self.config.max_upload_bytes)?;
        info!(
            "Ingesting '{}' ({} bytes)",
            upload.filename,
            upload.bytes.len()
        );

        // ── Step 1: Store upload ─────────────────────────────────────────────
        let Upload { filename, bytes } = upload;
        let stored = TransientUpload::store(&self.config.upload_dir(), &filename, &bytes)?;
        let upload_bytes = stored.size();
        drop(bytes);

        // ── Steps 2–4: Classify, extract, normalise ──────────────────────────
        let result = self.run_stages(&filename, &stored).await;

        // ── Step 5: Delete upload on every exit path ─────────────────────────
        if let Err(e) = stored.release() {
            warn!("Could not delete transient upload for '{}': {}", filename, e);
        }

        let (transactions, media_type, extraction) = result?;

        let stats = IngestionStats {
            upload_bytes,
            input_tokens: extraction.reply.input_tokens,
            output_tokens: extraction.reply.output_tokens,
            extraction_duration_ms: extraction.duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Recognised {} transactions in '{}' ({}ms)",
            transactions.len(),
            filename,
            stats.total_duration_ms
        );

        Ok(IngestionOutput {
            transactions,
            source: media_type.into(),
            media_type,
            stats,
        })
    }

    /// Load a local path or HTTP(S) URL and ingest it.
    pub async fn ingest_input(&self, input_str: &str) -> Result<IngestionOutput, ReceiptError> {
        let upload = input::resolve_input(input_str, self.config.download_timeout_secs).await?;
        self.ingest(upload).await
    }

    async fn run_stages(
        &self,
        filename: &str,
        stored: &TransientUpload,
    ) -> Result<(Vec<CandidateTransaction>, MediaType, Extraction), ReceiptError> {
        let media_type = MediaType::from_filename(filename);
        debug!("Classified '{}' as {}", filename, media_type);

        let bytes = stored.read().await?;
        let document = DocumentPayload::encode(&bytes, media_type);

        let extraction = llm::extract(self.backend.as_ref(), &document, &self.config).await?;
        let transactions = normalize::normalize_response(&extraction.reply.text)?;

        Ok((transactions, media_type, extraction))
    }
}

/// Ingest one upload with a provider resolved from `config`.
///
/// Convenience for one-shot use; services should build an [`Ingestor`] once
/// at startup and reuse it.
pub async fn ingest(upload: Upload, config: &IngestConfig) -> Result<IngestionOutput, ReceiptError> {
    Ingestor::from_config(config.clone())?.ingest(upload).await
}

/// Synchronous wrapper around [`ingest`].
///
/// Creates a temporary tokio runtime internally.
pub fn ingest_sync(upload: Upload, config: &IngestConfig) -> Result<IngestionOutput, ReceiptError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ReceiptError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(ingest(upload, config))
}

// ── Provider resolution ──────────────────────────────────────────────────────

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ReceiptError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ReceiptError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Named provider** (`config.provider_name`) with `config.model` or
///    [`DEFAULT_MODEL`].
/// 2. **Environment pair** (`RECEIPT_LLM_PROVIDER` + `RECEIPT_MODEL`), both
///    non-empty.
/// 3. **Gemini key present** (`GEMINI_API_KEY`) — the default provider.
/// 4. **Full auto-detection** via `ProviderFactory::from_env`.
fn resolve_provider(config: &IngestConfig) -> Result<Arc<dyn LLMProvider>, ReceiptError> {
    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("RECEIPT_LLM_PROVIDER"),
        std::env::var("RECEIPT_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_vision_provider(&prov, &env_model);
        }
    }

    if std::env::var("GEMINI_API_KEY").is_ok_and(|k| !k.is_empty()) {
        return create_vision_provider(DEFAULT_PROVIDER, model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ReceiptError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or ANTHROPIC_API_KEY.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
