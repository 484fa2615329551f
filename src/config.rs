//! Configuration for receipt ingestion.
//!
//! [`IngestConfig`] is built once at startup and handed to
//! [`crate::ingest::Ingestor`]; nothing in the pipeline reads the environment
//! ad hoc. The one exception is provider resolution, which follows
//! `edgequake_llm`'s convention of reading API keys from the environment when
//! the provider is first created.

use crate::error::ReceiptError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default vision model; cheap and reads receipts and PDFs inline.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default provider name passed to `edgequake_llm::ProviderFactory`.
pub const DEFAULT_PROVIDER: &str = "gemini";

/// Configuration for an ingestion run.
///
/// Built via [`IngestConfig::builder()`] or using [`IngestConfig::default()`].
///
/// # Example
/// ```rust
/// use receipt_ingest::IngestConfig;
///
/// let config = IngestConfig::builder()
///     .model("gemini-1.5-flash")
///     .api_timeout_secs(30)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// LLM model identifier. If None, uses [`DEFAULT_MODEL`] unless the
    /// `RECEIPT_LLM_PROVIDER`/`RECEIPT_MODEL` pair is set.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "anthropic").
    /// If None, resolved from the environment.
    pub provider_name: Option<String>,

    /// Custom extraction prompt. If None, uses the built-in default.
    pub extraction_prompt: Option<String>,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Transcription wants the model to copy what is printed, not improvise.
    pub temperature: f32,

    /// Maximum output tokens for the reply. Default: 2048.
    ///
    /// A long supermarket receipt runs to ~60 line items at ~25 tokens each;
    /// a truncated reply is unparseable and fails the whole upload.
    pub max_tokens: usize,

    /// Upper bound on the extraction call, in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs, in seconds. Default: 60.
    pub download_timeout_secs: u64,

    /// Directory for transient uploads. If None, the system temp directory.
    pub upload_dir: Option<PathBuf>,

    /// Largest accepted upload in bytes. Default: 20 MiB, the inline-data
    /// ceiling of the common vision APIs.
    pub max_upload_bytes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            extraction_prompt: None,
            temperature: 0.1,
            max_tokens: 2048,
            api_timeout_secs: 60,
            download_timeout_secs: 60,
            upload_dir: None,
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

impl IngestConfig {
    /// Create a new builder for `IngestConfig`.
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder {
            config: Self::default(),
        }
    }

    /// The directory transient uploads are written to.
    pub fn upload_dir(&self) -> PathBuf {
        self.upload_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Builder for [`IngestConfig`].
#[derive(Debug)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl IngestConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn extraction_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.extraction_prompt = Some(prompt.into());
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

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.upload_dir = Some(dir.into());
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<IngestConfig, ReceiptError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 {
            return Err(ReceiptError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(ReceiptError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if c.max_upload_bytes == 0 {
            return Err(ReceiptError::InvalidConfig(
                "max_upload_bytes must be ≥ 1".into(),
            ));
        }
        if let Some(prompt) = &c.extraction_prompt {
            if prompt.trim().is_empty() {
                return Err(ReceiptError::InvalidConfig(
                    "extraction prompt must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
