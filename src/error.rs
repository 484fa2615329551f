//! Error types for the receipt-ingest library.
//!
//! Every ingestion either returns the full candidate list or exactly one
//! [`ReceiptError`]. There is no page- or row-level partial result: a receipt
//! the model half-understood is rejected as a whole, and the caller asks the
//! user to upload it again.
//!
//! Variants are fine-grained so log lines and CLI messages stay actionable,
//! while [`ReceiptError::kind`] collapses them into the coarse
//! [`ErrorKind`] buckets an HTTP handler maps to a response.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the receipt-ingest library.
#[derive(Debug, Error)]
pub enum ReceiptError {
    // ── Upload errors ─────────────────────────────────────────────────────
    /// No file, or a zero-byte file, was supplied.
    #[error("No receipt was uploaded (file '{filename}' is empty)")]
    UploadMissing { filename: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Receipt file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input is unusable (bad path/URL, or larger than the upload cap).
    #[error("Invalid input '{input}': {reason}")]
    InvalidInput { input: String, reason: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The extraction service rejected the call, was unreachable, or replied
    /// with nothing.
    #[error("Receipt extraction failed: {message}")]
    ExtractionFailed { message: String },

    /// The extraction call did not finish within the configured bound.
    #[error("Receipt extraction timed out after {secs}s\nIncrease --api-timeout.")]
    ExtractionTimeout { secs: u64 },

    /// The model reply could not be turned into a JSON array of objects.
    #[error("Malformed extraction output: {reason}\nReply began with: {excerpt:?}")]
    MalformedOutput { reason: String, excerpt: String },

    // ── Storage errors ────────────────────────────────────────────────────
    /// The upload could not be written to, or read back from, transient storage.
    #[error("Transient storage failed for '{path}': {source}")]
    TransientStorage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse failure classes seen by whoever sits in front of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Nothing to ingest; rejected before the pipeline starts.
    UploadMissing,
    /// The extraction capability was unreachable, rejected, or timed out.
    ExtractionServiceFailure,
    /// The reply was not a JSON array of objects.
    MalformedExtractionOutput,
    /// The upload could not be written or read back.
    TransientStorageFailure,
    /// The CLI/library input could not be resolved to bytes.
    InputFailure,
    /// Misconfiguration or an internal bug.
    Configuration,
}

impl ReceiptError {
    /// Collapse this error into its [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReceiptError::UploadMissing { .. } => ErrorKind::UploadMissing,
            ReceiptError::ProviderNotConfigured { .. }
            | ReceiptError::ExtractionFailed { .. }
            | ReceiptError::ExtractionTimeout { .. } => ErrorKind::ExtractionServiceFailure,
            ReceiptError::MalformedOutput { .. } => ErrorKind::MalformedExtractionOutput,
            ReceiptError::TransientStorage { .. } => ErrorKind::TransientStorageFailure,
            ReceiptError::FileNotFound { .. }
            | ReceiptError::PermissionDenied { .. }
            | ReceiptError::InvalidInput { .. }
            | ReceiptError::DownloadFailed { .. }
            | ReceiptError::DownloadTimeout { .. } => ErrorKind::InputFailure,
            ReceiptError::InvalidConfig(_) | ReceiptError::Internal(_) => {
                ErrorKind::Configuration
            }
        }
    }
}
