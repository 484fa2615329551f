//! # receipt-ingest
//!
//! Turn a receipt photo or PDF statement into candidate finance transactions
//! using a Vision Language Model.
//!
//! The crate is the ingestion core of a personal finance tracker: an upload
//! handler passes it the uploaded file, it asks a VLM to list the line items
//! as JSON, and it returns those items unvalidated. The caller then submits
//! each candidate to its transaction store.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Upload (file name + bytes)
//!  │
//!  ├─ 1. Store     write to a transient file (deleted on every exit path)
//!  ├─ 2. Classify  .pdf → application/pdf, anything else → image/jpeg
//!  ├─ 3. Encode    bytes → base64
//!  ├─ 4. Extract   one bounded VLM call with the extraction prompt
//!  ├─ 5. Normalise strip ```json fences, parse a JSON array of objects
//!  └─ 6. Output    ordered candidates + token/timing stats
//! ```
//!
//! Any failure in steps 2–5 fails the whole upload; there is no partial list.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use receipt_ingest::{IngestConfig, Ingestor, Upload};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider resolved from GEMINI_API_KEY / OPENAI_API_KEY / ANTHROPIC_API_KEY
//!     let ingestor = Ingestor::from_config(IngestConfig::default())?;
//!     let bytes = std::fs::read("lunch.jpg")?;
//!     let output = ingestor.ingest(Upload::new("lunch.jpg", bytes)).await?;
//!     for tx in &output.transactions {
//!         println!("{} {} {}", tx.kind, tx.amount, tx.description);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `receipt2tx` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{IngestConfig, IngestConfigBuilder};
pub use error::{ErrorKind, ReceiptError};
pub use ingest::{ingest, ingest_sync, Ingestor};
pub use output::{
    CandidateTransaction, Category, IngestionOutput, IngestionStats, TransactionKind,
    TransactionSource,
};
pub use pipeline::classify::MediaType;
pub use pipeline::encode::DocumentPayload;
pub use pipeline::input::Upload;
pub use pipeline::llm::{BackendReply, ExtractionBackend, LlmBackend};
pub use pipeline::normalize::normalize_response;
