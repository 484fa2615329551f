//! Pipeline stages for receipt-to-transaction ingestion.
//!
//! Each submodule implements exactly one step so it can be tested without the
//! others; only [`llm`] touches the network.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ storage ──▶ classify ──▶ encode ──▶ llm ──▶ normalize
//! (bytes)   (temp file)  (mime tag)  (base64)   (VLM)   (JSON array)
//! ```
//!
//! 1. [`input`]     — the [`input::Upload`] type; load a path or URL for the CLI
//! 2. [`storage`]   — hold the upload on disk for one run, delete on every exit
//! 3. [`classify`]  — file name → `application/pdf` or `image/jpeg`
//! 4. [`encode`]    — base64-wrap the bytes for the multimodal request body
//! 5. [`llm`]       — one bounded call to the extraction backend
//! 6. [`normalize`] — strip code fences and parse the candidate array

pub mod classify;
pub mod encode;
pub mod input;
pub mod llm;
pub mod normalize;
pub mod storage;
