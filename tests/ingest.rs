//! Orchestrator integration tests.
//!
//! Every test drives [`Ingestor`] with an in-process backend and a private
//! upload directory, so transient-file cleanup can be observed directly by
//! listing the directory after the run.
//!
//! The live-model test at the bottom is gated behind `E2E_ENABLED` and a
//! receipt image under `./test_cases/`.
//!
//! Run with:
//!   cargo test --test ingest -- --nocapture

use async_trait::async_trait;
use receipt_ingest::{
    BackendReply, DocumentPayload, ErrorKind, ExtractionBackend, IngestConfig, Ingestor,
    MediaType, ReceiptError, TransactionSource, Upload,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Backend returning a fixed reply (or error) and recording what it was sent.
struct Scripted {
    reply: Result<String, String>,
    calls: AtomicUsize,
    media_types: Mutex<Vec<MediaType>>,
    /// Files present in the upload dir while the call was in flight.
    files_during_call: Mutex<Vec<usize>>,
    upload_dir: PathBuf,
}

impl Scripted {
    fn ok(dir: &TempDir, text: &str) -> Arc<Self> {
        Self::new(dir, Ok(text.to_string()))
    }

    fn failing(dir: &TempDir, message: &str) -> Arc<Self> {
        Self::new(dir, Err(message.to_string()))
    }

    fn new(dir: &TempDir, reply: Result<String, String>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            media_types: Mutex::new(Vec::new()),
            files_during_call: Mutex::new(Vec::new()),
            upload_dir: dir.path().to_path_buf(),
        })
    }
}

#[async_trait]
impl ExtractionBackend for Scripted {
    async fn generate(
        &self,
        _prompt: &str,
        document: &DocumentPayload,
    ) -> Result<BackendReply, ReceiptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.media_types.lock().unwrap().push(document.media_type);
        self.files_during_call
            .lock()
            .unwrap()
            .push(file_count(&self.upload_dir));

        match &self.reply {
            Ok(text) => Ok(BackendReply::text(text.clone())),
            Err(message) => Err(ReceiptError::ExtractionFailed {
                message: message.clone(),
            }),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Backend that panics mid-call.
struct Exploding;

#[async_trait]
impl ExtractionBackend for Exploding {
    async fn generate(
        &self,
        _prompt: &str,
        _document: &DocumentPayload,
    ) -> Result<BackendReply, ReceiptError> {
        panic!("backend blew up");
    }
}

/// Backend that removes every stored upload before answering, so the
/// orchestrator's own delete fails afterwards.
struct Sweeping {
    upload_dir: PathBuf,
}

#[async_trait]
impl ExtractionBackend for Sweeping {
    async fn generate(
        &self,
        _prompt: &str,
        _document: &DocumentPayload,
    ) -> Result<BackendReply, ReceiptError> {
        for entry in std::fs::read_dir(&self.upload_dir).unwrap() {
            std::fs::remove_file(entry.unwrap().path()).unwrap();
        }
        Ok(BackendReply::text(TWO_ITEMS))
    }
}

fn file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

fn ingestor(backend: Arc<dyn ExtractionBackend>, dir: &TempDir) -> Ingestor {
    let config = IngestConfig::builder()
        .upload_dir(dir.path())
        .api_timeout_secs(5)
        .build()
        .expect("valid config");
    Ingestor::new(backend, config)
}

fn jpeg() -> Upload {
    Upload::new("lunch.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10])
}

const TWO_ITEMS: &str = "```json\n[\n  {\"type\":\"expense\",\"amount\":4.2,\"category\":\"food\",\"description\":\"coffee\"},\n  {\"type\":\"expense\",\"amount\":55,\"category\":\"fuel\",\"description\":\"diesel\"}\n]\n```";

// ── Success paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn lunch_receipt_round_trip() {
    let dir = TempDir::new().unwrap();
    let backend = Scripted::ok(
        &dir,
        "```json\n[{\"type\":\"expense\",\"amount\":12.5,\"category\":\"food\",\"description\":\"lunch\"}]\n```",
    );

    let out = ingestor(backend.clone(), &dir).ingest(jpeg()).await.unwrap();

    assert_eq!(out.transactions.len(), 1);
    assert_eq!(
        serde_json::to_value(&out.transactions[0]).unwrap(),
        json!({"type": "expense", "amount": 12.5, "category": "food", "description": "lunch"})
    );
    assert_eq!(out.media_type, MediaType::Image);
    assert_eq!(out.source, TransactionSource::Receipt);
    assert_eq!(file_count(dir.path()), 0, "upload must be deleted");
}

#[tokio::test]
async fn two_items_keep_reply_order() {
    let dir = TempDir::new().unwrap();
    let out = ingestor(Scripted::ok(&dir, TWO_ITEMS), &dir)
        .ingest(jpeg())
        .await
        .unwrap();

    let descriptions: Vec<_> = out
        .transactions
        .iter()
        .map(|t| t.description_str().unwrap())
        .collect();
    assert_eq!(descriptions, ["coffee", "diesel"]);
    assert_eq!(out.transactions[1].amount, json!(55));
}

#[tokio::test]
async fn upload_exists_only_while_extracting() {
    let dir = TempDir::new().unwrap();
    let backend = Scripted::ok(&dir, "[]");

    ingestor(backend.clone(), &dir).ingest(jpeg()).await.unwrap();

    assert_eq!(*backend.files_during_call.lock().unwrap(), vec![1]);
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn pdf_is_sent_as_pdf() {
    let dir = TempDir::new().unwrap();
    let backend = Scripted::ok(&dir, "[]");

    let out = ingestor(backend.clone(), &dir)
        .ingest(Upload::new("March-Statement.PDF", b"%PDF-1.7".to_vec()))
        .await
        .unwrap();

    assert_eq!(*backend.media_types.lock().unwrap(), vec![MediaType::Pdf]);
    assert_eq!(out.source, TransactionSource::Pdf);
}

#[tokio::test]
async fn png_is_still_sent_as_jpeg() {
    let dir = TempDir::new().unwrap();
    let backend = Scripted::ok(&dir, "[]");

    ingestor(backend.clone(), &dir)
        .ingest(Upload::new("screenshot.png", b"\x89PNG".to_vec()))
        .await
        .unwrap();

    assert_eq!(*backend.media_types.lock().unwrap(), vec![MediaType::Image]);
}

#[tokio::test]
async fn same_file_twice_is_two_independent_runs() {
    let dir = TempDir::new().unwrap();
    let backend = Scripted::ok(&dir, TWO_ITEMS);
    let ingestor = ingestor(backend.clone(), &dir);

    let first = ingestor.ingest(jpeg()).await.unwrap();
    let second = ingestor.ingest(jpeg()).await.unwrap();

    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    assert_eq!(first.transactions.len(), 2);
    assert_eq!(second.transactions.len(), 2);
    assert_eq!(first.transactions, second.transactions);
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn concurrent_runs_do_not_interfere() {
    let dir = TempDir::new().unwrap();
    let good = ingestor(Scripted::ok(&dir, TWO_ITEMS), &dir);
    let bad = ingestor(Scripted::ok(&dir, "not json"), &dir);

    let (a, b) = tokio::join!(good.ingest(jpeg()), bad.ingest(jpeg()));

    assert_eq!(a.unwrap().transactions.len(), 2);
    assert_eq!(b.unwrap_err().kind(), ErrorKind::MalformedExtractionOutput);
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn failed_delete_keeps_successful_result() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(Sweeping {
        upload_dir: dir.path().to_path_buf(),
    });

    let out = ingestor(backend, &dir).ingest(jpeg()).await.unwrap();

    assert_eq!(out.transactions.len(), 2);
    assert_eq!(out.transactions[0].description_str(), Some("coffee"));
    assert_eq!(file_count(dir.path()), 0);
}

// ── Failure paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn malformed_reply_fails_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let err = ingestor(Scripted::ok(&dir, "sorry, I cannot read this"), &dir)
        .ingest(jpeg())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedExtractionOutput);
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn service_failure_fails_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let backend = Scripted::failing(&dir, "connection reset by peer");

    let err = ingestor(backend.clone(), &dir)
        .ingest(jpeg())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ExtractionServiceFailure);
    assert!(err.to_string().contains("connection reset"));
    assert_eq!(backend.calls.load(Ordering::SeqCst), 1, "no retry");
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn empty_reply_is_service_failure() {
    let dir = TempDir::new().unwrap();
    let err = ingestor(Scripted::ok(&dir, ""), &dir)
        .ingest(jpeg())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ExtractionServiceFailure);
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn empty_upload_is_rejected_before_the_pipeline() {
    let dir = TempDir::new().unwrap();
    let backend = Scripted::ok(&dir, "[]");

    let err = ingestor(backend.clone(), &dir)
        .ingest(Upload::new("receipt.jpg", Vec::<u8>::new()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::UploadMissing);
    assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn panicking_backend_still_cleans_up() {
    let dir = TempDir::new().unwrap();
    let ingestor = ingestor(Arc::new(Exploding), &dir);

    let joined = tokio::spawn(async move { ingestor.ingest(jpeg()).await }).await;

    assert!(joined.is_err(), "task should have panicked");
    assert_eq!(file_count(dir.path()), 0);
}

#[tokio::test]
async fn ingest_input_reads_local_files() {
    let dir = TempDir::new().unwrap();
    let uploads = TempDir::new().unwrap();
    let path = dir.path().join("fuel.pdf");
    std::fs::write(&path, b"%PDF-1.4 fuel").unwrap();

    let backend = Scripted::ok(&uploads, TWO_ITEMS);
    let out = ingestor(backend.clone(), &uploads)
        .ingest_input(path.to_str().unwrap())
        .await
        .unwrap();

    assert_eq!(out.media_type, MediaType::Pdf);
    assert_eq!(out.stats.upload_bytes, 13);
    assert_eq!(file_count(uploads.path()), 0);
}

#[tokio::test]
async fn ingest_input_missing_file() {
    let dir = TempDir::new().unwrap();
    let err = ingestor(Scripted::ok(&dir, "[]"), &dir)
        .ingest_input(dir.path().join("nope.jpg").to_str().unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputFailure);
}

// ── Live model (opt-in) ──────────────────────────────────────────────────────

#[tokio::test]
async fn live_receipt_extraction() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases/receipt.jpg");
    if !path.exists() {
        println!("SKIP — test file not found: {}", path.display());
        return;
    }

    let ingestor = Ingestor::from_config(IngestConfig::default()).expect("provider configured");
    let out = ingestor
        .ingest_input(path.to_str().unwrap())
        .await
        .expect("live ingestion should succeed");

    assert!(!out.transactions.is_empty(), "expected at least one line item");
    println!("{}", serde_json::to_string_pretty(&out).unwrap());
}
