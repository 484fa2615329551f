//! Input resolution: turn a path or URL into an in-memory [`Upload`].
//!
//! Library callers behind an HTTP handler already hold the uploaded bytes and
//! build an [`Upload`] directly. The CLI instead accepts a local path or an
//! HTTP(S) URL, which this module loads into the same shape so both routes
//! go through one orchestrator.

use crate::error::ReceiptError;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// One uploaded document: its original file name and contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    /// Original file name as declared by the client; only its extension matters.
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Reject an upload with no content.
    pub fn ensure_present(&self) -> Result<(), ReceiptError> {
        if self.bytes.is_empty() {
            return Err(ReceiptError::UploadMissing {
                filename: self.filename.clone(),
            });
        }
        Ok(())
    }

    /// Reject an upload larger than `max_bytes`.
    pub fn ensure_within(&self, max_bytes: usize) -> Result<(), ReceiptError> {
        if self.bytes.len() > max_bytes {
            return Err(ReceiptError::InvalidInput {
                input: self.filename.clone(),
                reason: format!(
                    "upload is {} bytes, limit is {} bytes",
                    self.bytes.len(),
                    max_bytes
                ),
            });
        }
        Ok(())
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load a local file or download a URL into an [`Upload`].
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<Upload, ReceiptError> {
    if input.trim().is_empty() {
        return Err(ReceiptError::InvalidInput {
            input: input.to_string(),
            reason: "not a file path or a valid HTTP/HTTPS URL".into(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        load_local(Path::new(input)).await
    }
}

/// Read a local file, mapping I/O failures to input errors.
async fn load_local(path: &Path) -> Result<Upload, ReceiptError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ReceiptError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ReceiptError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Loaded local receipt: {} ({} bytes)", path.display(), bytes.len());
    Ok(Upload::new(filename, bytes))
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<Upload, ReceiptError> {
    info!("Downloading receipt from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ReceiptError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ReceiptError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            ReceiptError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(ReceiptError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = filename_from_url(url);
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ReceiptError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    info!("Downloaded {} bytes as '{}'", bytes.len(), filename);
    Ok(Upload::new(filename, bytes.to_vec()))
}

/// Last path segment of the URL when it looks like a file name.
///
/// Falls back to `download` (no extension), which classifies as an image.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }

    "download".to_string()
}
