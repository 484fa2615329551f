//! Transient upload storage.
//!
//! Each ingestion writes its upload to a uniquely named file under the
//! configured upload directory and removes it when the run ends. Removal is
//! tied to [`TransientUpload`]: the orchestrator calls
//! [`TransientUpload::release`] on every exit path, and `Drop` removes the
//! file if the future is cancelled or a stage panics first.

use crate::error::ReceiptError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// An upload held on disk for the duration of one ingestion run.
#[derive(Debug)]
pub struct TransientUpload {
    file: Option<NamedTempFile>,
    path: PathBuf,
    len: usize,
}

impl TransientUpload {
    /// Write `bytes` to a fresh file in `dir`.
    ///
    /// The original file extension, when it is short and alphanumeric, is
    /// kept on the stored name to ease debugging of leftover files.
    pub fn store(dir: &Path, filename: &str, bytes: &[u8]) -> Result<Self, ReceiptError> {
        let suffix = safe_suffix(filename);
        let mut file = tempfile::Builder::new()
            .prefix("receipt-")
            .suffix(&suffix)
            .tempfile_in(dir)
            .map_err(|source| ReceiptError::TransientStorage {
                path: dir.to_path_buf(),
                source,
            })?;

        let path = file.path().to_path_buf();
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|source| ReceiptError::TransientStorage {
                path: path.clone(),
                source,
            })?;

        debug!("Stored upload at {} ({} bytes)", path.display(), bytes.len());
        Ok(Self {
            file: Some(file),
            path,
            len: bytes.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the stored upload in bytes.
    pub fn size(&self) -> usize {
        self.len
    }

    /// Read the stored bytes back.
    pub async fn read(&self) -> Result<Vec<u8>, ReceiptError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|source| ReceiptError::TransientStorage {
                path: self.path.clone(),
                source,
            })
    }

    /// Delete the stored file now, reporting any failure.
    pub fn release(mut self) -> Result<(), ReceiptError> {
        match self.file.take() {
            Some(file) => {
                file.close()
                    .map_err(|source| ReceiptError::TransientStorage {
                        path: self.path.clone(),
                        source,
                    })?;
                debug!("Deleted upload {}", self.path.display());
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for TransientUpload {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.close() {
                warn!("Failed to delete upload {}: {}", self.path.display(), e);
            }
        }
    }
}

/// `.ext` from the original file name, or empty when it is unusual.
fn safe_suffix(filename: &str) -> String {
    match Path::new(filename).extension().and_then(|e| e.to_str()) {
        Some(ext)
            if !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => String::new(),
    }
}
