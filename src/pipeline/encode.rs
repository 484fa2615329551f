//! Payload encoding: raw upload bytes → base64 `ImageData`.
//!
//! Vision APIs take documents as base64 blobs embedded in the JSON request
//! body. The bytes are sent exactly as uploaded; receipts are already JPEG or
//! PDF, so re-encoding would only cost time and fidelity.

use crate::pipeline::classify::MediaType;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use tracing::debug;

/// A document ready for the extraction capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPayload {
    /// Standard-alphabet, padded base64 of the upload.
    pub data_base64: String,
    pub media_type: MediaType,
}

impl DocumentPayload {
    /// Base64-encode `bytes` under the given media type.
    pub fn encode(bytes: &[u8], media_type: MediaType) -> Self {
        let data_base64 = STANDARD.encode(bytes);
        debug!(
            "Encoded {} → {} bytes base64 ({})",
            bytes.len(),
            data_base64.len(),
            media_type
        );
        Self {
            data_base64,
            media_type,
        }
    }

    /// Wrap as an attachment for a multimodal chat message.
    ///
    /// `detail: "high"` keeps small receipt print legible for GPT-class models;
    /// other providers ignore it.
    pub fn to_image_data(&self) -> ImageData {
        ImageData::new(self.data_base64.clone(), self.media_type.as_str()).with_detail("high")
    }
}
