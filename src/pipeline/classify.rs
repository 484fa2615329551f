//! Media-type classification from the uploaded file name.
//!
//! Only two tags exist. Anything that is not a `.pdf` is sent as
//! `image/jpeg`; vision models accept a generic image tag for PNG/WEBP bytes
//! in practice. No magic-byte sniffing is done.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Media-type hint sent with the document payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "application/pdf")]
    Pdf,
    #[serde(rename = "image/jpeg")]
    Image,
}

impl MediaType {
    /// Classify by extension: `.pdf` (any case) is a PDF, everything else an image.
    pub fn from_filename(filename: &str) -> Self {
        if filename.to_ascii_lowercase().ends_with(".pdf") {
            MediaType::Pdf
        } else {
            MediaType::Image
        }
    }

    /// MIME string for the API request.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Pdf => "application/pdf",
            MediaType::Image => "image/jpeg",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_any_case() {
        for name in ["statement.pdf", "SCAN.PDF", "a.b.Pdf", ".pdf", "/tmp/x/y.pDf"] {
            assert_eq!(MediaType::from_filename(name), MediaType::Pdf, "{name}");
        }
    }

    #[test]
    fn everything_else_is_jpeg() {
        for name in ["receipt.jpg", "receipt.png", "photo.HEIC", "noext", "", "pdf", "x.pdf.png"] {
            assert_eq!(MediaType::from_filename(name), MediaType::Image, "{name}");
        }
    }

    #[test]
    fn mime_strings() {
        assert_eq!(MediaType::Pdf.as_str(), "application/pdf");
        assert_eq!(MediaType::Image.to_string(), "image/jpeg");
        assert_eq!(
            serde_json::to_string(&MediaType::Pdf).unwrap(),
            "\"application/pdf\""
        );
    }
}
