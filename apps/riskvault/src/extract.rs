//! # Text Extraction
//!
//! Turns uploaded file bytes into the text stored as version 0.
//!
//! PDF files go through `pdf-extract`; anything else must be valid UTF-8.
//! The format is taken from the `%PDF-` magic bytes first and the file
//! extension second.

use pdf_extract::extract_text_from_mem;
use riskvault_core::{FileName, VaultError};

/// Magic prefix of every PDF file.
const PDF_MAGIC: &[u8] = b"%PDF-";

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
}

impl DocumentFormat {
    /// Detect the format of an upload.
    #[must_use]
    pub fn detect(file_name: &FileName, bytes: &[u8]) -> Self {
        if bytes.starts_with(PDF_MAGIC) {
            return Self::Pdf;
        }
        let is_pdf_name = file_name
            .as_str()
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf_name { Self::Pdf } else { Self::Text }
    }

    /// The extractor for this format.
    #[must_use]
    pub fn extractor(self) -> &'static dyn TextExtractor {
        match self {
            Self::Pdf => &PdfTextExtractor,
            Self::Text => &PlainTextExtractor,
        }
    }
}

/// `bytes -> text` conversion.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String, VaultError>;
}

/// Extracts the text layer of a PDF.
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, VaultError> {
        // pdf-extract panics on some malformed inputs
        let result = std::panic::catch_unwind(|| extract_text_from_mem(bytes))
            .map_err(|_| VaultError::Extraction("Malformed PDF".to_string()))?;
        result.map_err(|e| {
            let message = e.to_string();
            if message.to_lowercase().contains("encrypt") {
                VaultError::Extraction("PDF is password protected".to_string())
            } else {
                VaultError::Extraction(format!("Invalid PDF: {}", message))
            }
        })
    }
}

/// Accepts UTF-8 text as is.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String, VaultError> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| VaultError::Extraction(format!("File is not valid UTF-8 text: {}", e)))
    }
}

/// Detect the format and extract text in one step.
pub fn extract_text(file_name: &FileName, bytes: &[u8]) -> Result<String, VaultError> {
    let format = DocumentFormat::detect(file_name, bytes);
    let text = format.extractor().extract(bytes)?;
    tracing::debug!(
        file = %file_name,
        format = ?format,
        bytes = bytes.len(),
        chars = text.len(),
        "text extracted"
    );
    Ok(text)
}

// =============================================================================
// TESTS
// =============================================================================
