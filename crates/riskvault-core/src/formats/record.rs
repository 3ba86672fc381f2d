//! # Record Format
//!
//! Binary encoding of a single `Document` as stored by `RedbStore`.
//!
//! Format: Header (5 bytes) + postcard-serialized document.
//! - 4 bytes: Magic ("RVLT")
//! - 1 byte: Version
//!
//! The header is validated before the payload is decoded, so a corrupted or
//! foreign record surfaces as `VaultError::Serialization` instead of garbage.

use crate::primitives::{RECORD_FORMAT_VERSION, RECORD_MAGIC};
use crate::{Document, VaultError};

/// Size of the record header in bytes.
const HEADER_SIZE: usize = 5;

// =============================================================================
// RECORD HEADER
// =============================================================================

/// The header that precedes every persisted document.
#[derive(Debug, Clone, Copy)]
pub struct RecordHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl RecordHeader {
    /// Create a new header with the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *RECORD_MAGIC,
            version: RECORD_FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), VaultError> {
        if &self.magic != RECORD_MAGIC {
            return Err(VaultError::Serialization(
                "Invalid record magic bytes".to_string(),
            ));
        }
        if self.version != RECORD_FORMAT_VERSION {
            return Err(VaultError::Serialization(format!(
                "Unsupported record version: {} (expected {})",
                self.version, RECORD_FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VaultError> {
        if bytes.len() < HEADER_SIZE {
            return Err(VaultError::Serialization(
                "Record header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for RecordHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Serialize a document to bytes (header + payload).
pub fn document_to_bytes(document: &Document) -> Result<Vec<u8>, VaultError> {
    let payload =
        postcard::to_stdvec(document).map_err(|e| VaultError::Serialization(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&RecordHeader::new().to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Deserialize a document from bytes, validating the header first.
pub fn document_from_bytes(bytes: &[u8]) -> Result<Document, VaultError> {
    let header = RecordHeader::from_bytes(bytes)?;
    header.validate()?;

    postcard::from_bytes(&bytes[HEADER_SIZE..]).map_err(|e| VaultError::Serialization(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
