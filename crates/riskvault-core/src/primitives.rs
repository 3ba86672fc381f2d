//! # Primitives
//!
//! Hardcoded runtime constants for the Riskvault core.
//!
//! These limits are compiled into the binary and are immutable at runtime.
//! Every caller-supplied name or payload is checked against them before any
//! store call is made.

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length for file names.
pub const MAX_FILE_NAME_LENGTH: usize = 1024;

/// Maximum length for collection names.
///
/// Matches the namespace limit of common document stores.
pub const MAX_COLLECTION_NAME_LENGTH: usize = 120;

/// Maximum length for extracted document content (16 MiB).
pub const MAX_CONTENT_LENGTH: usize = 16 * 1024 * 1024;

/// Collections in this namespace belong to the store itself.
pub const RESERVED_COLLECTION_PREFIX: &str = "system.";

// =============================================================================
// STORAGE
// =============================================================================

/// Magic bytes prefixed to every persisted document record.
pub const RECORD_MAGIC: &[u8; 4] = b"RVLT";

/// Current record format version.
///
/// Increment this when making breaking changes to the record layout.
pub const RECORD_FORMAT_VERSION: u8 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_magic_correct() {
        assert_eq!(RECORD_MAGIC, b"RVLT");
    }

    #[test]
    fn content_limit_is_sixteen_mib() {
        assert_eq!(MAX_CONTENT_LENGTH, 16_777_216);
    }
}
