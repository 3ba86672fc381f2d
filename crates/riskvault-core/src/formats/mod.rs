//! # Formats Module
//!
//! Binary record encoding used by persistent storage backends.

pub mod record;

pub use record::{RecordHeader, document_from_bytes, document_to_bytes};
