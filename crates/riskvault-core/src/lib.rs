//! # riskvault-core
//!
//! Versioned document store with risk-assessment-driven versioning.
//!
//! Each uploaded file is stored as a sequence of immutable versions inside a
//! named collection. Version 0 holds the extracted text; a risk assessment is
//! attached to it once, and every later version is appended only when its
//! risk assessment differs structurally from the latest stored one.
//!
//! ## Layout
//!
//! - `types`: identifiers, the risk assessment model, documents and errors
//! - `storage`: the `DocumentStore` contract with memory and redb backends
//! - `resolver`: latest-version lookup
//! - `comparator`: structural risk assessment equality
//! - `vault`: the public operations over an injected store
//!
//! ## Constraints
//!
//! - Synchronous and network-free. The HTTP layer lives in the app crate.
//! - Existing versions are never modified, except the single risk
//!   assessment attach on version 0.

// =============================================================================
// MODULES
// =============================================================================

pub mod comparator;
pub mod formats;
pub mod primitives;
pub mod resolver;
pub mod storage;
pub mod types;
pub mod vault;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    CategoryScore, CollectionName, Document, FileName, LEAF_COUNT, OVERALL_SCORE_FIELD,
    RiskAssessment, RiskCategory, VaultError, VersionName,
};

// =============================================================================
// RE-EXPORTS: Engine
// =============================================================================

pub use comparator::RiskAssessmentComparator;
pub use resolver::{Resolution, VersionResolver};
pub use storage::{DocumentStore, Filter, MemoryStore, RedbStore, StorageBackend, Update};
pub use vault::{
    AttachOutcome, CollectionOutcome, DeleteOutcome, DocumentView, GetOutcome, SaveOutcome,
    UploadOutcome, Vault, VersionSummary,
};

// =============================================================================
// RE-EXPORTS: Formats
// =============================================================================

pub use formats::{RecordHeader, document_from_bytes, document_to_bytes};
