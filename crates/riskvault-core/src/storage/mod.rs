//! # Document Store Adapter
//!
//! Abstracts "find documents matching a filter", "insert one", "update one",
//! "delete" and collection lifecycle against a named collection.
//!
//! There is no business logic here. Atomicity is per call: a conditional
//! `update_one` or an `insert_unique` is a single atomic step, anything
//! composed of several calls is not. No retries, no multi-call transactions.
//!
//! ## Backends
//!
//! - `MemoryStore`: in-process, volatile
//! - `RedbStore`: redb embedded database, ACID and persistent
//!
//! `StorageBackend` selects one of them at runtime and is itself a
//! `DocumentStore`.

pub mod memory;
pub mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::{CollectionName, Document, FileName, RiskAssessment, VaultError, VersionName};
use std::path::Path;

// =============================================================================
// FILTERS
// =============================================================================

/// Whether a field must exist or must be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Present,
    Absent,
}

/// One equality or existence predicate over a named document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// `fileName == value`
    FileName(FileName),
    /// `versionName == value`
    VersionName(VersionName),
    /// `riskAssessment` exists / does not exist
    RiskAssessment(Presence),
}

impl Clause {
    fn matches(&self, document: &Document) -> bool {
        match self {
            Self::FileName(name) => &document.file_name == name,
            Self::VersionName(version) => document.version_name == *version,
            Self::RiskAssessment(Presence::Present) => document.risk_assessment.is_some(),
            Self::RiskAssessment(Presence::Absent) => document.risk_assessment.is_none(),
        }
    }
}

/// A conjunction of clauses. The empty filter matches every document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filter {
    clauses: Vec<Clause>,
}

impl Filter {
    /// A filter matching every document.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Match every version of one file.
    #[must_use]
    pub fn file(file_name: &FileName) -> Self {
        Self {
            clauses: vec![Clause::FileName(file_name.clone())],
        }
    }

    /// Additionally require an exact version.
    #[must_use]
    pub fn version(mut self, version: VersionName) -> Self {
        self.clauses.push(Clause::VersionName(version));
        self
    }

    /// Additionally require the risk assessment field to exist.
    #[must_use]
    pub fn with_risk_assessment(mut self) -> Self {
        self.clauses.push(Clause::RiskAssessment(Presence::Present));
        self
    }

    /// Additionally require the risk assessment field to be absent.
    #[must_use]
    pub fn without_risk_assessment(mut self) -> Self {
        self.clauses.push(Clause::RiskAssessment(Presence::Absent));
        self
    }

    /// The clauses of this filter.
    #[must_use]
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Check whether a document satisfies every clause.
    #[must_use]
    pub fn matches(&self, document: &Document) -> bool {
        self.clauses.iter().all(|clause| clause.matches(document))
    }
}

// =============================================================================
// UPDATES
// =============================================================================

/// A single-document mutation.
///
/// Attaching a risk assessment is the only in-place change a stored document
/// ever receives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    SetRiskAssessment(RiskAssessment),
}

impl Update {
    /// Apply the mutation. Returns `true` if the document changed.
    pub fn apply(&self, document: &mut Document) -> bool {
        match self {
            Self::SetRiskAssessment(risk) => {
                if document.risk_assessment.as_ref() == Some(risk) {
                    return false;
                }
                document.risk_assessment = Some(*risk);
                true
            }
        }
    }
}

/// Result of `update_one`: how many documents matched and how many changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateResult {
    pub matched: u64,
    pub modified: u64,
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Contract of the underlying document store.
///
/// All methods take `&self`; implementations synchronize internally so one
/// instance can be shared between concurrent requests. Every error is a
/// store fault and is propagated unchanged by the callers.
pub trait DocumentStore: Send + Sync {
    /// Get all documents matching the filter, in insertion order.
    ///
    /// A collection that does not exist yields an empty result.
    fn find(&self, collection: &CollectionName, filter: &Filter)
    -> Result<Vec<Document>, VaultError>;

    /// Check whether at least one document matches the filter.
    ///
    /// Stops at the first match instead of materializing every version.
    fn exists(&self, collection: &CollectionName, filter: &Filter) -> Result<bool, VaultError>;

    /// Insert a document. Creates the collection implicitly.
    fn insert_one(&self, collection: &CollectionName, document: Document)
    -> Result<(), VaultError>;

    /// Insert a document only if no document with the same
    /// `(file_name, version_name)` exists, as one atomic step.
    ///
    /// Returns `VaultError::VersionConflict` when the pair is taken.
    fn insert_unique(
        &self,
        collection: &CollectionName,
        document: Document,
    ) -> Result<(), VaultError>;

    /// Apply an update to the first document matching the filter, as one
    /// atomic step.
    fn update_one(
        &self,
        collection: &CollectionName,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateResult, VaultError>;

    /// Delete the first document matching the filter. Returns the count deleted.
    fn delete_one(&self, collection: &CollectionName, filter: &Filter) -> Result<u64, VaultError>;

    /// Delete every document matching the filter. Returns the count deleted.
    fn delete_many(&self, collection: &CollectionName, filter: &Filter)
    -> Result<u64, VaultError>;

    /// Create a collection. Returns `false` if it already existed.
    fn create_collection(&self, name: &CollectionName) -> Result<bool, VaultError>;

    /// Drop a collection and all of its documents. Returns `false` if it did
    /// not exist.
    fn drop_collection(&self, name: &CollectionName) -> Result<bool, VaultError>;

    /// List all collections, sorted by name.
    fn list_collections(&self) -> Result<Vec<CollectionName>, VaultError>;

    /// Count documents matching the filter.
    fn count(&self, collection: &CollectionName, filter: &Filter) -> Result<usize, VaultError> {
        Ok(self.find(collection, filter)?.len())
    }
}

/// Check whether an existing document occupies the same version slot.
pub(crate) fn same_slot(existing: &Document, candidate: &Document) -> bool {
    existing.file_name == candidate.file_name && existing.version_name == candidate.version_name
}

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend selected at runtime.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory store (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    /// Create a volatile in-memory backend.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open or create a redb backend at the given path.
    pub fn redb(path: impl AsRef<Path>) -> Result<Self, VaultError> {
        Ok(Self::Persistent(RedbStore::open(path)?))
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent(_))
    }

    fn inner(&self) -> &dyn DocumentStore {
        match self {
            Self::InMemory(store) => store,
            Self::Persistent(store) => store,
        }
    }
}

impl DocumentStore for StorageBackend {
    fn find(
        &self,
        collection: &CollectionName,
        filter: &Filter,
    ) -> Result<Vec<Document>, VaultError> {
        self.inner().find(collection, filter)
    }

    fn exists(&self, collection: &CollectionName, filter: &Filter) -> Result<bool, VaultError> {
        self.inner().exists(collection, filter)
    }

    fn insert_one(
        &self,
        collection: &CollectionName,
        document: Document,
    ) -> Result<(), VaultError> {
        self.inner().insert_one(collection, document)
    }

    fn insert_unique(
        &self,
        collection: &CollectionName,
        document: Document,
    ) -> Result<(), VaultError> {
        self.inner().insert_unique(collection, document)
    }

    fn update_one(
        &self,
        collection: &CollectionName,
        filter: &Filter,
        update: &Update,
    ) -> Result<UpdateResult, VaultError> {
        self.inner().update_one(collection, filter, update)
    }

    fn delete_one(&self, collection: &CollectionName, filter: &Filter) -> Result<u64, VaultError> {
        self.inner().delete_one(collection, filter)
    }

    fn delete_many(
        &self,
        collection: &CollectionName,
        filter: &Filter,
    ) -> Result<u64, VaultError> {
        self.inner().delete_many(collection, filter)
    }

    fn create_collection(&self, name: &CollectionName) -> Result<bool, VaultError> {
        self.inner().create_collection(name)
    }

    fn drop_collection(&self, name: &CollectionName) -> Result<bool, VaultError> {
        self.inner().drop_collection(name)
    }

    fn list_collections(&self) -> Result<Vec<CollectionName>, VaultError> {
        self.inner().list_collections()
    }
}

// =============================================================================
// TESTS
// =============================================================================
