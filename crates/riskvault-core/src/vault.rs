//! # Vault
//!
//! The version writer, mutator and reader of the document store.
//!
//! A `Vault` owns one injected `DocumentStore`. Every operation is an
//! independent unit of work: it reads current state from the store, decides,
//! and issues at most one mutation. There is no in-process state beyond the
//! store handle.
//!
//! ## Lifecycle of a file
//!
//! 1. `upload` creates version 0 without a risk assessment.
//! 2. `attach_risk_assessment` sets the risk assessment of version 0, once.
//! 3. `save_version` appends `max + 1` whenever the supplied risk assessment
//!    differs from the one in the latest version.
//!
//! ## Concurrency
//!
//! `attach_risk_assessment` is a single conditional update and is safe under
//! concurrent writers. `save_version` resolves and then inserts, which is two
//! store calls: two concurrent saves of the same file can resolve the same
//! next number and both insert. `save_version_exclusive` closes that race by
//! inserting through `DocumentStore::insert_unique`, which reports the loser
//! as `VaultError::VersionConflict`.

use crate::comparator::RiskAssessmentComparator;
use crate::resolver::{Resolution, VersionResolver};
use crate::storage::{DocumentStore, Filter, StorageBackend, Update};
use crate::types::validate_content;
use crate::{CollectionName, Document, FileName, RiskAssessment, VaultError, VersionName};
use serde::{Deserialize, Serialize};
use std::path::Path;

// =============================================================================
// OUTCOMES
// =============================================================================

/// Outcome of creating or dropping a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionOutcome {
    Created,
    AlreadyExists,
    Dropped,
    NotFound,
}

/// Outcome of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Version 0 was inserted.
    Created,
    /// Some version of the file already exists; nothing was written.
    AlreadyExists,
}

/// Outcome of attaching a risk assessment to version 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The risk assessment was set on version 0.
    Attached,
    /// No unscored version 0 exists: either the file is unknown or version 0
    /// already carries a risk assessment.
    Rejected,
    /// The conditional filter matched but the store modified nothing.
    NotFound,
}

/// Outcome of saving a new version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The file has no versions; nothing was written.
    NoHistory,
    /// The risk assessment equals the latest one; nothing was written.
    Unchanged,
    /// A new version was inserted.
    Saved(VersionName),
}

/// Outcome of a retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GetOutcome {
    Found(Document),
    NotFound,
}

impl GetOutcome {
    /// Convert into an `Option`.
    #[must_use]
    pub fn into_document(self) -> Option<Document> {
        match self {
            Self::Found(document) => Some(document),
            Self::NotFound => None,
        }
    }
}

/// Outcome of a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// This many documents were removed (always at least one).
    Deleted(u64),
    NotFound,
}

/// One entry of a file's version history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub version_name: VersionName,
    pub has_risk_assessment: bool,
    pub risk_score: Option<i32>,
    pub content_length: usize,
}

impl From<&Document> for VersionSummary {
    fn from(document: &Document) -> Self {
        Self {
            version_name: document.version_name,
            has_risk_assessment: document.has_risk_assessment(),
            risk_score: document.risk_assessment.map(|r| r.score),
            content_length: document.content.len(),
        }
    }
}

/// Flattened retrieval shape of one stored version.
///
/// The 17 leaves are `None` when the version has no risk assessment yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub file_name: FileName,
    pub collection_name: CollectionName,
    pub version_name: VersionName,
    pub content: String,
    pub risk_assessment_score: Option<i32>,
    pub financial_score: Option<i32>,
    pub financial_system_query_score: Option<i32>,
    pub financial_keywords_score: Option<i32>,
    pub financial_xgb_score: Option<i32>,
    pub reputational_score: Option<i32>,
    pub reputational_system_query_score: Option<i32>,
    pub reputational_keywords_score: Option<i32>,
    pub reputational_xgb_score: Option<i32>,
    pub regulatory_score: Option<i32>,
    pub regulatory_system_query_score: Option<i32>,
    pub regulatory_keywords_score: Option<i32>,
    pub regulatory_xgb_score: Option<i32>,
    pub operational_score: Option<i32>,
    pub operational_system_query_score: Option<i32>,
    pub operational_keywords_score: Option<i32>,
    pub operational_xgb_score: Option<i32>,
}

impl DocumentView {
    /// Flatten a stored document of `collection`.
    #[must_use]
    pub fn new(document: &Document, collection: &CollectionName) -> Self {
        let risk = document.risk_assessment;
        let leaf = |f: fn(&RiskAssessment) -> i32| risk.as_ref().map(f);

        Self {
            file_name: document.file_name.clone(),
            collection_name: collection.clone(),
            version_name: document.version_name,
            content: document.content.clone(),
            risk_assessment_score: leaf(|r| r.score),
            financial_score: leaf(|r| r.financial.score),
            financial_system_query_score: leaf(|r| r.financial.system_query),
            financial_keywords_score: leaf(|r| r.financial.keywords),
            financial_xgb_score: leaf(|r| r.financial.xgb),
            reputational_score: leaf(|r| r.reputational.score),
            reputational_system_query_score: leaf(|r| r.reputational.system_query),
            reputational_keywords_score: leaf(|r| r.reputational.keywords),
            reputational_xgb_score: leaf(|r| r.reputational.xgb),
            regulatory_score: leaf(|r| r.regulatory.score),
            regulatory_system_query_score: leaf(|r| r.regulatory.system_query),
            regulatory_keywords_score: leaf(|r| r.regulatory.keywords),
            regulatory_xgb_score: leaf(|r| r.regulatory.xgb),
            operational_score: leaf(|r| r.operational.score),
            operational_system_query_score: leaf(|r| r.operational.system_query),
            operational_keywords_score: leaf(|r| r.operational.keywords),
            operational_xgb_score: leaf(|r| r.operational.xgb),
        }
    }
}

// =============================================================================
// VAULT
// =============================================================================

/// Versioned document store over an injected `DocumentStore`.
#[derive(Debug, Default)]
pub struct Vault<S = StorageBackend> {
    store: S,
}

impl Vault<StorageBackend> {
    /// Create a vault over a volatile in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(StorageBackend::in_memory())
    }

    /// Create a vault over a redb database at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, VaultError> {
        Ok(Self::new(StorageBackend::redb(path)?))
    }
}

impl<S: DocumentStore> Vault<S> {
    /// Create a vault over the given store.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Get a reference to the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Collections
    // -------------------------------------------------------------------------

    /// Create a collection.
    pub fn create_collection(
        &self,
        collection: &CollectionName,
    ) -> Result<CollectionOutcome, VaultError> {
        collection.validate()?;
        let outcome = if self.store.create_collection(collection)? {
            tracing::info!(collection = %collection, "collection created");
            CollectionOutcome::Created
        } else {
            CollectionOutcome::AlreadyExists
        };
        Ok(outcome)
    }

    /// Drop a collection and every document in it.
    pub fn drop_collection(
        &self,
        collection: &CollectionName,
    ) -> Result<CollectionOutcome, VaultError> {
        collection.validate()?;
        let outcome = if self.store.drop_collection(collection)? {
            tracing::info!(collection = %collection, "collection dropped");
            CollectionOutcome::Dropped
        } else {
            CollectionOutcome::NotFound
        };
        Ok(outcome)
    }

    /// List all collections.
    pub fn list_collections(&self) -> Result<Vec<CollectionName>, VaultError> {
        self.store.list_collections()
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Store extracted text as version 0 of a new file.
    ///
    /// Idempotent: if any version of the file exists, nothing is written.
    pub fn upload(
        &self,
        file_name: &FileName,
        content: &str,
        collection: &CollectionName,
    ) -> Result<UploadOutcome, VaultError> {
        validate_target(file_name, collection)?;
        validate_content(content)?;
        tracing::debug!(file = %file_name, collection = %collection, "upload");

        if self.store.exists(collection, &Filter::file(file_name))? {
            tracing::debug!(file = %file_name, "upload skipped, file already exists");
            return Ok(UploadOutcome::AlreadyExists);
        }

        self.store
            .insert_one(collection, Document::initial(file_name.clone(), content))?;
        tracing::info!(file = %file_name, collection = %collection, "version 0 created");
        Ok(UploadOutcome::Created)
    }

    /// Attach a risk assessment to version 0 of a file.
    ///
    /// Succeeds at most once per file: the update only matches a version 0
    /// whose risk assessment field does not exist yet.
    pub fn attach_risk_assessment(
        &self,
        file_name: &FileName,
        collection: &CollectionName,
        risk_assessment: RiskAssessment,
    ) -> Result<AttachOutcome, VaultError> {
        validate_target(file_name, collection)?;
        tracing::debug!(file = %file_name, collection = %collection, "attach risk assessment");

        let filter = Filter::file(file_name)
            .version(VersionName::INITIAL)
            .without_risk_assessment();
        let result = self.store.update_one(
            collection,
            &filter,
            &Update::SetRiskAssessment(risk_assessment),
        )?;

        if result.matched == 0 {
            tracing::warn!(file = %file_name, "attach rejected, no unscored version 0");
            return Ok(AttachOutcome::Rejected);
        }
        if result.modified == 0 {
            tracing::warn!(file = %file_name, "attach matched but store modified nothing");
            return Ok(AttachOutcome::NotFound);
        }

        tracing::info!(file = %file_name, score = risk_assessment.score, "risk assessment attached");
        Ok(AttachOutcome::Attached)
    }

    /// Append a new version when the risk assessment differs from the latest.
    pub fn save_version(
        &self,
        file_name: &FileName,
        collection: &CollectionName,
        content: &str,
        risk_assessment: RiskAssessment,
    ) -> Result<SaveOutcome, VaultError> {
        self.save(file_name, collection, content, risk_assessment, false)
    }

    /// Same as `save_version`, but the insert fails with
    /// `VaultError::VersionConflict` if another writer took the number first.
    pub fn save_version_exclusive(
        &self,
        file_name: &FileName,
        collection: &CollectionName,
        content: &str,
        risk_assessment: RiskAssessment,
    ) -> Result<SaveOutcome, VaultError> {
        self.save(file_name, collection, content, risk_assessment, true)
    }

    fn save(
        &self,
        file_name: &FileName,
        collection: &CollectionName,
        content: &str,
        risk_assessment: RiskAssessment,
        exclusive: bool,
    ) -> Result<SaveOutcome, VaultError> {
        validate_target(file_name, collection)?;
        validate_content(content)?;
        tracing::debug!(file = %file_name, collection = %collection, exclusive, "save version");

        let (latest, next_version) =
            match VersionResolver::resolve_latest(&self.store, collection, file_name)? {
                Resolution::NoHistory => {
                    tracing::debug!(file = %file_name, "save skipped, no version history");
                    return Ok(SaveOutcome::NoHistory);
                }
                Resolution::Latest {
                    document,
                    next_version,
                } => (document, next_version),
            };

        let Some(current) = latest.risk_assessment else {
            tracing::error!(
                file = %file_name,
                version = %latest.version_name,
                "latest version has no risk assessment"
            );
            return Err(VaultError::MissingRiskAssessment {
                file_name: file_name.clone(),
                version_name: latest.version_name,
            });
        };

        if RiskAssessmentComparator::equal(&current, &risk_assessment) {
            tracing::debug!(file = %file_name, version = %latest.version_name, "risk assessment unchanged");
            return Ok(SaveOutcome::Unchanged);
        }

        let document =
            Document::versioned(file_name.clone(), content, next_version, risk_assessment);
        if exclusive {
            self.store.insert_unique(collection, document)?;
        } else {
            self.store.insert_one(collection, document)?;
        }

        tracing::info!(
            file = %file_name,
            collection = %collection,
            version = %next_version,
            score = risk_assessment.score,
            "version saved"
        );
        Ok(SaveOutcome::Saved(next_version))
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Retrieve a document.
    ///
    /// With a version, matches `fileName` and `versionName`. Without one,
    /// matches by `fileName` only and returns the lowest version.
    pub fn get_document(
        &self,
        file_name: &FileName,
        collection: &CollectionName,
        version: Option<VersionName>,
    ) -> Result<GetOutcome, VaultError> {
        validate_target(file_name, collection)?;

        let filter = match version {
            Some(v) => Filter::file(file_name).version(v),
            None => Filter::file(file_name),
        };
        let found = self
            .store
            .find(collection, &filter)?
            .into_iter()
            .min_by_key(|d| d.version_name);

        Ok(match found {
            Some(document) => GetOutcome::Found(document),
            None => GetOutcome::NotFound,
        })
    }

    /// Retrieve the document with the highest version.
    pub fn get_latest(
        &self,
        file_name: &FileName,
        collection: &CollectionName,
    ) -> Result<GetOutcome, VaultError> {
        validate_target(file_name, collection)?;

        Ok(
            match VersionResolver::resolve_latest(&self.store, collection, file_name)? {
                Resolution::Latest { document, .. } => GetOutcome::Found(document),
                Resolution::NoHistory => GetOutcome::NotFound,
            },
        )
    }

    /// List the versions of a file, ascending.
    pub fn list_versions(
        &self,
        file_name: &FileName,
        collection: &CollectionName,
    ) -> Result<Vec<VersionSummary>, VaultError> {
        validate_target(file_name, collection)?;

        let mut history: Vec<VersionSummary> = self
            .store
            .find(collection, &Filter::file(file_name))?
            .iter()
            .map(VersionSummary::from)
            .collect();
        history.sort_by_key(|s| s.version_name);
        Ok(history)
    }

    // -------------------------------------------------------------------------
    // Deletes
    // -------------------------------------------------------------------------

    /// Delete exactly one version of a file.
    ///
    /// Remaining versions keep their numbers.
    pub fn delete_version(
        &self,
        file_name: &FileName,
        collection: &CollectionName,
        version: VersionName,
    ) -> Result<DeleteOutcome, VaultError> {
        validate_target(file_name, collection)?;

        let deleted = self
            .store
            .delete_one(collection, &Filter::file(file_name).version(version))?;
        Ok(delete_outcome(file_name, deleted))
    }

    /// Delete every version of a file.
    pub fn delete_document(
        &self,
        file_name: &FileName,
        collection: &CollectionName,
    ) -> Result<DeleteOutcome, VaultError> {
        validate_target(file_name, collection)?;

        let deleted = self
            .store
            .delete_many(collection, &Filter::file(file_name))?;
        Ok(delete_outcome(file_name, deleted))
    }
}

fn validate_target(file_name: &FileName, collection: &CollectionName) -> Result<(), VaultError> {
    file_name.validate()?;
    collection.validate()
}

fn delete_outcome(file_name: &FileName, deleted: u64) -> DeleteOutcome {
    if deleted == 0 {
        return DeleteOutcome::NotFound;
    }
    tracing::info!(file = %file_name, deleted, "documents deleted");
    DeleteOutcome::Deleted(deleted)
}

// =============================================================================
// TESTS
// =============================================================================
