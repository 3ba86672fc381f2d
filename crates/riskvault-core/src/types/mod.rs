//! # Core Type Definitions
//!
//! This module contains the core types of the Riskvault document store:
//! - Identifiers (`FileName`, `CollectionName`, `VersionName`)
//! - Risk scoring (`CategoryScore`, `RiskAssessment`, `RiskCategory`)
//! - The versioned snapshot itself (`Document`)
//! - Error types (`VaultError`)
//!
//! ## Value Semantics
//!
//! A `RiskAssessment` is a value type: two assessments are the same when every
//! leaf integer matches, field by field. Nothing in this module carries an
//! identity beyond its content.

use crate::primitives::{
    MAX_COLLECTION_NAME_LENGTH, MAX_CONTENT_LENGTH, MAX_FILE_NAME_LENGTH,
    RESERVED_COLLECTION_PREFIX,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifies one logical document across all of its versions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileName(pub String);

impl FileName {
    /// Create a new file name.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the file name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the name against the input limits.
    pub fn validate(&self) -> Result<(), VaultError> {
        if self.0.trim().is_empty() {
            return Err(VaultError::InvalidInput("file name is empty".to_string()));
        }
        if self.0.len() > MAX_FILE_NAME_LENGTH {
            return Err(VaultError::InvalidInput(format!(
                "file name length {} exceeds maximum {} bytes",
                self.0.len(),
                MAX_FILE_NAME_LENGTH
            )));
        }
        Ok(())
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A caller-defined partition grouping related documents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionName(pub String);

impl CollectionName {
    /// Create a new collection name.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the collection name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the name against the naming rules of the document store.
    ///
    /// Rejects empty names, names over `MAX_COLLECTION_NAME_LENGTH`, names
    /// in the reserved `system.` namespace, and names containing `$` or NUL.
    pub fn validate(&self) -> Result<(), VaultError> {
        let name = self.0.as_str();
        if name.is_empty() {
            return Err(VaultError::InvalidInput(
                "collection name is empty".to_string(),
            ));
        }
        if name.len() > MAX_COLLECTION_NAME_LENGTH {
            return Err(VaultError::InvalidInput(format!(
                "collection name length {} exceeds maximum {} bytes",
                name.len(),
                MAX_COLLECTION_NAME_LENGTH
            )));
        }
        if name.starts_with(RESERVED_COLLECTION_PREFIX) {
            return Err(VaultError::InvalidInput(format!(
                "collection name '{}' uses the reserved '{}' prefix",
                name, RESERVED_COLLECTION_PREFIX
            )));
        }
        if name.contains('$') || name.contains('\0') {
            return Err(VaultError::InvalidInput(format!(
                "collection name '{}' contains a forbidden character",
                name
            )));
        }
        Ok(())
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Version number of a document, monotonic per file name, starting at 0.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct VersionName(pub u32);

impl VersionName {
    /// The version created by an upload.
    pub const INITIAL: Self = Self(0);

    /// Create a version name from a raw number.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// The version that follows this one, or `None` on overflow.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Get the raw version number.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Check if this is the version created by an upload.
    #[must_use]
    pub const fn is_initial(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for VersionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// RISK ASSESSMENT
// =============================================================================

/// The four scoring categories of a risk assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskCategory {
    Financial,
    Reputational,
    Regulatory,
    Operational,
}

impl RiskCategory {
    /// All categories in their canonical order.
    pub const ALL: [Self; 4] = [
        Self::Financial,
        Self::Reputational,
        Self::Regulatory,
        Self::Operational,
    ];

    /// Flattened leaf names for `score`, `systemQuery`, `keywords`, `xgb`.
    const fn leaf_names(self) -> [&'static str; 4] {
        match self {
            Self::Financial => [
                "financialScore",
                "financialSystemQueryScore",
                "financialKeywordsScore",
                "financialXgbScore",
            ],
            Self::Reputational => [
                "reputationalScore",
                "reputationalSystemQueryScore",
                "reputationalKeywordsScore",
                "reputationalXgbScore",
            ],
            Self::Regulatory => [
                "regulatoryScore",
                "regulatorySystemQueryScore",
                "regulatoryKeywordsScore",
                "regulatoryXgbScore",
            ],
            Self::Operational => [
                "operationalScore",
                "operationalSystemQueryScore",
                "operationalKeywordsScore",
                "operationalXgbScore",
            ],
        }
    }
}

/// Flattened name of the overall score.
pub const OVERALL_SCORE_FIELD: &str = "riskAssessmentScore";

/// Number of leaf integers in a risk assessment (1 overall + 4 x 4).
pub const LEAF_COUNT: usize = 17;

/// One scoring category: overall category score plus its three factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScore {
    pub score: i32,
    pub system_query: i32,
    pub keywords: i32,
    pub xgb: i32,
}

impl CategoryScore {
    /// Create a category score.
    #[must_use]
    pub const fn new(score: i32, system_query: i32, keywords: i32, xgb: i32) -> Self {
        Self {
            score,
            system_query,
            keywords,
            xgb,
        }
    }

    const fn leaves(self) -> [i32; 4] {
        [self.score, self.system_query, self.keywords, self.xgb]
    }
}

/// A composite, four-category integer risk score.
///
/// Immutable once embedded in a version: a different assessment always
/// produces a new version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub score: i32,
    pub financial: CategoryScore,
    pub reputational: CategoryScore,
    pub regulatory: CategoryScore,
    pub operational: CategoryScore,
}

impl RiskAssessment {
    /// Get the block for one category.
    #[must_use]
    pub const fn category(&self, category: RiskCategory) -> CategoryScore {
        match category {
            RiskCategory::Financial => self.financial,
            RiskCategory::Reputational => self.reputational,
            RiskCategory::Regulatory => self.regulatory,
            RiskCategory::Operational => self.operational,
        }
    }

    /// Flatten into the 17 named leaf integers.
    #[must_use]
    pub fn flatten(&self) -> BTreeMap<&'static str, i32> {
        let mut leaves = BTreeMap::new();
        leaves.insert(OVERALL_SCORE_FIELD, self.score);
        for category in RiskCategory::ALL {
            let names = category.leaf_names();
            let values = self.category(category).leaves();
            for (name, value) in names.into_iter().zip(values) {
                leaves.insert(name, value);
            }
        }
        leaves
    }

    /// Rebuild an assessment from flattened leaves.
    ///
    /// Every one of the 17 leaves must be present; unknown keys are ignored.
    pub fn from_flat(leaves: &BTreeMap<String, i32>) -> Result<Self, VaultError> {
        let leaf = |name: &str| {
            leaves.get(name).copied().ok_or_else(|| {
                VaultError::InvalidInput(format!("risk assessment field '{}' is missing", name))
            })
        };
        let block = |category: RiskCategory| -> Result<CategoryScore, VaultError> {
            let [score, system_query, keywords, xgb] = category.leaf_names();
            Ok(CategoryScore::new(
                leaf(score)?,
                leaf(system_query)?,
                leaf(keywords)?,
                leaf(xgb)?,
            ))
        };

        Ok(Self {
            score: leaf(OVERALL_SCORE_FIELD)?,
            financial: block(RiskCategory::Financial)?,
            reputational: block(RiskCategory::Reputational)?,
            regulatory: block(RiskCategory::Regulatory)?,
            operational: block(RiskCategory::Operational)?,
        })
    }
}

// =============================================================================
// DOCUMENT
// =============================================================================

/// One versioned snapshot of a file's content and its risk assessment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub file_name: FileName,
    pub content: String,
    pub version_name: VersionName,
    pub risk_assessment: Option<RiskAssessment>,
}

impl Document {
    /// The version-0 document created by an upload: no risk assessment.
    #[must_use]
    pub fn initial(file_name: FileName, content: impl Into<String>) -> Self {
        Self {
            file_name,
            content: content.into(),
            version_name: VersionName::INITIAL,
            risk_assessment: None,
        }
    }

    /// A scored document at an explicit version.
    #[must_use]
    pub fn versioned(
        file_name: FileName,
        content: impl Into<String>,
        version_name: VersionName,
        risk_assessment: RiskAssessment,
    ) -> Self {
        Self {
            file_name,
            content: content.into(),
            version_name,
            risk_assessment: Some(risk_assessment),
        }
    }

    /// Check if a risk assessment has been attached.
    #[must_use]
    pub fn has_risk_assessment(&self) -> bool {
        self.risk_assessment.is_some()
    }
}

/// Check extracted content against the size limit.
pub fn validate_content(content: &str) -> Result<(), VaultError> {
    if content.len() > MAX_CONTENT_LENGTH {
        return Err(VaultError::InvalidInput(format!(
            "content length {} exceeds maximum {} bytes",
            content.len(),
            MAX_CONTENT_LENGTH
        )));
    }
    Ok(())
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Riskvault core.
///
/// Expected results (already exists, rejected, unchanged, ...) are NOT
/// errors; they are reported through the per-operation outcome enums.
/// This type carries store faults, invalid input and contract violations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The underlying document store failed (connectivity, transaction, I/O).
    #[error("Store error: {0}")]
    Store(String),

    /// A record could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Caller input failed validation before reaching the store.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The latest version of a file carries no risk assessment.
    #[error("Latest version {version_name} of '{file_name}' has no risk assessment")]
    MissingRiskAssessment {
        file_name: FileName,
        version_name: VersionName,
    },

    /// An exclusive insert found the version number already taken.
    #[error("Version {version_name} of '{file_name}' already exists")]
    VersionConflict {
        file_name: FileName,
        version_name: VersionName,
    },

    /// The version counter of a file is exhausted.
    #[error("Version counter exhausted for '{0}'")]
    VersionOverflow(FileName),

    /// Text could not be extracted from an uploaded file.
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// A local I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

impl VaultError {
    /// Check if this error is a contract violation rather than a fault.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::MissingRiskAssessment { .. })
    }
}

// =============================================================================
// TESTS
// =============================================================================
