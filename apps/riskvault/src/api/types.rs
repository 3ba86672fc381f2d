//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Every response is wrapped in `ApiResponse`. Its `data` field is a
//! `ResponseData` variant tagged by `kind`, so only the payload shapes listed
//! here can ever be returned.

use chrono::{DateTime, Utc};
use riskvault_core::{
    CategoryScore, CollectionName, DocumentView, FileName, RiskAssessment, VersionName,
    VersionSummary,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// ENVELOPE
// =============================================================================

/// Envelope of every API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    /// `Success`, `Failure` (4xx) or `Error` (5xx).
    pub status_message: String,
    /// Human readable description of the outcome.
    pub status_message_text: String,
    pub timestamp: DateTime<Utc>,
    pub data: Option<ResponseData>,
}

impl ApiResponse {
    /// Build an envelope stamped with the current time.
    pub fn new(status_code: u16, text: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status_code,
            status_message: status_message_for(status_code).to_string(),
            status_message_text: text.into(),
            timestamp: Utc::now(),
            data,
        }
    }

    /// Whether the status code is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

fn status_message_for(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "Success",
        400..=499 => "Failure",
        _ => "Error",
    }
}

/// Payload of a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ResponseData {
    Health(HealthData),
    Collection(CollectionData),
    Collections(CollectionsData),
    DocumentRef(DocumentRef),
    Document(DocumentView),
    History(HistoryData),
    Deleted(DeletedData),
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Liveness payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
}

impl Default for HealthData {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A single collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionData {
    pub collection_name: CollectionName,
}

/// All collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionsData {
    pub collections: Vec<CollectionName>,
}

/// Identifies the document a write touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub collection_name: CollectionName,
    pub file_name: FileName,
    pub version_name: Option<VersionName>,
}

/// Version history of one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryData {
    pub collection_name: CollectionName,
    pub file_name: FileName,
    pub versions: Vec<VersionSummary>,
}

/// Result of a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedData {
    pub collection_name: CollectionName,
    pub file_name: FileName,
    pub deleted: u64,
}

// =============================================================================
// QUERY PARAMETERS
// =============================================================================

/// `?collectionName=`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionQuery {
    pub collection_name: String,
}

/// `?collectionName=&fileName=&version=`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentQuery {
    pub collection_name: String,
    pub file_name: String,
    pub version: Option<u32>,
}

/// `?collectionName=&fileName=&version=` with a mandatory version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionQuery {
    pub collection_name: String,
    pub file_name: String,
    pub version: u32,
}

// =============================================================================
// REQUEST BODIES
// =============================================================================

/// Upload of a new file. `data` is the base64-encoded file body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub collection_name: String,
    pub file_name: String,
    pub data: String,
}

/// The 17 risk assessment leaves as flat request fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskScores {
    pub risk_assessment_score: i32,
    pub financial_score: i32,
    pub financial_system_query_score: i32,
    pub financial_keywords_score: i32,
    pub financial_xgb_score: i32,
    pub reputational_score: i32,
    pub reputational_system_query_score: i32,
    pub reputational_keywords_score: i32,
    pub reputational_xgb_score: i32,
    pub regulatory_score: i32,
    pub regulatory_system_query_score: i32,
    pub regulatory_keywords_score: i32,
    pub regulatory_xgb_score: i32,
    pub operational_score: i32,
    pub operational_system_query_score: i32,
    pub operational_keywords_score: i32,
    pub operational_xgb_score: i32,
}

impl From<RiskScores> for RiskAssessment {
    fn from(s: RiskScores) -> Self {
        Self {
            score: s.risk_assessment_score,
            financial: CategoryScore::new(
                s.financial_score,
                s.financial_system_query_score,
                s.financial_keywords_score,
                s.financial_xgb_score,
            ),
            reputational: CategoryScore::new(
                s.reputational_score,
                s.reputational_system_query_score,
                s.reputational_keywords_score,
                s.reputational_xgb_score,
            ),
            regulatory: CategoryScore::new(
                s.regulatory_score,
                s.regulatory_system_query_score,
                s.regulatory_keywords_score,
                s.regulatory_xgb_score,
            ),
            operational: CategoryScore::new(
                s.operational_score,
                s.operational_system_query_score,
                s.operational_keywords_score,
                s.operational_xgb_score,
            ),
        }
    }
}

impl From<RiskAssessment> for RiskScores {
    fn from(r: RiskAssessment) -> Self {
        Self {
            risk_assessment_score: r.score,
            financial_score: r.financial.score,
            financial_system_query_score: r.financial.system_query,
            financial_keywords_score: r.financial.keywords,
            financial_xgb_score: r.financial.xgb,
            reputational_score: r.reputational.score,
            reputational_system_query_score: r.reputational.system_query,
            reputational_keywords_score: r.reputational.keywords,
            reputational_xgb_score: r.reputational.xgb,
            regulatory_score: r.regulatory.score,
            regulatory_system_query_score: r.regulatory.system_query,
            regulatory_keywords_score: r.regulatory.keywords,
            regulatory_xgb_score: r.regulatory.xgb,
            operational_score: r.operational.score,
            operational_system_query_score: r.operational.system_query,
            operational_keywords_score: r.operational.keywords,
            operational_xgb_score: r.operational.xgb,
        }
    }
}

/// Attach a risk assessment to version 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachRequest {
    pub collection_name: String,
    pub file_name: String,
    #[serde(flatten)]
    pub scores: RiskScores,
}

/// Save a new version.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveVersionRequest {
    pub collection_name: String,
    pub file_name: String,
    pub content: String,
    #[serde(flatten)]
    pub scores: RiskScores,
}
