//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Each handler builds core identifiers from the request, calls one `Vault`
//! operation and maps its outcome to a status code. Name validation happens
//! in the core and surfaces as 400.

use super::{
    AppState,
    types::{
        ApiResponse, AttachRequest, CollectionData, CollectionQuery, CollectionsData,
        DeletedData, DocumentQuery, DocumentRef, HealthData, HistoryData, ResponseData,
        SaveVersionRequest, UploadRequest, VersionQuery,
    },
};
use crate::extract::extract_text;
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use riskvault_core::{
    AttachOutcome, CollectionName, CollectionOutcome, DeleteOutcome, DocumentView, FileName,
    GetOutcome, SaveOutcome, UploadOutcome, VaultError, VersionName,
};

/// Status code plus enveloped body.
pub type ApiResult = (StatusCode, Json<ApiResponse>);

fn reply(status: StatusCode, text: impl Into<String>, data: Option<ResponseData>) -> ApiResult {
    (status, Json(ApiResponse::new(status.as_u16(), text, data)))
}

/// Map a core error to an HTTP status.
///
/// Invalid input is the caller's fault. A taken version number is a
/// conflict. Contract violations and store faults are server errors.
pub fn error_status(error: &VaultError) -> StatusCode {
    match error {
        VaultError::InvalidInput(_) | VaultError::Extraction(_) => StatusCode::BAD_REQUEST,
        VaultError::VersionConflict { .. } => StatusCode::CONFLICT,
        VaultError::MissingRiskAssessment { .. }
        | VaultError::VersionOverflow(_)
        | VaultError::Store(_)
        | VaultError::Serialization(_)
        | VaultError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn fail(error: VaultError) -> ApiResult {
    let status = error_status(&error);
    if status.is_server_error() {
        tracing::error!(error = %error, "request failed");
    } else {
        tracing::debug!(error = %error, "request refused");
    }
    reply(status, error.to_string(), None)
}

/// Extractor rejections (malformed body, missing field or parameter) get the
/// same envelope as every other reply, keeping axum's status code.
fn accept_json<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiResult> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| rejected(e.status(), e.body_text()))
}

fn accept_query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiResult> {
    params
        .map(|Query(value)| value)
        .map_err(|e| rejected(e.status(), e.body_text()))
}

fn rejected(status: StatusCode, text: String) -> ApiResult {
    tracing::debug!(status = %status, reason = %text, "request rejected");
    reply(status, text, None)
}

fn document_ref(
    collection: &CollectionName,
    file: &FileName,
    version: Option<VersionName>,
) -> Option<ResponseData> {
    Some(ResponseData::DocumentRef(DocumentRef {
        collection_name: collection.clone(),
        file_name: file.clone(),
        version_name: version,
    }))
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> ApiResult {
    reply(
        StatusCode::OK,
        "Service is healthy.",
        Some(ResponseData::Health(HealthData::default())),
    )
}

// =============================================================================
// COLLECTION HANDLERS
// =============================================================================

/// `POST /collections?collectionName=`
pub async fn create_collection_handler(
    State(state): State<AppState>,
    params: Result<Query<CollectionQuery>, QueryRejection>,
) -> ApiResult {
    let query = match accept_query(params) {
        Ok(query) => query,
        Err(rejection) => return rejection,
    };
    let collection = CollectionName::new(query.collection_name);
    let data = Some(ResponseData::Collection(CollectionData {
        collection_name: collection.clone(),
    }));

    match state.vault.create_collection(&collection) {
        Ok(CollectionOutcome::Created) => {
            reply(StatusCode::CREATED, "Collection created successfully.", data)
        }
        Ok(_) => reply(StatusCode::OK, "Collection already exists.", data),
        Err(e) => fail(e),
    }
}

/// `DELETE /collections?collectionName=`
pub async fn drop_collection_handler(
    State(state): State<AppState>,
    params: Result<Query<CollectionQuery>, QueryRejection>,
) -> ApiResult {
    let query = match accept_query(params) {
        Ok(query) => query,
        Err(rejection) => return rejection,
    };
    let collection = CollectionName::new(query.collection_name);

    match state.vault.drop_collection(&collection) {
        Ok(CollectionOutcome::Dropped) => {
            reply(StatusCode::OK, "Collection deleted successfully.", None)
        }
        Ok(_) => reply(StatusCode::NOT_FOUND, "Collection not found.", None),
        Err(e) => fail(e),
    }
}

/// `GET /collections`
pub async fn list_collections_handler(State(state): State<AppState>) -> ApiResult {
    match state.vault.list_collections() {
        Ok(collections) => reply(
            StatusCode::OK,
            format!("{} collection(s).", collections.len()),
            Some(ResponseData::Collections(CollectionsData { collections })),
        ),
        Err(e) => fail(e),
    }
}

// =============================================================================
// WRITE HANDLERS
// =============================================================================

/// `POST /documents/upload`
///
/// Decodes the base64 body, extracts its text and stores it as version 0.
pub async fn upload_handler(
    State(state): State<AppState>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> ApiResult {
    let request = match accept_json(payload) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };
    let collection = CollectionName::new(request.collection_name);
    let file = FileName::new(request.file_name);

    let bytes = match STANDARD.decode(request.data.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            return reply(
                StatusCode::BAD_REQUEST,
                format!("Invalid base64 data: {}", e),
                None,
            );
        }
    };
    if bytes.len() > state.max_upload_bytes {
        return reply(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!(
                "File size {} bytes exceeds maximum {} bytes",
                bytes.len(),
                state.max_upload_bytes
            ),
            None,
        );
    }

    let content = match extract_text(&file, &bytes) {
        Ok(text) => text,
        Err(e) => return fail(e),
    };

    match state.vault.upload(&file, &content, &collection) {
        Ok(UploadOutcome::Created) => reply(
            StatusCode::CREATED,
            "Document uploaded successfully.",
            document_ref(&collection, &file, Some(VersionName::INITIAL)),
        ),
        Ok(UploadOutcome::AlreadyExists) => reply(
            StatusCode::OK,
            "Document already exists.",
            document_ref(&collection, &file, None),
        ),
        Err(e) => fail(e),
    }
}

/// `POST /documents/risk-assessment`
pub async fn attach_handler(
    State(state): State<AppState>,
    payload: Result<Json<AttachRequest>, JsonRejection>,
) -> ApiResult {
    let request = match accept_json(payload) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };
    let collection = CollectionName::new(request.collection_name);
    let file = FileName::new(request.file_name);

    match state
        .vault
        .attach_risk_assessment(&file, &collection, request.scores.into())
    {
        Ok(AttachOutcome::Attached) => reply(
            StatusCode::OK,
            "Risk assessment attached successfully.",
            document_ref(&collection, &file, Some(VersionName::INITIAL)),
        ),
        Ok(AttachOutcome::Rejected) => reply(
            StatusCode::CONFLICT,
            "No unscored version 0 exists for this file.",
            None,
        ),
        Ok(AttachOutcome::NotFound) => {
            reply(StatusCode::NOT_FOUND, "Document not found.", None)
        }
        Err(e) => fail(e),
    }
}

/// `POST /documents/versions`
pub async fn save_version_handler(
    State(state): State<AppState>,
    payload: Result<Json<SaveVersionRequest>, JsonRejection>,
) -> ApiResult {
    let request = match accept_json(payload) {
        Ok(request) => request,
        Err(rejection) => return rejection,
    };
    let collection = CollectionName::new(request.collection_name);
    let file = FileName::new(request.file_name);

    match state.vault.save_version(
        &file,
        &collection,
        &request.content,
        request.scores.into(),
    ) {
        Ok(SaveOutcome::Saved(version)) => reply(
            StatusCode::CREATED,
            "Version saved successfully.",
            document_ref(&collection, &file, Some(version)),
        ),
        Ok(SaveOutcome::Unchanged) => reply(
            StatusCode::OK,
            "Risk assessment unchanged, no version created.",
            document_ref(&collection, &file, None),
        ),
        Ok(SaveOutcome::NoHistory) => reply(
            StatusCode::NOT_FOUND,
            "No existing version history for this file.",
            None,
        ),
        Err(e) => fail(e),
    }
}

// =============================================================================
// READ HANDLERS
// =============================================================================

fn found_reply(collection: &CollectionName, outcome: GetOutcome) -> ApiResult {
    match outcome {
        GetOutcome::Found(document) => reply(
            StatusCode::OK,
            "Document retrieved successfully.",
            Some(ResponseData::Document(DocumentView::new(&document, collection))),
        ),
        GetOutcome::NotFound => reply(StatusCode::NOT_FOUND, "Document not found.", None),
    }
}

/// `GET /documents?collectionName=&fileName=&version=`
pub async fn get_document_handler(
    State(state): State<AppState>,
    params: Result<Query<DocumentQuery>, QueryRejection>,
) -> ApiResult {
    let query = match accept_query(params) {
        Ok(query) => query,
        Err(rejection) => return rejection,
    };
    let collection = CollectionName::new(query.collection_name);
    let file = FileName::new(query.file_name);

    match state
        .vault
        .get_document(&file, &collection, query.version.map(VersionName::new))
    {
        Ok(outcome) => found_reply(&collection, outcome),
        Err(e) => fail(e),
    }
}

/// `GET /documents/latest?collectionName=&fileName=`
pub async fn get_latest_handler(
    State(state): State<AppState>,
    params: Result<Query<DocumentQuery>, QueryRejection>,
) -> ApiResult {
    let query = match accept_query(params) {
        Ok(query) => query,
        Err(rejection) => return rejection,
    };
    let collection = CollectionName::new(query.collection_name);
    let file = FileName::new(query.file_name);

    match state.vault.get_latest(&file, &collection) {
        Ok(outcome) => found_reply(&collection, outcome),
        Err(e) => fail(e),
    }
}

/// `GET /documents/history?collectionName=&fileName=`
pub async fn history_handler(
    State(state): State<AppState>,
    params: Result<Query<DocumentQuery>, QueryRejection>,
) -> ApiResult {
    let query = match accept_query(params) {
        Ok(query) => query,
        Err(rejection) => return rejection,
    };
    let collection = CollectionName::new(query.collection_name);
    let file = FileName::new(query.file_name);

    match state.vault.list_versions(&file, &collection) {
        Ok(versions) if versions.is_empty() => {
            reply(StatusCode::NOT_FOUND, "Document not found.", None)
        }
        Ok(versions) => reply(
            StatusCode::OK,
            format!("{} version(s).", versions.len()),
            Some(ResponseData::History(HistoryData {
                collection_name: collection,
                file_name: file,
                versions,
            })),
        ),
        Err(e) => fail(e),
    }
}

// =============================================================================
// DELETE HANDLERS
// =============================================================================

fn deleted_reply(collection: CollectionName, file: FileName, outcome: DeleteOutcome) -> ApiResult {
    match outcome {
        DeleteOutcome::Deleted(deleted) => reply(
            StatusCode::OK,
            "Document deleted successfully.",
            Some(ResponseData::Deleted(DeletedData {
                collection_name: collection,
                file_name: file,
                deleted,
            })),
        ),
        DeleteOutcome::NotFound => reply(StatusCode::NOT_FOUND, "Document not found.", None),
    }
}

/// `DELETE /documents/version?collectionName=&fileName=&version=`
pub async fn delete_version_handler(
    State(state): State<AppState>,
    params: Result<Query<VersionQuery>, QueryRejection>,
) -> ApiResult {
    let query = match accept_query(params) {
        Ok(query) => query,
        Err(rejection) => return rejection,
    };
    let collection = CollectionName::new(query.collection_name);
    let file = FileName::new(query.file_name);

    match state
        .vault
        .delete_version(&file, &collection, VersionName::new(query.version))
    {
        Ok(outcome) => deleted_reply(collection, file, outcome),
        Err(e) => fail(e),
    }
}

/// `DELETE /documents?collectionName=&fileName=`
pub async fn delete_document_handler(
    State(state): State<AppState>,
    params: Result<Query<DocumentQuery>, QueryRejection>,
) -> ApiResult {
    let query = match accept_query(params) {
        Ok(query) => query,
        Err(rejection) => return rejection,
    };
    let collection = CollectionName::new(query.collection_name);
    let file = FileName::new(query.file_name);

    match state.vault.delete_document(&file, &collection) {
        Ok(outcome) => deleted_reply(collection, file, outcome),
        Err(e) => fail(e),
    }
}

// =============================================================================
// TESTS
// =============================================================================
