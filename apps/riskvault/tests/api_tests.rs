//! Integration tests for the Riskvault HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::StatusCode;
use axum_test::TestServer;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use riskvault::api::{
    ApiResponse, AppState, AttachRequest, ResponseData, RiskScores, SaveVersionRequest,
    UploadRequest, create_router,
};
use riskvault::config::{AppConfig, BackendKind};
use riskvault_core::{Vault, VersionName};

const NS: &str = "contracts";
const FILE: &str = "lease.txt";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn test_config() -> AppConfig {
    AppConfig {
        backend: BackendKind::Memory,
        rate_limit: 0,
        ..AppConfig::default()
    }
}

/// Create a test server over a fresh in-memory vault.
fn create_test_server_with(config: AppConfig) -> TestServer {
    let state = AppState::new(Vault::in_memory(), config.max_upload_bytes);
    TestServer::new(create_router(state, &config)).unwrap()
}

fn create_test_server() -> TestServer {
    create_test_server_with(test_config())
}

fn upload_request(file: &str, text: &str) -> UploadRequest {
    UploadRequest {
        collection_name: NS.to_string(),
        file_name: file.to_string(),
        data: STANDARD.encode(text.as_bytes()),
    }
}

fn scores(score: i32) -> RiskScores {
    RiskScores {
        risk_assessment_score: score,
        financial_score: score,
        ..RiskScores::default()
    }
}

fn attach_request(score: i32) -> AttachRequest {
    AttachRequest {
        collection_name: NS.to_string(),
        file_name: FILE.to_string(),
        scores: scores(score),
    }
}

fn save_request(content: &str, score: i32) -> SaveVersionRequest {
    SaveVersionRequest {
        collection_name: NS.to_string(),
        file_name: FILE.to_string(),
        content: content.to_string(),
        scores: scores(score),
    }
}

/// Upload `FILE` and attach an all-zero risk assessment.
async fn seed(server: &TestServer) {
    server
        .post("/documents/upload")
        .json(&upload_request(FILE, "text1"))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/documents/risk-assessment")
        .json(&attach_request(0))
        .await
        .assert_status_ok();
}

fn saved_version(body: &ApiResponse) -> Option<VersionName> {
    match &body.data {
        Some(ResponseData::DocumentRef(r)) => r.version_name,
        _ => None,
    }
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: ApiResponse = response.json();
    assert_eq!(body.status_code, 200);
    assert_eq!(body.status_message, "Success");
    match body.data {
        Some(ResponseData::Health(health)) => {
            assert_eq!(health.status, "ok");
            assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

// =============================================================================
// COLLECTION ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_collection_lifecycle() {
    let server = create_test_server();

    server
        .post("/collections")
        .add_query_param("collectionName", NS)
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/collections")
        .add_query_param("collectionName", NS)
        .await
        .assert_status_ok();

    let body: ApiResponse = server.get("/collections").await.json();
    match body.data {
        Some(ResponseData::Collections(list)) => {
            assert_eq!(list.collections.len(), 1);
            assert_eq!(list.collections[0].as_str(), NS);
        }
        other => panic!("unexpected payload: {:?}", other),
    }

    server
        .delete("/collections")
        .add_query_param("collectionName", NS)
        .await
        .assert_status_ok();
    server
        .delete("/collections")
        .add_query_param("collectionName", NS)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reserved_collection_name_rejected() {
    let server = create_test_server();

    let response = server
        .post("/collections")
        .add_query_param("collectionName", "system.users")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: ApiResponse = response.json();
    assert_eq!(body.status_message, "Failure");
    assert!(body.data.is_none());
}

#[tokio::test]
async fn test_missing_query_parameter_rejected() {
    let server = create_test_server();

    let response = server.post("/collections").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: ApiResponse = response.json();
    assert_eq!(body.status_code, 400);
    assert_eq!(body.status_message, "Failure");
    assert!(body.status_message_text.contains("collectionName"));
    assert!(body.data.is_none());
}

#[tokio::test]
async fn test_malformed_json_body_enveloped() {
    let server = create_test_server();

    let response = server
        .post("/documents/upload")
        .text("{not json")
        .content_type("application/json")
        .await;
    assert!(response.status_code().is_client_error());
    let body: ApiResponse = response.json();
    assert_eq!(body.status_code, response.status_code().as_u16());
    assert_eq!(body.status_message, "Failure");
    assert!(body.data.is_none());
}

// =============================================================================
// UPLOAD ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_upload_is_idempotent() {
    let server = create_test_server();

    let first = server
        .post("/documents/upload")
        .json(&upload_request(FILE, "text1"))
        .await;
    first.assert_status(StatusCode::CREATED);
    assert_eq!(saved_version(&first.json()), Some(VersionName::INITIAL));

    let second = server
        .post("/documents/upload")
        .json(&upload_request(FILE, "other text"))
        .await;
    second.assert_status_ok();
    let body: ApiResponse = second.json();
    assert_eq!(body.status_message_text, "Document already exists.");

    let doc: ApiResponse = server
        .get("/documents")
        .add_query_param("collectionName", NS)
        .add_query_param("fileName", FILE)
        .await
        .json();
    match doc.data {
        Some(ResponseData::Document(view)) => assert_eq!(view.content, "text1"),
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[tokio::test]
async fn test_upload_invalid_base64() {
    let server = create_test_server();

    let request = UploadRequest {
        collection_name: NS.to_string(),
        file_name: FILE.to_string(),
        data: "***not base64***".to_string(),
    };
    server
        .post("/documents/upload")
        .json(&request)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_too_large() {
    let server = create_test_server_with(AppConfig {
        max_upload_bytes: 8,
        ..test_config()
    });

    server
        .post("/documents/upload")
        .json(&upload_request(FILE, "more than eight bytes"))
        .await
        .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_upload_binary_text_rejected() {
    let server = create_test_server();

    let request = UploadRequest {
        collection_name: NS.to_string(),
        file_name: "blob.bin".to_string(),
        data: STANDARD.encode([0xffu8, 0xfe, 0x00]),
    };
    server
        .post("/documents/upload")
        .json(&request)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

// =============================================================================
// ATTACH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_attach_only_once() {
    let server = create_test_server();
    seed(&server).await;

    let response = server
        .post("/documents/risk-assessment")
        .json(&attach_request(3))
        .await;
    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_attach_unknown_file_rejected() {
    let server = create_test_server();

    server
        .post("/documents/risk-assessment")
        .json(&attach_request(0))
        .await
        .assert_status(StatusCode::CONFLICT);
}

// =============================================================================
// SAVE VERSION ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_end_to_end_versioning() {
    let server = create_test_server();
    seed(&server).await;

    let saved = server
        .post("/documents/versions")
        .json(&save_request("text2", 5))
        .await;
    saved.assert_status(StatusCode::CREATED);
    assert_eq!(saved_version(&saved.json()), Some(VersionName(1)));

    let unchanged = server
        .post("/documents/versions")
        .json(&save_request("text3", 5))
        .await;
    unchanged.assert_status_ok();
    assert_eq!(saved_version(&unchanged.json()), None);

    let response = server
        .get("/documents")
        .add_query_param("collectionName", NS)
        .add_query_param("fileName", FILE)
        .add_query_param("version", 1)
        .await;
    response.assert_status_ok();
    let body: ApiResponse = response.json();
    match body.data {
        Some(ResponseData::Document(view)) => {
            assert_eq!(view.content, "text2");
            assert_eq!(view.version_name, VersionName(1));
            assert_eq!(view.risk_assessment_score, Some(5));
            assert_eq!(view.financial_score, Some(5));
            assert_eq!(view.operational_xgb_score, Some(0));
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[tokio::test]
async fn test_save_without_history_not_found() {
    let server = create_test_server();

    server
        .post("/documents/versions")
        .json(&save_request("text", 1))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_save_before_attach_is_server_error() {
    let server = create_test_server();
    server
        .post("/documents/upload")
        .json(&upload_request(FILE, "text1"))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/documents/versions")
        .json(&save_request("text2", 5))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: ApiResponse = response.json();
    assert_eq!(body.status_message, "Error");
}

#[tokio::test]
async fn test_save_request_missing_score_rejected() {
    let server = create_test_server();
    seed(&server).await;

    let response = server
        .post("/documents/versions")
        .json(&serde_json::json!({
            "collectionName": NS,
            "fileName": FILE,
            "content": "text2",
            "riskAssessmentScore": 5
        }))
        .await;
    assert!(response.status_code().is_client_error());
    let body: ApiResponse = response.json();
    assert_eq!(body.status_message, "Failure");
    assert!(body.status_message_text.contains("financialScore"));
}

// =============================================================================
// READ ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_unscored_document_has_empty_leaves() {
    let server = create_test_server();
    server
        .post("/documents/upload")
        .json(&upload_request(FILE, "text1"))
        .await
        .assert_status(StatusCode::CREATED);

    let body: ApiResponse = server
        .get("/documents")
        .add_query_param("collectionName", NS)
        .add_query_param("fileName", FILE)
        .add_query_param("version", 0)
        .await
        .json();
    match body.data {
        Some(ResponseData::Document(view)) => {
            assert_eq!(view.risk_assessment_score, None);
            assert_eq!(view.regulatory_score, None);
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[tokio::test]
async fn test_latest_and_history() {
    let server = create_test_server();
    seed(&server).await;
    for (content, score) in [("text2", 1), ("text3", 2)] {
        server
            .post("/documents/versions")
            .json(&save_request(content, score))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let latest: ApiResponse = server
        .get("/documents/latest")
        .add_query_param("collectionName", NS)
        .add_query_param("fileName", FILE)
        .await
        .json();
    match latest.data {
        Some(ResponseData::Document(view)) => {
            assert_eq!(view.version_name, VersionName(2));
            assert_eq!(view.content, "text3");
        }
        other => panic!("unexpected payload: {:?}", other),
    }

    let history: ApiResponse = server
        .get("/documents/history")
        .add_query_param("collectionName", NS)
        .add_query_param("fileName", FILE)
        .await
        .json();
    match history.data {
        Some(ResponseData::History(h)) => {
            let versions: Vec<u32> = h.versions.iter().map(|v| v.version_name.value()).collect();
            assert_eq!(versions, vec![0, 1, 2]);
            assert!(h.versions.iter().all(|v| v.has_risk_assessment));
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_document_not_found() {
    let server = create_test_server();

    for path in ["/documents", "/documents/latest", "/documents/history"] {
        server
            .get(path)
            .add_query_param("collectionName", NS)
            .add_query_param("fileName", "missing.pdf")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

// =============================================================================
// DELETE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_delete_version_then_document() {
    let server = create_test_server();
    seed(&server).await;
    server
        .post("/documents/versions")
        .json(&save_request("text2", 5))
        .await
        .assert_status(StatusCode::CREATED);

    server
        .delete("/documents/version")
        .add_query_param("collectionName", NS)
        .add_query_param("fileName", FILE)
        .add_query_param("version", 1)
        .await
        .assert_status_ok();
    server
        .delete("/documents/version")
        .add_query_param("collectionName", NS)
        .add_query_param("fileName", FILE)
        .add_query_param("version", 1)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = server
        .delete("/documents")
        .add_query_param("collectionName", NS)
        .add_query_param("fileName", FILE)
        .await;
    response.assert_status_ok();
    let body: ApiResponse = response.json();
    match body.data {
        Some(ResponseData::Deleted(d)) => assert_eq!(d.deleted, 1),
        other => panic!("unexpected payload: {:?}", other),
    }
}

// =============================================================================
// MIDDLEWARE TESTS
// =============================================================================

#[tokio::test]
async fn test_rate_limit_exceeded() {
    let server = create_test_server_with(AppConfig {
        rate_limit: 1,
        ..test_config()
    });

    server.get("/health").await.assert_status_ok();
    let response = server.get("/health").await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: ApiResponse = response.json();
    assert_eq!(body.status_code, 429);
}
