//! # Riskvault HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `POST|DELETE /collections?collectionName=` - Create / drop a collection
//! - `GET /collections` - List collections
//! - `POST /documents/upload` - Upload a file as version 0
//! - `POST /documents/risk-assessment` - Attach the risk assessment of version 0
//! - `POST /documents/versions` - Save a new version
//! - `GET /documents` - Get one version (lowest when `version` is omitted)
//! - `GET /documents/latest` - Get the latest version
//! - `GET /documents/history` - List all versions
//! - `DELETE /documents/version` - Delete one version
//! - `DELETE /documents` - Delete every version of a file
//!
//! ## Security Configuration
//!
//! - `cors_origins` (`RISKVAULT_CORS_ORIGINS`): comma-separated origins, or
//!   "*" for all (default: localhost only)
//! - `rate_limit` (`RISKVAULT_RATE_LIMIT`): requests per second (0 disables)
//! - `max_upload_bytes` (`RISKVAULT_MAX_UPLOAD_BYTES`): request body limit

mod handlers;
mod middleware;
mod types;

pub use handlers::{ApiResult, error_status};
pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::{
    ApiResponse, AttachRequest, CollectionData, CollectionQuery, CollectionsData, DeletedData,
    DocumentQuery, DocumentRef, HealthData, HistoryData, ResponseData, RiskScores,
    SaveVersionRequest, UploadRequest, VersionQuery,
};

use crate::config::AppConfig;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{delete, get, post},
};
use riskvault_core::{Vault, VaultError};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Base64 inflates uploads by 4/3; leave room for the JSON around it.
const BODY_LIMIT_HEADROOM: usize = 64 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
///
/// The vault synchronizes internally, so handlers share it without a lock.
#[derive(Clone)]
pub struct AppState {
    pub vault: Arc<Vault>,
    /// Largest accepted decoded upload.
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Create new app state around a vault.
    #[must_use]
    pub fn new(vault: Vault, max_upload_bytes: usize) -> Self {
        Self {
            vault: Arc::new(vault),
            max_upload_bytes,
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer.
///
/// - `Some("*")`: allows all origins
/// - `None`: localhost only
/// - Otherwise: comma-separated list of allowed origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: allowing ALL origins, do not use this in production");
            CorsLayer::permissive()
        }
        Some(list) => {
            let allowed: Vec<HeaderValue> = list
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: allowing origin {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed.is_empty() {
                tracing::warn!("CORS: no valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                with_methods(CorsLayer::new().allow_origin(allowed))
            }
        }
        None => {
            tracing::info!("CORS: no origins configured, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    with_methods(CorsLayer::new().allow_origin(origins))
}

fn with_methods(layer: CorsLayer) -> CorsLayer {
    layer
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
pub fn create_router(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/collections",
            get(handlers::list_collections_handler)
                .post(handlers::create_collection_handler)
                .delete(handlers::drop_collection_handler),
        )
        .route("/documents/upload", post(handlers::upload_handler))
        .route("/documents/risk-assessment", post(handlers::attach_handler))
        .route("/documents/versions", post(handlers::save_version_handler))
        .route(
            "/documents",
            get(handlers::get_document_handler).delete(handlers::delete_document_handler),
        )
        .route("/documents/latest", get(handlers::get_latest_handler))
        .route("/documents/history", get(handlers::history_handler))
        .route("/documents/version", delete(handlers::delete_version_handler));

    if config.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", config.rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(config.rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    let body_limit = config
        .max_upload_bytes
        .saturating_div(3)
        .saturating_mul(4)
        .saturating_add(BODY_LIMIT_HEADROOM);

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors_layer(config.cors_origins.as_deref()))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server and serve until Ctrl+C.
pub async fn run_server(config: &AppConfig, vault: Vault) -> Result<(), VaultError> {
    let addr = config.bind_addr();
    let state = AppState::new(vault, config.max_upload_bytes);
    let router = create_router(state, config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| VaultError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Riskvault HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| VaultError::Io(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
