//! # Middleware Module
//!
//! Rate limiting for the Riskvault HTTP API.
//!
//! The limit comes from `AppConfig::rate_limit` (`RISKVAULT_RATE_LIMIT`);
//! 0 disables it.

use super::types::ApiResponse;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Default rate limit: 100 requests per second.
const DEFAULT_RPS: NonZeroU32 = match NonZeroU32::new(100) {
    Some(rps) => rps,
    None => NonZeroU32::MIN,
};

// =============================================================================
// RATE LIMITER
// =============================================================================

/// Global rate limiter type alias.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a new global rate limiter. Zero falls back to the default.
pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(DEFAULT_RPS);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// Rate limiting middleware.
///
/// Returns 429 in the usual response envelope when the limit is exceeded.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if limiter.check().is_ok() {
        return next.run(request).await;
    }
    tracing::warn!(path = %request.uri().path(), "rate limit exceeded");
    let status = StatusCode::TOO_MANY_REQUESTS;
    (
        status,
        Json(ApiResponse::new(status.as_u16(), "Too many requests.", None)),
    )
        .into_response()
}

// =============================================================================
// TESTS
// =============================================================================
