//! Router builder utilities for the hosted functions

use crate::mint::{MintState, mint_payment_token, preflight};
use axum::http::{HeaderName, Method, header};
use axum::{Json, Router, routing::get, routing::post};
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};

/// CORS policy of the functions: any origin, the usual verbs, and the
/// headers the hosted client library sends
pub fn functions_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

/// Build the mint routes
///
/// - POST    /mint-payment-token - Mint a payment link
/// - OPTIONS /mint-payment-token - Preflight, 200 with no body
pub fn build_mint_routes(state: MintState) -> Router {
    Router::new()
        .route(
            "/mint-payment-token",
            post(mint_payment_token).options(preflight),
        )
        .with_state(state)
}

/// Build health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "paylink"
    }))
}
