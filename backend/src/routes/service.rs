//! Service-level endpoints: health and API documentation

use std::sync::Arc;

use aide::{
    axum::{routing::get as api_get, ApiRouter, IntoApiResponse},
    openapi::OpenApi,
    scalar::Scalar,
};
use axum::{http::StatusCode, response::IntoResponse, routing::get, Extension, Json};
use schemars::JsonSchema;
use serde::Serialize;

use crate::{middleware::GatePolicy, types::Environment};

#[derive(Debug, Serialize, JsonSchema)]
pub struct HealthResponse {
    status: String,
    /// Current version of the application
    semver: String,
    /// Commit hash of the current build (if available)
    rev: Option<String>,
    /// Active access gate policy
    access_gate: String,
}

pub fn handler() -> ApiRouter {
    let scalar = Scalar::new("/openapi.json").with_title("Photo Gateway Docs");

    ApiRouter::new()
        .api_route("/health", api_get(health))
        .route("/docs", scalar.axum_route())
        .route("/openapi.json", get(openapi_schema))
}

/// Health check endpoint
///
/// Reports version information and the access gate policy in force.
/// Never touches the object store.
async fn health(Extension(policy): Extension<GatePolicy>) -> impl IntoApiResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        semver: env!("CARGO_PKG_VERSION").to_string(),
        rev: option_env!("GIT_REV").map(ToString::to_string),
        access_gate: policy.to_string(),
    })
}

#[allow(clippy::unused_async)]
async fn openapi_schema(
    Extension(environment): Extension<Environment>,
    Extension(openapi): Extension<Arc<OpenApi>>,
) -> impl IntoResponse {
    if !environment.show_api_docs() {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(openapi.as_ref()).into_response()
}
