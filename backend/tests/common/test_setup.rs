use std::path::PathBuf;
use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http_body_util::BodyExt;
use photo_gateway::{
    middleware::{AccessGate, GatePolicy},
    photo_storage::mock::MockObjectStore,
    photos::{PhotoService, DEFAULT_DOWNLOAD_URL_EXPIRY_SECS, DEFAULT_UPLOAD_URL_EXPIRY_SECS},
    server,
    types::{AccessSettings, Environment, SiteDirs},
};
use tower::ServiceExt;

pub const ADMIN_PASSWORD: &str = "test-password";

/// Initialize tracing for tests
pub fn setup_test_env() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

/// Page and asset directories shipped with the crate
pub fn site_dirs() -> SiteDirs {
    SiteDirs {
        pages: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/pages")),
        public: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/public")),
    }
}

/// `Authorization` header value for the given credentials
pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Full application router over an in-memory object store
pub struct TestSetup {
    pub router: Router,
    pub store: Arc<MockObjectStore>,
}

impl TestSetup {
    /// Router with the default gate policy and [`ADMIN_PASSWORD`]
    pub fn new(store: MockObjectStore) -> Self {
        Self::with_policy(store, GatePolicy::default())
    }

    pub fn with_policy(store: MockObjectStore, policy: GatePolicy) -> Self {
        Self::build(store, Environment::Development, policy)
    }

    pub fn build(store: MockObjectStore, environment: Environment, policy: GatePolicy) -> Self {
        setup_test_env();

        let access = AccessSettings {
            policy,
            gate: policy
                .is_enabled()
                .then(|| AccessGate::new(ADMIN_PASSWORD)),
        };

        let store = Arc::new(store);
        let photo_service = Arc::new(PhotoService::new(
            store.clone(),
            DEFAULT_UPLOAD_URL_EXPIRY_SECS,
            DEFAULT_DOWNLOAD_URL_EXPIRY_SECS,
        ));

        let router = server::app(environment, &access, &site_dirs(), photo_service);

        Self { router, store }
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_raw_post_request(route, "application/json", payload.to_string())
            .await
    }

    pub async fn send_raw_post_request(
        &self,
        route: &str,
        content_type: &str,
        body: impl Into<Body>,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", content_type)
            .body(body.into())?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_get_request_with_auth(
        &self,
        route: &str,
        authorization: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .header("Authorization", authorization)
            .body(Body::empty())?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }
}

pub async fn parse_response_body(response: Response) -> serde_json::Value {
    let body = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();
    serde_json::from_slice(&body).expect("Response body is not JSON")
}

pub async fn response_text(response: Response) -> String {
    let body = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read response body")
        .to_bytes();
    String::from_utf8(body.to_vec()).expect("Response body is not UTF-8")
}
