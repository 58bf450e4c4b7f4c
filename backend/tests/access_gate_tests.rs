mod common;

use common::*;

use http::{header::WWW_AUTHENTICATE, StatusCode};
use photo_gateway::{middleware::GatePolicy, photo_storage::mock::MockObjectStore};
use serde_json::json;

fn assert_challenged(response: &axum::response::Response) {
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let challenge = response
        .headers()
        .get(WWW_AUTHENTICATE)
        .expect("401 without WWW-Authenticate")
        .to_str()
        .unwrap();
    assert!(challenge.starts_with("Basic realm="));
}

#[tokio::test]
async fn test_default_policy_guards_listing_and_admin() {
    let setup = TestSetup::new(MockObjectStore::new());

    for route in ["/api/list-photos", "/admin"] {
        let response = setup
            .send_get_request(route)
            .await
            .expect("Failed to send request");
        assert_challenged(&response);
    }
}

#[tokio::test]
async fn test_rejected_request_never_reaches_the_store() {
    let setup = TestSetup::new(MockObjectStore::new().with_object("photos/1_a.jpg", 1, None, &[]));

    let response = setup
        .send_get_request("/api/list-photos")
        .await
        .expect("Failed to send request");

    assert_challenged(&response);
    assert_eq!(
        parse_response_body(response).await,
        json!({ "error": "Authentication required" })
    );
    assert!(setup.store.presign_calls().is_empty());
}

#[tokio::test]
async fn test_admin_page_unreachable_through_static_fallback() {
    let setup = TestSetup::new(MockObjectStore::new());

    let spellings = [
        "/admin.html",
        "//admin.html",
        "/%61dmin.html",
        "/./admin.html",
        "/admin%2Ehtml",
        "/admin/",
        "/ADMIN.html",
    ];

    for route in spellings {
        let response = setup
            .send_get_request(route)
            .await
            .expect("Failed to send request");

        assert_ne!(response.status(), StatusCode::OK, "route {route}");
        assert!(
            !response_text(response).await.contains("<title>Photo Admin</title>"),
            "admin page served at {route}"
        );
    }
}

#[tokio::test]
async fn test_valid_credentials_pass() {
    let setup = TestSetup::new(MockObjectStore::new().with_object("photos/1_a.jpg", 1, None, &[]));
    let auth = basic_auth("admin", ADMIN_PASSWORD);

    let response = setup
        .send_get_request_with_auth("/api/list-photos", &auth)
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await.as_array().unwrap().len(), 1);

    let response = setup
        .send_get_request_with_auth("/admin", &auth)
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_wrong_credentials_are_rejected() {
    let setup = TestSetup::new(MockObjectStore::new());

    let attempts = [
        basic_auth("admin", "wrong"),
        basic_auth("root", ADMIN_PASSWORD),
        basic_auth("admin", ""),
        "Bearer some-token".to_string(),
        "Basic not-base64!".to_string(),
    ];

    for authorization in &attempts {
        let response = setup
            .send_get_request_with_auth("/api/list-photos", authorization)
            .await
            .expect("Failed to send request");
        assert_challenged(&response);
    }
}

#[tokio::test]
async fn test_admin_policy_leaves_listing_open() {
    let setup = TestSetup::with_policy(MockObjectStore::new(), GatePolicy::Admin);

    let response = setup
        .send_get_request("/api/list-photos")
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = setup
        .send_get_request("/admin")
        .await
        .expect("Failed to send request");
    assert_challenged(&response);
}

#[tokio::test]
async fn test_off_policy_opens_everything() {
    let setup = TestSetup::with_policy(MockObjectStore::new(), GatePolicy::Off);

    for route in ["/api/list-photos", "/admin"] {
        let response = setup
            .send_get_request(route)
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::OK, "route {route}");
    }
}

#[tokio::test]
async fn test_public_routes_need_no_credentials() {
    let setup = TestSetup::new(MockObjectStore::new());

    for route in ["/", "/health"] {
        let response = setup
            .send_get_request(route)
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), StatusCode::OK, "route {route}");
    }
}
