//! HTTP tests against a running storefront.
//!
//! These tests require:
//! - The storefront running (`cargo run -p gremco-storefront`)
//! - `STOREFRONT_BASE_URL` if it is not on `http://localhost:3000`
//!
//! Run with: `cargo test -p gremco-integration-tests -- --ignored`

use reqwest::StatusCode;

use gremco_integration_tests::{http_client, storefront_base_url};

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_health_endpoints() {
    let client = http_client();
    let base_url = storefront_base_url();

    let resp = client
        .get(format!("{base_url}/health"))
        .send()
        .await
        .expect("Failed to reach /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/health/ready"))
        .send()
        .await
        .expect("Failed to reach /health/ready");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_home_page_sets_security_headers() {
    let client = http_client();
    let resp = client
        .get(format!("{}/", storefront_base_url()))
        .send()
        .await
        .expect("Failed to get home page");

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_request_id_is_echoed() {
    let client = http_client();
    let resp = client
        .get(format!("{}/health", storefront_base_url()))
        .header("x-request-id", "integration-test-42")
        .send()
        .await
        .expect("Failed to get /health");

    assert_eq!(resp.headers()["x-request-id"], "integration-test-42");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_admin_requires_login() {
    let client = http_client();
    let resp = client
        .get(format!("{}/admin", storefront_base_url()))
        .send()
        .await
        .expect("Failed to get /admin");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(resp.headers()["location"], "/auth/login");
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_bad_login_redirects_with_error() {
    let client = http_client();
    let resp = client
        .post(format!("{}/auth/login", storefront_base_url()))
        .form(&[("email", "nobody@example.org"), ("password", "not-the-password")])
        .send()
        .await
        .expect("Failed to post login");

    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers()["location"],
        "/auth/login?error=invalid_credentials"
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server"]
async fn test_unknown_product_is_not_found() {
    let client = http_client();
    let resp = client
        .get(format!(
            "{}/products/00000000-0000-4000-8000-000000000000",
            storefront_base_url()
        ))
        .send()
        .await
        .expect("Failed to get product");

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
