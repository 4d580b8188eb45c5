//! Router tests against the in-memory store and session store.

#![allow(clippy::unwrap_used)]

use axum::{
    Router,
    body::Body,
    http::{
        Request, Response, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
};
use tower::ServiceExt;
use tower_sessions::MemoryStore as SessionMemoryStore;

use gremco_core::{CategoryId, Email, Price};

use crate::config::StorefrontConfig;
use crate::db::{CategoryRepository, DocumentStore, ProductRepository, UserRepository};
use crate::models::{NewCategory, NewProduct, NewUser, User, UserPatch};
use crate::services::auth::hash_password;
use crate::state::AppState;

const SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";
const ADMIN_PASSWORD: &str = "mostrador-2024";

fn config(extra: &[(&str, &str)]) -> StorefrontConfig {
    StorefrontConfig::from_lookup(|key| match key {
        "STOREFRONT_BASE_URL" => Some("http://localhost:3000".to_owned()),
        "STOREFRONT_SESSION_SECRET" => Some(SECRET.to_owned()),
        other => extra
            .iter()
            .find(|(k, _)| *k == other)
            .map(|(_, v)| (*v).to_owned()),
    })
    .unwrap()
}

fn test_app_with(extra: &[(&str, &str)]) -> (Router, DocumentStore) {
    let store = DocumentStore::memory();
    let state = AppState::new(config(extra), store.clone()).unwrap();
    (super::app(state, SessionMemoryStore::default()), store)
}

fn test_app() -> (Router, DocumentStore) {
    test_app_with(&[])
}

async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

/// `name=value` part of the session cookie set by a response.
fn session_cookie(response: &Response<Body>) -> String {
    let header = response
        .headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    header.split(';').next().unwrap().to_owned()
}

async fn seed_user(store: &DocumentStore, email: &str, is_admin: bool) -> User {
    UserRepository::new(store)
        .create(&NewUser {
            name: "Marta Gil".to_owned(),
            email: Email::parse(email).unwrap(),
            password_hash: Some(hash_password(ADMIN_PASSWORD).unwrap()),
            shipping_address: "Av. Central 100".to_owned(),
            is_admin,
        })
        .await
        .unwrap()
}

async fn login(app: &Router, email: &str) -> String {
    let response = send(
        app,
        post_form(
            "/auth/login",
            &format!("email={}&password={ADMIN_PASSWORD}", urlencoding::encode(email)),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    session_cookie(&response)
}

async fn seed_catalog(store: &DocumentStore) {
    let category = CategoryRepository::new(store)
        .create(&NewCategory::new("Muebles"))
        .await
        .unwrap();
    for (name, cents) in [("Mesa de roble", 12_050), ("Silla plegable", 2_500)] {
        ProductRepository::new(store)
            .create(&NewProduct {
                name: name.to_owned(),
                description: None,
                price: Price::from_cents(cents),
                stock: 4,
                image_url: None,
                category_id: category.id,
            })
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_health_endpoints() {
    let (app, _) = test_app();

    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");

    let response = send(&app, get("/health/ready", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let (app, _) = test_app();
    let response = send(&app, get("/health", None)).await;

    let headers = response.headers();
    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert!(headers.get("x-request-id").is_some());
}

#[tokio::test]
async fn test_home_filters_catalog_by_query() {
    let (app, store) = test_app();
    seed_catalog(&store).await;

    let body = body_text(send(&app, get("/", None)).await).await;
    assert!(body.contains("Mesa de roble"));
    assert!(body.contains("Silla plegable"));

    let body = body_text(send(&app, get("/?q=ROBLE", None)).await).await;
    assert!(body.contains("Mesa de roble"));
    assert!(!body.contains("Silla plegable"));
}

#[tokio::test]
async fn test_home_filters_by_category() {
    let (app, store) = test_app();
    seed_catalog(&store).await;

    let body = body_text(send(&app, get("/?category=99", None)).await).await;
    assert!(!body.contains("Mesa de roble"));

    // A blank category means all categories.
    let body = body_text(send(&app, get("/?category=", None)).await).await;
    assert!(body.contains("Mesa de roble"));
}

#[tokio::test]
async fn test_product_detail() {
    let (app, store) = test_app();
    seed_catalog(&store).await;
    let product = ProductRepository::new(&store).list().await.unwrap().remove(0);

    let response = send(&app, get(&format!("/products/{}", product.key), None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Mesa de roble"));
    assert!(body.contains("$120.50"));
    assert!(body.contains("Muebles"));

    let response = send(&app, get("/products/not-a-key", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let unknown = gremco_core::DocumentKey::generate();
    let response = send(&app, get(&format!("/products/{unknown}"), None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_content_pages_and_fallback() {
    let (app, _) = test_app();

    let response = send(&app, get("/pages/faq", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Preguntas frecuentes"));

    let response = send(&app, get("/pages/missing", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get("/no/such/route", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_requires_login() {
    let (app, _) = test_app();
    let response = send(&app, get("/admin/products", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_admin_rejects_customers() {
    let (app, store) = test_app();
    seed_user(&store, "cliente@example.org", false).await;
    let cookie = login(&app, "cliente@example.org").await;

    let response = send(&app, get("/admin", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_lands_admin_on_dashboard() {
    let (app, store) = test_app();
    seed_user(&store, "admin@example.org", true).await;

    let response = send(
        &app,
        post_form(
            "/auth/login",
            &format!("email=ADMIN%40example.org&password={ADMIN_PASSWORD}"),
            None,
        ),
    )
    .await;
    assert_eq!(location(&response), "/admin");
    let cookie = session_cookie(&response);

    let response = send(&app, get("/admin", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_failure_redirects_with_code() {
    let (app, store) = test_app();
    seed_user(&store, "admin@example.org", true).await;

    let response = send(
        &app,
        post_form("/auth/login", "email=admin%40example.org&password=wrong-pass", None),
    )
    .await;
    assert_eq!(location(&response), "/auth/login?error=invalid_credentials");

    let response = send(
        &app,
        post_form("/auth/login", "email=nobody%40example.org&password=wrong-pass", None),
    )
    .await;
    assert_eq!(location(&response), "/auth/login?error=invalid_credentials");
}

#[tokio::test]
async fn test_register_signs_in_customer() {
    let (app, store) = test_app();

    let response = send(
        &app,
        post_form(
            "/auth/register",
            "name=Luis+Pe%C3%B1a&email=luis%40example.org&password=secreto-123&password_confirm=secreto-123&shipping_address=Calle+9",
            None,
        ),
    )
    .await;
    assert_eq!(location(&response), "/?success=registered");
    let cookie = session_cookie(&response);

    let user = UserRepository::new(&store)
        .get_by_email(&Email::parse("luis@example.org").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert!(!user.is_admin);
    assert_ne!(user.password_hash.as_deref(), Some("secreto-123"));

    let body = body_text(send(&app, get("/", Some(&cookie))).await).await;
    assert!(body.contains("Luis Peña"));
}

#[tokio::test]
async fn test_register_rejects_mismatched_passwords() {
    let (app, store) = test_app();
    let response = send(
        &app,
        post_form(
            "/auth/register",
            "name=Luis&email=luis%40example.org&password=secreto-123&password_confirm=secreto-124",
            None,
        ),
    )
    .await;
    assert_eq!(location(&response), "/auth/register?error=password_mismatch");
    assert!(UserRepository::new(&store).list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_logout_ends_session() {
    let (app, store) = test_app();
    seed_user(&store, "admin@example.org", true).await;
    let cookie = login(&app, "admin@example.org").await;

    let response = send(&app, post_form("/auth/logout", "", Some(&cookie))).await;
    assert_eq!(location(&response), "/?success=logged_out");

    let response = send(&app, get("/admin", Some(&cookie))).await;
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_admin_product_crud() {
    let (app, store) = test_app();
    seed_user(&store, "admin@example.org", true).await;
    let cookie = login(&app, "admin@example.org").await;

    let response = send(
        &app,
        post_form(
            "/admin/products",
            "name=L%C3%A1mpara&description=&price=%2445.00&stock=2&image_url=&category_id=1",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(location(&response), "/admin/products?success=product_created");

    let products = ProductRepository::new(&store).list().await.unwrap();
    assert_eq!(products.len(), 1);
    let product = &products[0];
    assert_eq!(product.id.as_i32(), 1);
    assert_eq!(product.category_id, CategoryId::new(1));

    let response = send(
        &app,
        post_form(
            &format!("/admin/products/{}", product.key),
            "name=L%C3%A1mpara&description=De+pie&price=40&stock=0&image_url=&category_id=1",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(location(&response), "/admin/products?success=product_updated");
    let updated = ProductRepository::new(&store).get(product.key).await.unwrap().unwrap();
    assert_eq!(updated.description.as_deref(), Some("De pie"));
    assert_eq!(updated.stock, 0);
    assert_eq!(updated.added_on, product.added_on);

    let body = body_text(send(&app, get("/admin/products?q=de+pie", Some(&cookie))).await).await;
    assert!(body.contains("Lámpara"));
    let body = body_text(send(&app, get("/admin/products?q=sof%C3%A1", Some(&cookie))).await).await;
    assert!(!body.contains("Lámpara"));

    let response = send(
        &app,
        post_form(&format!("/admin/products/{}/delete", product.key), "", Some(&cookie)),
    )
    .await;
    assert_eq!(location(&response), "/admin/products?success=product_deleted");
    assert!(ProductRepository::new(&store).list().await.unwrap().is_empty());

    let response = send(
        &app,
        post_form(&format!("/admin/products/{}/delete", product.key), "", Some(&cookie)),
    )
    .await;
    assert_eq!(location(&response), "/admin/products?error=not_found");
}

#[tokio::test]
async fn test_admin_product_validation() {
    let (app, store) = test_app();
    seed_user(&store, "admin@example.org", true).await;
    let cookie = login(&app, "admin@example.org").await;

    let response = send(
        &app,
        post_form(
            "/admin/products",
            "name=Sof%C3%A1&price=-3&stock=1&category_id=1",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(location(&response), "/admin/products/new?error=invalid_price");
    assert!(ProductRepository::new(&store).list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_category_create_trims_name() {
    let (app, store) = test_app();
    seed_user(&store, "admin@example.org", true).await;
    let cookie = login(&app, "admin@example.org").await;

    let response = send(&app, post_form("/admin/categories", "name=++Jard%C3%ADn++", Some(&cookie))).await;
    assert_eq!(location(&response), "/admin/categories?success=category_created");

    let categories = CategoryRepository::new(&store).list().await.unwrap();
    assert_eq!(categories[0].name, "Jardín");

    let response = send(&app, post_form("/admin/categories", "name=+++", Some(&cookie))).await;
    assert_eq!(location(&response), "/admin/categories/new?error=missing_name");
}

#[tokio::test]
async fn test_admin_user_edit_keeps_password_when_blank() {
    let (app, store) = test_app();
    let admin = seed_user(&store, "admin@example.org", true).await;
    let customer = seed_user(&store, "cliente@example.org", false).await;
    let cookie = login(&app, "admin@example.org").await;

    let response = send(
        &app,
        post_form(
            &format!("/admin/users/{}", customer.key),
            "name=Marta+G.&email=cliente%40example.org&password=&shipping_address=Nueva+1",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(
        location(&response),
        format!("/admin/users/{}?success=user_updated", customer.key)
    );

    let updated = UserRepository::new(&store).get(customer.key).await.unwrap().unwrap();
    assert_eq!(updated.name, "Marta G.");
    assert_eq!(updated.shipping_address, "Nueva 1");
    assert_eq!(updated.password_hash, customer.password_hash);
    assert!(!updated.is_admin);

    // The detail page never shows the hash.
    let body = body_text(send(&app, get(&format!("/admin/users/{}", customer.key), Some(&cookie))).await).await;
    assert!(body.contains("Marta G."));
    assert!(!body.contains("$argon2"));

    let response = send(
        &app,
        post_form(&format!("/admin/users/{}/delete", admin.key), "", Some(&cookie)),
    )
    .await;
    assert_eq!(location(&response), "/admin/users?error=self_delete");
}

#[tokio::test]
async fn test_admin_user_create_rejects_taken_email() {
    let (app, store) = test_app();
    seed_user(&store, "admin@example.org", true).await;
    let cookie = login(&app, "admin@example.org").await;

    let response = send(
        &app,
        post_form(
            "/admin/users",
            "name=Otra&email=Admin%40Example.org&password=otra-clave-1&shipping_address=",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(location(&response), "/admin/users/new?error=email_taken");
    assert_eq!(UserRepository::new(&store).list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_oauth_unknown_or_disabled_provider_is_not_found() {
    let (app, _) = test_app();
    let response = send(&app, get("/auth/oauth/myspace", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, get("/auth/oauth/google", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_oauth_start_and_forged_callback() {
    let (app, _) = test_app_with(&[
        ("GITHUB_CLIENT_ID", "gh-client"),
        ("GITHUB_CLIENT_SECRET", "9f8Kc2Lm4Qx7Rt1Wz5Hb3Nd6Vy0Pj"),
    ]);

    let response = send(&app, get("/auth/oauth/github", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("https://github.com/login/oauth/authorize?"));
    let cookie = session_cookie(&response);

    let response = send(
        &app,
        get("/auth/oauth/github/callback?code=abc&state=forged", Some(&cookie)),
    )
    .await;
    assert_eq!(location(&response), "/auth/login?error=oauth_state");

    let response = send(&app, get("/auth/oauth/github/callback?error=access_denied", None)).await;
    assert_eq!(location(&response), "/auth/login?error=oauth_denied");
}

#[tokio::test]
async fn test_category_filter_marks_selected_option() {
    let (app, store) = test_app();
    seed_catalog(&store).await;

    let body = body_text(send(&app, get("/?category=1", None)).await).await;
    assert!(body.contains(r#"<option value="1" selected>Muebles</option>"#));
    assert!(body.contains("Mesa de roble"));
}

#[tokio::test]
async fn test_admin_product_edit_form_renders_in_admin_layout() {
    let (app, store) = test_app();
    seed_catalog(&store).await;
    seed_user(&store, "admin@example.org", true).await;
    let cookie = login(&app, "admin@example.org").await;
    let product = ProductRepository::new(&store).list().await.unwrap().remove(0);

    let response = send(
        &app,
        get(&format!("/admin/products/{}/edit", product.key), Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(r#"class="admin-nav""#));
    assert!(body.contains(r#"<option value="1" selected>Muebles</option>"#));
    assert!(body.contains("Gremco"));
}

#[tokio::test]
async fn test_demoted_admin_loses_admin_access() {
    let (app, store) = test_app();
    let admin = seed_user(&store, "admin@example.org", true).await;
    let cookie = login(&app, "admin@example.org").await;

    let response = send(&app, get("/admin/users", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);

    UserRepository::new(&store)
        .update(
            admin.key,
            &UserPatch {
                is_admin: Some(false),
                ..UserPatch::default()
            },
        )
        .await
        .unwrap();

    let response = send(&app, get("/admin/users", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Still signed in as a customer.
    let response = send(&app, get("/account", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_deleted_admin_session_is_dropped() {
    let (app, store) = test_app();
    let admin = seed_user(&store, "admin@example.org", true).await;
    let cookie = login(&app, "admin@example.org").await;

    UserRepository::new(&store).delete(admin.key).await.unwrap();

    let response = send(&app, get("/admin", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = send(&app, get("/account", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");
}

#[tokio::test]
async fn test_account_requires_login() {
    let (app, _) = test_app();

    let response = send(&app, get("/account", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/auth/login");

    let response = send(&app, get("/api/account", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_account_shows_signed_in_customer() {
    let (app, store) = test_app();
    seed_user(&store, "cliente@example.org", false).await;
    let cookie = login(&app, "cliente@example.org").await;

    let response = send(&app, get("/account", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("cliente@example.org"));
    assert!(body.contains("Av. Central 100"));

    let response = send(&app, get("/api/account", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["email"], "cliente@example.org");
    assert_eq!(json["is_admin"], false);
    assert_eq!(json["has_password"], true);
    assert!(!body.contains("$argon2"));
}
