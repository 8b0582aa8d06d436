//! HTTP-level tests driving the full router against the in-memory stores.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use fooapp_web::app::build_app;
use fooapp_web::config::{PasswordPolicy, SessionProtection, WebConfig};
use fooapp_web::db::{Collection, DocumentStore, Filter, MemoryDocumentStore, ProductRepository};
use fooapp_web::models::Product;
use fooapp_web::services::auth::AuthService;
use fooapp_web::state::AppState;

const TEST_SECRET: &str =
    "Zq8!vR2#kL5@wX9$mN3%tB7^yH1&cF4*gJ6(pD0)sA8-eU2+iO5=rT9~lK3?nM7:";
const BROWSER: &str = "Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/130.0";

struct TestApp {
    router: Router,
    store: Arc<MemoryDocumentStore>,
    policy: PasswordPolicy,
    cookie: Option<String>,
    user_agent: &'static str,
}

impl TestApp {
    fn with(protection: SessionProtection, policy: PasswordPolicy) -> Self {
        let mut config = WebConfig::in_memory(SecretString::from(TEST_SECRET));
        config.session_protection = protection;
        config.password_policy = policy;

        let store = Arc::new(MemoryDocumentStore::new());
        let state = AppState::new(config, store.clone());
        let router = build_app(state, MemoryStore::default()).unwrap();

        Self {
            router,
            store,
            policy,
            cookie: None,
            user_agent: BROWSER,
        }
    }

    fn new() -> Self {
        Self::with(SessionProtection::default(), PasswordPolicy::default())
    }

    async fn add_user(&self, username: &str, password: &str) {
        AuthService::new(self.store.as_ref(), self.policy)
            .register(username, password)
            .await
            .unwrap();
    }

    /// Replace a user's password hash with something that is not a string.
    async fn damage_password(&self, username: &str) {
        let doc = self
            .store
            .find_one(
                Collection::Users,
                Filter::Field {
                    name: "username",
                    value: username,
                },
            )
            .await
            .unwrap()
            .unwrap();
        let Value::Object(fields) = serde_json::json!({ "password": 42 }) else {
            unreachable!()
        };
        self.store
            .find_one_and_update(Collection::Users, doc.id, fields)
            .await
            .unwrap();
    }

    async fn products(&self) -> Vec<Product> {
        ProductRepository::new(self.store.as_ref())
            .list()
            .await
            .unwrap()
    }

    async fn send(&mut self, builder: axum::http::request::Builder, body: Body) -> Response<Body> {
        let mut builder = builder.header(header::USER_AGENT, self.user_agent);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let set_cookie = set_cookie.to_str().unwrap();
            let pair = set_cookie.split(';').next().unwrap().trim();
            let removed = pair.ends_with('=') || set_cookie.contains("Max-Age=0");
            self.cookie = if removed { None } else { Some(pair.to_string()) };
        }

        response
    }

    async fn get(&mut self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri), Body::empty()).await
    }

    async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> Response<Body> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.send(
            Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded"),
            Body::from(body),
        )
        .await
    }

    async fn delete(&mut self, uri: &str) -> Response<Body> {
        self.send(Request::delete(uri), Body::empty()).await
    }

    async fn login(&mut self, username: &str, password: &str) -> Response<Body> {
        self.post_form("/login/", &[("username", username), ("password", password)])
            .await
    }

    async fn logged_in_as(username: &str) -> Self {
        let mut app = Self::new();
        app.add_user(username, "s3cret").await;
        let response = app.login(username, "s3cret").await;
        assert_eq!(location(&response), Some("/products/".to_string()));
        app
    }
}

fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string())
}

async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

fn assert_redirect(response: &Response<Body>, to: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(response).as_deref(), Some(to));
}

// =============================================================================
// Public pages
// =============================================================================

#[tokio::test]
async fn test_root_redirects_to_list() {
    let mut app = TestApp::new();
    let response = app.get("/").await;
    assert_redirect(&response, "/products/");
}

#[tokio::test]
async fn test_empty_list() {
    let mut app = TestApp::new();
    let response = app.get("/products/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("No products yet."));
    assert!(body.contains("Log in"));
    assert!(!body.contains("New product"));
}

#[tokio::test]
async fn test_health_endpoints() {
    let mut app = TestApp::new();

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");

    let response = app.get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_path_renders_not_found_page() {
    let mut app = TestApp::new();
    let response = app.get("/nowhere").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_string(response).await.contains("Not found"));
}

#[tokio::test]
async fn test_paths_without_trailing_slash_redirect() {
    let mut app = TestApp::new();

    for (uri, target) in [
        ("/products", "/products/"),
        ("/login?next=/products/", "/login/?next=/products/"),
        ("/products/create", "/products/create/"),
    ] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT, "{uri}");
        assert_eq!(location(&response).as_deref(), Some(target), "{uri}");
    }

    let response = app.delete("/products/abc/delete").await;
    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(app.get("/nowhere").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_detail_with_missing_or_malformed_id() {
    let mut app = TestApp::new();

    for uri in [
        "/products/not-an-id/",
        "/products/0123456789abcdef0123456789abcdef/",
    ] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert!(body_string(response).await.contains("Not found"));
    }
}

#[tokio::test]
async fn test_security_headers_present() {
    let mut app = TestApp::new();
    let response = app.get("/products/").await;
    let headers = response.headers();
    assert_eq!(headers.get(header::X_FRAME_OPTIONS).unwrap(), "DENY");
    assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    assert!(headers.contains_key(header::CONTENT_SECURITY_POLICY));
}

// =============================================================================
// Authorization
// =============================================================================

#[tokio::test]
async fn test_anonymous_create_redirects_to_login() {
    let mut app = TestApp::new();

    let response = app.get("/products/create/").await;
    assert_redirect(&response, "/login/?next=%2Fproducts%2Fcreate%2F");

    let response = app
        .post_form(
            "/products/create/",
            &[("name", "Widget"), ("description", ""), ("price", "9.99")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).unwrap().starts_with("/login/"));
    assert!(app.products().await.is_empty());
}

#[tokio::test]
async fn test_anonymous_edit_and_delete_never_mutate() {
    let mut app = TestApp::logged_in_as("alice").await;
    app.post_form(
        "/products/create/",
        &[("name", "Widget"), ("description", ""), ("price", "9.99")],
    )
    .await;
    let id = app.products().await[0].id;
    app.get("/logout/").await;

    let response = app
        .post_form(
            &format!("/products/{id}/edit/"),
            &[("name", "Changed"), ("description", ""), ("price", "1")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        Some(format!("/login/?next=%2Fproducts%2F{id}%2Fedit%2F"))
    );

    let response = app.delete(&format!("/products/{id}/delete/")).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let products = app.products().await;
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Widget");
}

// =============================================================================
// Product lifecycle
// =============================================================================

#[tokio::test]
async fn test_create_fetch_delete_widget() {
    let mut app = TestApp::logged_in_as("alice").await;

    let response = app
        .post_form(
            "/products/create/",
            &[("name", "Widget"), ("description", ""), ("price", "9.99")],
        )
        .await;
    assert_redirect(&response, "/products/");

    let body = body_string(app.get("/products/").await).await;
    assert!(body.contains("Widget"));
    assert!(body.contains("$9.99"));
    assert!(body.contains("alice"));

    let products = app.products().await;
    assert_eq!(products.len(), 1);
    let product = &products[0];
    assert_eq!(product.name, "Widget");
    assert_eq!(product.description, "");
    assert!((product.price.amount() - 9.99).abs() < f64::EPSILON);

    let detail = app.get(&format!("/products/{}/", product.id)).await;
    assert_eq!(detail.status(), StatusCode::OK);
    assert!(body_string(detail).await.contains("Widget"));

    let response = app.delete(&format!("/products/{}/delete/", product.id)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "status": "OK" }));

    let detail = app.get(&format!("/products/{}/", product.id)).await;
    assert_eq!(detail.status(), StatusCode::NOT_FOUND);

    let response = app.delete(&format!("/products/{}/delete/", product.id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "status": "Not Found" })
    );
}

#[tokio::test]
async fn test_delete_missing_leaves_store_untouched() {
    let mut app = TestApp::logged_in_as("alice").await;
    app.post_form(
        "/products/create/",
        &[("name", "Keep"), ("description", ""), ("price", "1")],
    )
    .await;

    for uri in [
        "/products/0123456789abcdef0123456789abcdef/delete/",
        "/products/garbage/delete/",
    ] {
        let response = app.delete(uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body_json(response).await["status"], "Not Found");
    }

    assert_eq!(app.products().await.len(), 1);
}

#[tokio::test]
async fn test_invalid_create_rerenders_without_writing() {
    let mut app = TestApp::logged_in_as("alice").await;

    let response = app
        .post_form(
            "/products/create/",
            &[("name", "Widget"), ("description", "Blue"), ("price", "-1")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Number must be at least 0."));
    assert!(body.contains("value=\"-1\""));
    assert!(body.contains("Blue"));

    let response = app
        .post_form(
            "/products/create/",
            &[("name", ""), ("description", ""), ("price", "3")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("This field is required."));

    let response = app
        .post_form(
            "/products/create/",
            &[("name", "Widget"), ("description", ""), ("price", "lots")],
        )
        .await;
    assert!(body_string(response).await.contains("Not a valid float value."));

    assert!(app.products().await.is_empty());
}

#[tokio::test]
async fn test_create_form_is_empty() {
    let mut app = TestApp::logged_in_as("alice").await;
    let response = app.get("/products/create/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("New product"));
    assert!(body.contains("name=\"name\" value=\"\""));
}

#[tokio::test]
async fn test_edit_prefills_and_updates() {
    let mut app = TestApp::logged_in_as("alice").await;
    app.post_form(
        "/products/create/",
        &[("name", "Widget"), ("description", "Blue"), ("price", "9.99")],
    )
    .await;
    let id = app.products().await[0].id;

    let response = app.get(&format!("/products/{id}/edit/")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("value=\"Widget\""));
    assert!(body.contains("value=\"9.99\""));
    assert!(body.contains(">Blue</textarea>"));

    let response = app
        .post_form(
            &format!("/products/{id}/edit/"),
            &[("name", "Gadget"), ("description", ""), ("price", "0")],
        )
        .await;
    assert_redirect(&response, "/products/");

    let products = app.products().await;
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, id);
    assert_eq!(products[0].name, "Gadget");
    assert_eq!(products[0].description, "");
    assert!(products[0].price.amount().abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_invalid_edit_keeps_stored_product() {
    let mut app = TestApp::logged_in_as("alice").await;
    app.post_form(
        "/products/create/",
        &[("name", "Widget"), ("description", ""), ("price", "2")],
    )
    .await;
    let id = app.products().await[0].id;

    let long_name = "x".repeat(256);
    let response = app
        .post_form(
            &format!("/products/{id}/edit/"),
            &[("name", &long_name), ("description", ""), ("price", "2")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        body_string(response)
            .await
            .contains("Field cannot be longer than 255 characters.")
    );
    assert_eq!(app.products().await[0].name, "Widget");
}

#[tokio::test]
async fn test_edit_missing_product_is_not_found() {
    let mut app = TestApp::logged_in_as("alice").await;

    let response = app
        .get("/products/0123456789abcdef0123456789abcdef/edit/")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .post_form(
            "/products/bogus/edit/",
            &[("name", "Widget"), ("description", ""), ("price", "2")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(app.products().await.is_empty());
}

#[tokio::test]
async fn test_missing_product_page_keeps_logged_in_navigation() {
    let mut app = TestApp::logged_in_as("alice").await;

    for uri in [
        "/products/00000000-0000-4000-8000-000000000000/",
        "/products/not-an-id/edit/",
        "/nowhere",
    ] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        let body = body_string(response).await;
        assert!(body.contains("Log out"), "{uri}");
        assert!(body.contains("alice"), "{uri}");
    }
}

#[tokio::test]
async fn test_product_fields_are_escaped() {
    let mut app = TestApp::logged_in_as("alice").await;
    app.post_form(
        "/products/create/",
        &[
            ("name", "<script>alert(1)</script>"),
            ("description", ""),
            ("price", "1"),
        ],
    )
    .await;

    let body = body_string(app.get("/products/").await).await;
    assert!(!body.contains("<script>alert(1)</script>"));
    assert!(body.contains("&#60;script&#62;alert(1)&#60;/script&#62;"));
}

// =============================================================================
// Login and logout
// =============================================================================

#[tokio::test]
async fn test_login_page_renders() {
    let mut app = TestApp::new();
    let response = app.get("/login/?next=/products/create/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("name=\"username\""));
    assert!(body.contains("type=\"password\""));
    assert!(body.contains("name=\"next\""));
}

#[tokio::test]
async fn test_wrong_password_gives_generic_error() {
    let mut app = TestApp::new();
    app.add_user("alice", "s3cret").await;

    for (username, password) in [("alice", "wrong"), ("mallory", "s3cret")] {
        let response = app.login(username, password).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("Incorrect username or password."));
        assert!(!body.contains(password), "password echoed");
    }

    let response = app.get("/products/create/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_blank_login_fields_are_required() {
    let mut app = TestApp::new();
    let response = app.login("", "").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert_eq!(body.matches("This field is required.").count(), 2);
    assert!(!body.contains("Incorrect username or password."));
}

#[tokio::test]
async fn test_login_normalizes_case_by_default() {
    let mut app = TestApp::new();
    app.add_user("alice", "s3cret").await;

    let response = app.login("  ALICE ", "S3CRET").await;
    assert_redirect(&response, "/products/");

    let body = body_string(app.get("/products/").await).await;
    assert!(body.contains("alice"));
    assert!(body.contains("Log out"));
}

#[tokio::test]
async fn test_exact_password_policy_is_case_sensitive() {
    let mut app = TestApp::with(SessionProtection::Basic, PasswordPolicy::Exact);
    app.add_user("alice", "S3cret").await;

    let response = app.login("alice", "s3cret").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        body_string(response)
            .await
            .contains("Incorrect username or password.")
    );

    let response = app.login("alice", "S3cret").await;
    assert_redirect(&response, "/products/");
}

#[tokio::test]
async fn test_login_follows_safe_next_only() {
    let mut app = TestApp::new();
    app.add_user("alice", "s3cret").await;

    let response = app
        .post_form(
            "/login/",
            &[
                ("username", "alice"),
                ("password", "s3cret"),
                ("next", "/products/create/"),
            ],
        )
        .await;
    assert_redirect(&response, "/products/create/");

    app.get("/logout/").await;
    let response = app
        .post_form(
            "/login/?next=https://evil.example/",
            &[("username", "alice"), ("password", "s3cret")],
        )
        .await;
    assert_redirect(&response, "/products/");
}

#[tokio::test]
async fn test_login_page_redirects_when_logged_in() {
    let mut app = TestApp::logged_in_as("alice").await;
    let response = app.get("/login/").await;
    assert_redirect(&response, "/products/");
}

#[tokio::test]
async fn test_logout_clears_identity() {
    let mut app = TestApp::logged_in_as("alice").await;

    let response = app.get("/logout/").await;
    assert_redirect(&response, "/login/");

    let response = app.get("/products/create/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // Logging out twice is harmless.
    let response = app.get("/logout/").await;
    assert_redirect(&response, "/login/");
}

#[tokio::test]
async fn test_each_login_gets_a_new_session() {
    let mut app = TestApp::new();
    app.add_user("alice", "s3cret").await;

    app.login("alice", "s3cret").await;
    let first = app.cookie.clone();
    assert!(first.is_some());

    app.get("/logout/").await;
    app.login("alice", "s3cret").await;
    assert!(app.cookie.is_some());
    assert_ne!(app.cookie, first);
}

// =============================================================================
// Identity lifecycle
// =============================================================================

#[tokio::test]
async fn test_deleted_user_becomes_anonymous() {
    let mut app = TestApp::logged_in_as("alice").await;

    let users = app.store.find(Collection::Users).await.unwrap();
    for user in users {
        app.store
            .delete_one(Collection::Users, user.id)
            .await
            .unwrap();
    }

    let response = app.get("/products/create/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let body = body_string(app.get("/products/").await).await;
    assert!(body.contains("Log in"));
}

#[tokio::test]
async fn test_damaged_user_record_keeps_pages_working() {
    let mut app = TestApp::logged_in_as("alice").await;
    app.damage_password("alice").await;

    let response = app.get("/products/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Log out"));

    let response = app.get("/logout/").await;
    assert_redirect(&response, "/login/");
    let body = body_string(app.get("/products/").await).await;
    assert!(body.contains("Log in"));
}

#[tokio::test]
async fn test_damaged_user_record_looks_like_unknown_user_at_login() {
    let mut app = TestApp::new();
    app.add_user("alice", "s3cret").await;
    app.damage_password("alice").await;

    let damaged = app.login("alice", "s3cret").await;
    let unknown = app.login("nobody", "s3cret").await;

    assert_eq!(damaged.status(), StatusCode::OK);
    assert_eq!(unknown.status(), StatusCode::OK);
    let damaged = body_string(damaged).await;
    let unknown = body_string(unknown).await;
    assert!(damaged.contains("Incorrect username or password."));
    assert!(unknown.contains("Incorrect username or password."));
    assert_eq!(
        app.get("/products/create/").await.status(),
        StatusCode::SEE_OTHER
    );
}

#[tokio::test]
async fn test_strong_protection_drops_identity_on_new_client() {
    let mut app = TestApp::with(SessionProtection::Strong, PasswordPolicy::default());
    app.add_user("alice", "s3cret").await;
    app.login("alice", "s3cret").await;

    assert_eq!(app.get("/products/create/").await.status(), StatusCode::OK);

    app.user_agent = "curl/8.5.0";
    let response = app.get("/products/create/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // The identity is gone for the original client too.
    app.user_agent = BROWSER;
    let response = app.get("/products/create/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_basic_protection_keeps_identity_on_new_client() {
    let mut app = TestApp::new();
    app.add_user("alice", "s3cret").await;
    app.login("alice", "s3cret").await;

    app.user_agent = "curl/8.5.0";
    let response = app.get("/products/create/").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protection_off_ignores_client_changes() {
    let mut app = TestApp::with(SessionProtection::Off, PasswordPolicy::default());
    app.add_user("alice", "s3cret").await;
    app.login("alice", "s3cret").await;

    app.user_agent = "curl/8.5.0";
    assert_eq!(app.get("/products/create/").await.status(), StatusCode::OK);
}
