//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                        - Redirect to the product list
//! GET    /health                  - Liveness check
//! GET    /health/ready            - Readiness check (store ping)
//!
//! # Products
//! GET    /products/               - Product listing
//! GET    /products/{id}/          - Product detail
//! GET    /products/create/        - New product form (auth)
//! POST   /products/create/        - Create product (auth)
//! GET    /products/{id}/edit/     - Edit form (auth)
//! POST   /products/{id}/edit/     - Update product (auth)
//! DELETE /products/{id}/delete/   - Delete product, JSON response (auth)
//!
//! # Auth
//! GET    /login/                  - Login page
//! POST   /login/                  - Login action
//! GET    /logout/                 - Logout action
//! ```
//!
//! Every page path ends in a slash. Requests for the same path without it
//! get a 308 redirect to the slash form.

pub mod auth;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get},
};

use crate::error::NotFoundTemplate;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Create the product routes.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products/", get(products::list))
        .route(
            "/products/create/",
            get(products::create_page).post(products::create),
        )
        .route("/products/{id}/", get(products::detail))
        .route(
            "/products/{id}/edit/",
            get(products::edit_page).post(products::edit),
        )
        .route("/products/{id}/delete/", delete(products::delete))
}

/// Create the auth routes.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login/", get(auth::login_page).post(auth::login))
        .route("/logout/", get(auth::logout))
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::root))
        .merge(product_routes())
        .merge(auth_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Fallback for unknown paths.
pub async fn not_found(user: CurrentUser, uri: Uri) -> Response {
    if let Some(path) = with_trailing_slash(uri.path()) {
        let target = match uri.query() {
            Some(query) => format!("{path}?{query}"),
            None => path,
        };
        return Redirect::permanent(&target).into_response();
    }

    NotFoundTemplate {
        current_user: user.username(),
    }
    .into_response_with_status()
}

/// The slash-terminated route for `path`, if it names one.
fn with_trailing_slash(path: &str) -> Option<String> {
    let trimmed = path.strip_prefix('/')?;
    if trimmed.is_empty() || trimmed.ends_with('/') {
        return None;
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    let known = match segments.as_slice() {
        ["products" | "login" | "logout"] => true,
        ["products", id] | ["products", id, "edit" | "delete"] => !id.is_empty(),
        _ => false,
    };

    known.then(|| format!("{path}/"))
}
