//! Router assembly.

use axum::{Router, middleware::from_fn, middleware::from_fn_with_state, routing::get};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::SessionStore;

use crate::middleware::{
    SessionKeyError, create_session_layer, identity_middleware, security_headers_middleware,
};
use crate::routes;
use crate::state::AppState;

/// Static assets, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/web/static";

/// Build the complete application router.
///
/// Page routes run inside the session and identity layers; static files do
/// not. Sentry layers are outermost so they see every request.
///
/// # Errors
///
/// Returns `SessionKeyError` if the session secret cannot sign cookies.
pub fn build_app<Store>(state: AppState, session_store: Store) -> Result<Router, SessionKeyError>
where
    Store: SessionStore + Clone,
{
    let session_layer = create_session_layer(session_store, state.config())?;

    Ok(Router::new()
        .route("/health", get(routes::health))
        .route("/health/ready", get(routes::readiness))
        .merge(routes::routes())
        .fallback(routes::not_found)
        .layer(from_fn_with_state(state.clone(), identity_middleware))
        .layer(session_layer)
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()))
}
