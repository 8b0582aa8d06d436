//! Per-request identity resolution.
//!
//! Runs inside the session layer. Reads the logged-in username from the
//! session, applies session protection, reloads the user from the store and
//! inserts a [`RequestContext`] into the request extensions.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{HeaderMap, header::USER_AGENT, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use tower_sessions::Session;

use fooapp_core::Username;

use crate::config::SessionProtection;
use crate::db::{RepositoryError, UserRepository};
use crate::error::{AnonymousNotFound, AppError, NotFoundTemplate};
use crate::models::{RequestContext, session_keys};
use crate::state::AppState;

/// Hash of the client's address and user agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFingerprint(pub String);

impl ClientFingerprint {
    /// Fingerprint a request from its headers and peer address.
    ///
    /// The first `X-Forwarded-For` entry wins over the socket address.
    #[must_use]
    pub fn from_request(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        let addr = forwarded.map_or_else(
            || peer.map(|p| p.ip().to_string()).unwrap_or_default(),
            str::to_owned,
        );

        let agent = headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        let digest = Sha256::digest(format!("{addr}|{agent}").as_bytes());
        Self(hex::encode(digest))
    }

    fn from_parts(parts: &Parts) -> Self {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Self::from_request(&parts.headers, peer)
    }
}

impl<S> FromRequestParts<S> for ClientFingerprint
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

/// Resolve the current identity and expose it as [`RequestContext`].
pub async fn identity_middleware(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let fingerprint = ClientFingerprint::from_parts(&parts);

    let context = match resolve_identity(&state, &session, &fingerprint).await {
        Ok(context) => context,
        Err(e) => return e.into_response(),
    };

    let username = context.user.as_ref().map(|user| {
        tracing::debug!(username = %user.username, fresh = context.fresh, "Identity resolved");
        user.username.to_string()
    });

    parts.extensions.insert(context);
    let response = next.run(Request::from_parts(parts, body)).await;

    match username {
        Some(username) if response.extensions().get::<AnonymousNotFound>().is_some() => {
            NotFoundTemplate {
                current_user: Some(username),
            }
            .into_response_with_status()
        }
        _ => response,
    }
}

async fn resolve_identity(
    state: &AppState,
    session: &Session,
    fingerprint: &ClientFingerprint,
) -> Result<RequestContext, AppError> {
    let Some(stored_username) = session.get::<String>(session_keys::USERNAME).await? else {
        return Ok(RequestContext::anonymous());
    };

    let mut fresh = session
        .get::<bool>(session_keys::FRESH)
        .await?
        .unwrap_or(false);

    let protection = state.config().session_protection;
    if protection != SessionProtection::Off {
        let recorded = session.get::<String>(session_keys::FINGERPRINT).await?;
        if recorded.as_deref() != Some(fingerprint.0.as_str()) {
            if protection == SessionProtection::Strong {
                tracing::warn!(
                    username = %stored_username,
                    "Client fingerprint changed, dropping session identity"
                );
                clear_identity(session).await?;
                return Ok(RequestContext::anonymous());
            }
            if fresh {
                tracing::info!(
                    username = %stored_username,
                    "Client fingerprint changed, session marked non-fresh"
                );
                session.insert(session_keys::FRESH, false).await?;
            }
            fresh = false;
        }
    }

    let Ok(username) = Username::parse(&stored_username) else {
        clear_identity(session).await?;
        return Ok(RequestContext::anonymous());
    };

    match UserRepository::new(state.store())
        .get_by_username(&username)
        .await
    {
        Ok(Some(user)) => Ok(RequestContext {
            user: Some(user),
            fresh,
        }),
        Ok(None) => {
            tracing::info!(username = %username, "Session user no longer exists");
            clear_identity(session).await?;
            Ok(RequestContext::anonymous())
        }
        Err(RepositoryError::DataCorruption(reason)) => {
            tracing::warn!(username = %username, %reason, "Session user record is unusable");
            clear_identity(session).await?;
            Ok(RequestContext::anonymous())
        }
        Err(e) => Err(e.into()),
    }
}

/// Record a successful login in the session.
///
/// The session id is rotated first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn establish_session(
    session: &Session,
    username: &Username,
    fingerprint: &ClientFingerprint,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::USERNAME, username.as_str())
        .await?;
    session
        .insert(session_keys::FINGERPRINT, &fingerprint.0)
        .await?;
    session.insert(session_keys::FRESH, true).await
}

/// Remove the logged-in identity from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_identity(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<serde_json::Value>(session_keys::USERNAME)
        .await?;
    session
        .remove::<serde_json::Value>(session_keys::FINGERPRINT)
        .await?;
    session
        .remove::<serde_json::Value>(session_keys::FRESH)
        .await?;
    Ok(())
}
