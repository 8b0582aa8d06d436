//! Authentication extractors.
//!
//! Both read the [`RequestContext`] placed in the request extensions by the
//! identity middleware; they never touch the session or the store.

use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};

use crate::models::{RequestContext, User};

/// Path of the login page.
pub const LOGIN_PATH: &str = "/login/";

/// Extractor that requires a logged-in user.
///
/// If nobody is logged in, redirects to the login page with the requested
/// path in `next`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.username)
/// }
/// ```
pub struct RequireAuth(pub User);

/// Error returned when authentication is required but nobody is logged in.
#[derive(Debug)]
pub struct AuthRejection {
    next: String,
}

impl AuthRejection {
    /// Where the client is sent.
    #[must_use]
    pub fn location(&self) -> String {
        let next: String = url::form_urlencoded::byte_serialize(self.next.as_bytes()).collect();
        format!("{LOGIN_PATH}?next={next}")
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        Redirect::to(&self.location()).into_response()
    }
}

fn context(parts: &Parts) -> RequestContext {
    parts
        .extensions
        .get::<RequestContext>()
        .cloned()
        .unwrap_or_default()
}

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        context(parts).user.map(Self).ok_or_else(|| AuthRejection {
            next: parts
                .uri
                .path_and_query()
                .map_or_else(|| parts.uri.path().to_owned(), ToString::to_string),
        })
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject anonymous requests.
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    /// Username for templates.
    #[must_use]
    pub fn username(&self) -> Option<String> {
        self.0.as_ref().map(|u| u.username.to_string())
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(context(parts).user))
    }
}

/// Whether `next` is a same-site path that is safe to redirect to.
#[must_use]
pub fn is_safe_redirect(next: &str) -> bool {
    next.starts_with('/')
        && !next.starts_with("//")
        && !next.contains('\\')
        && !next.chars().any(char::is_control)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_location_encodes_next() {
        let rejection = AuthRejection {
            next: "/products/abc/edit/?x=1&y=2".to_string(),
        };
        assert_eq!(
            rejection.location(),
            "/login/?next=%2Fproducts%2Fabc%2Fedit%2F%3Fx%3D1%26y%3D2"
        );
    }

    #[test]
    fn test_safe_redirects() {
        assert!(is_safe_redirect("/products/"));
        assert!(is_safe_redirect("/products/create/?a=b"));
        assert!(!is_safe_redirect("https://evil.example"));
        assert!(!is_safe_redirect("//evil.example"));
        assert!(!is_safe_redirect("/\\evil.example"));
        assert!(!is_safe_redirect(""));
        assert!(!is_safe_redirect("/x\r\nSet-Cookie: a=b"));
    }
}
