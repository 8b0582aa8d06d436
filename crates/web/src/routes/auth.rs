//! Authentication route handlers.
//!
//! Login against pre-provisioned accounts and logout. There is no
//! self-service registration; accounts are created with `fooapp-cli`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::forms::{BoundForm, FormErrors, LoginForm, RawForm};
use crate::middleware::{
    ClientFingerprint, CurrentUser, LOGIN_PATH, clear_identity, establish_session,
    is_safe_redirect,
};
use crate::routes::products::LIST_PATH;
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Message shown for every failed login.
pub const LOGIN_FAILED_MESSAGE: &str = "Incorrect username or password.";

/// Query parameters accepted by the login page.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "user/login.html")]
pub struct LoginTemplate {
    pub current_user: Option<String>,
    pub form: BoundForm,
    pub error: Option<String>,
    pub next: Option<String>,
}

fn safe_next(candidate: Option<&str>) -> Option<String> {
    candidate.filter(|n| is_safe_redirect(n)).map(str::to_owned)
}

/// Display the login page.
pub async fn login_page(user: CurrentUser, Query(query): Query<LoginQuery>) -> Response {
    if user.0.is_some() {
        return Redirect::to(LIST_PATH).into_response();
    }

    LoginTemplate {
        current_user: None,
        form: LoginForm::bind(&RawForm::new(), &FormErrors::new()),
        error: None,
        next: safe_next(query.next.as_deref()),
    }
    .into_response()
}

/// Check credentials and start a session.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    fingerprint: ClientFingerprint,
    user: CurrentUser,
    Query(query): Query<LoginQuery>,
    Form(raw): Form<RawForm>,
) -> Result<Response> {
    if user.0.is_some() {
        return Ok(Redirect::to(LIST_PATH).into_response());
    }

    let next = safe_next(raw.get("next").map(String::as_str).or(query.next.as_deref()));

    let credentials = match LoginForm::validate(&raw) {
        Ok(credentials) => credentials,
        Err(errors) => {
            return Ok(LoginTemplate {
                current_user: None,
                form: LoginForm::bind(&raw, &errors),
                error: None,
                next,
            }
            .into_response());
        }
    };

    match state
        .auth()
        .login(&credentials.username, &credentials.password)
        .await
    {
        Ok(user) => {
            establish_session(&session, &user.username, &fingerprint).await?;
            set_sentry_user(user.username.as_str());
            tracing::info!(username = %user.username, "Login succeeded");

            Ok(Redirect::to(next.as_deref().unwrap_or(LIST_PATH)).into_response())
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!(username = %credentials.username.trim(), "Login failed");

            Ok(LoginTemplate {
                current_user: None,
                form: LoginForm::bind(&raw, &FormErrors::new()),
                error: Some(LOGIN_FAILED_MESSAGE.to_string()),
                next,
            }
            .into_response())
        }
        Err(e) => Err(AppError::Auth(e)),
    }
}

/// Forget the logged-in user and return to the login page.
pub async fn logout(session: Session, user: CurrentUser) -> Result<Redirect> {
    clear_identity(&session).await?;
    session.cycle_id().await?;

    if let Some(user) = user.0 {
        tracing::info!(username = %user.username, "Logged out");
    }
    clear_sentry_user();

    Ok(Redirect::to(LOGIN_PATH))
}
