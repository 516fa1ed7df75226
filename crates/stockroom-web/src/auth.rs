//! Session-backed authentication.
//!
//! A signed-in session carries a [`SessionUser`] under [`SESSION_USER_KEY`].
//! Two middleware functions gate the routes:
//!
//! - [`require_auth`] redirects requests without a signed-in session to
//!   `/login`. It reloads the account on every request: a session whose
//!   account was deleted is flushed, and the role placed in the
//!   [`SessionUser`] request extension is the account's current one.
//! - [`require_role`] rejects with 401 when the session role is not the
//!   one the route group demands. It must run inside [`require_auth`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/login` | Sign-in form |
//! | `POST` | `/login` | Check credentials, start the session |
//! | `GET` | `/logout` | End the session |

use std::sync::Arc;

use axum::Form;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use chrono::Utc;
use minijinja::context;
use serde::{Deserialize, Serialize};
use stockroom_store::{Verification, hash_password, verify_password};
use stockroom_types::Role;
use tower_sessions::Session;
use tracing::{info, warn};

use crate::error::WebError;
use crate::state::AppState;
use crate::templates::page_context;

/// Session key holding the [`SessionUser`].
pub const SESSION_USER_KEY: &str = "user";

/// Message shown for any credential mismatch.
const INVALID_CREDENTIALS: &str = "Invalid username or password.";

/// Identity stored in a signed-in session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    /// Set once the credentials were checked.
    pub authenticated: bool,
    /// Account name.
    pub username: String,
    /// Account role; refreshed from the account store by [`require_auth`].
    pub role: Role,
}

impl SessionUser {
    /// An authenticated identity.
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            authenticated: true,
            username: username.into(),
            role,
        }
    }
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Redirect to `/login` unless the session is signed in to an account
/// that still exists.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match session.get::<SessionUser>(SESSION_USER_KEY).await {
        Ok(Some(user)) if user.authenticated => user,
        Ok(_) => return Redirect::to("/login").into_response(),
        Err(e) => return WebError::from(e).into_response(),
    };

    let role = state.users.lock().await.find(&user.username).map(|a| a.role);
    let Some(role) = role else {
        warn!(username = %user.username, "account no longer exists; ending session");
        if let Err(e) = session.flush().await {
            return WebError::from(e).into_response();
        }
        return Redirect::to("/login").into_response();
    };

    request.extensions_mut().insert(SessionUser { role, ..user });
    next.run(request).await
}

/// Reject with 401 unless the signed-in role is exactly `required`.
pub async fn require_role(State(required): State<Role>, request: Request, next: Next) -> Response {
    match request.extensions().get::<SessionUser>() {
        Some(user) if user.role == required => next.run(request).await,
        Some(user) => {
            warn!(
                username = %user.username,
                role = %user.role,
                %required,
                path = %request.uri().path(),
                "role rejected"
            );
            WebError::Unauthorized(format!("this action requires the {required} role"))
                .into_response()
        }
        None => WebError::Unauthorized("not signed in".to_owned()).into_response(),
    }
}

// ---------------------------------------------------------------------------
// GET/POST /login, GET /logout
// ---------------------------------------------------------------------------

/// Submitted sign-in form.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Account name.
    #[serde(default, alias = "usuario")]
    pub username: String,
    /// Plain password.
    #[serde(default, alias = "senha")]
    pub password: String,
}

/// Render the sign-in form.
pub async fn login_page(State(state): State<Arc<AppState>>) -> Result<Response, WebError> {
    render_login(&state, "", None)
}

/// Check credentials and start a session.
///
/// Wrong credentials and locked-out usernames re-render the form with an
/// error and leave the session untouched.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, WebError> {
    let username = form.username.trim().to_owned();
    let now = Utc::now();

    if let Err(lockout) = state.throttle.lock().await.check(&username, now) {
        warn!(username = %username, until = %lockout.until, "login attempt while locked out");
        let message = format!(
            "Too many failed attempts. Try again after {} UTC.",
            lockout.until.format("%H:%M")
        );
        return render_login(&state, &username, Some(&message));
    }

    let account = state.users.lock().await.find(&username).cloned();
    let verdict = match account.clone() {
        Some(user) => {
            let password = form.password.clone();
            tokio::task::spawn_blocking(move || verify_password(&user, &password)).await??
        }
        None => Verification::Rejected,
    };

    let Some(account) = account.filter(|_| verdict.is_accepted()) else {
        let lockout = state.throttle.lock().await.record_failure(&username, now);
        match lockout {
            Some(lockout) => {
                warn!(username = %username, until = %lockout.until, "username locked out");
            }
            None => warn!(username = %username, "login failed"),
        }
        return render_login(&state, &username, Some(INVALID_CREDENTIALS));
    };

    state.throttle.lock().await.record_success(&username);

    if verdict == Verification::AcceptedLegacy {
        upgrade_legacy_password(&state, &username, form.password).await;
    }

    session.cycle_id().await?;
    session
        .insert(SESSION_USER_KEY, SessionUser::new(&account.username, account.role))
        .await?;
    info!(username = %account.username, role = %account.role, "login succeeded");

    Ok(Redirect::to("/").into_response())
}

/// End the session.
pub async fn logout(session: Session) -> Result<Redirect, WebError> {
    if let Some(user) = session.get::<SessionUser>(SESSION_USER_KEY).await? {
        info!(username = %user.username, "logout");
    }
    session.flush().await?;
    Ok(Redirect::to("/login"))
}

/// Replace a plaintext credential with a bcrypt hash. Failure only logs;
/// the user is already signed in.
async fn upgrade_legacy_password(state: &AppState, username: &str, password: String) {
    let cost = state.config.bcrypt_cost;
    let hash = match tokio::task::spawn_blocking(move || hash_password(&password, cost)).await {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => {
            warn!(username, error = %e, "failed to hash legacy password");
            return;
        }
        Err(e) => {
            warn!(username, error = %e, "hashing task failed");
            return;
        }
    };

    if let Err(e) = state.users.lock().await.set_password_hash(username, hash) {
        warn!(username, error = %e, "failed to store upgraded password hash");
    } else {
        info!(username, "legacy plaintext password upgraded to bcrypt");
    }
}

fn render_login(state: &AppState, username: &str, error: Option<&str>) -> Result<Response, WebError> {
    let html = state.templates.render(
        "login.html",
        context! {
            username => username,
            error => error,
            ..page_context(&state.config.title, None)
        },
    )?;
    Ok(html.into_response())
}
