//! HTML handlers for account management (admin only).
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/usuarios` | Account list and creation form |
//! | `POST` | `/usuarios/novo` | Create an account (multipart, optional photo) |
//! | `GET` | `/usuarios/deletar?username=U` | Delete an account |

use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Extension;
use minijinja::context;
use serde::{Deserialize, Serialize};
use stockroom_store::hash_password;
use stockroom_types::{Role, User, UserDraft};
use tracing::info;
use validator::Validate;

use crate::auth::SessionUser;
use crate::error::WebError;
use crate::forms::{MultipartForm, store_upload};
use crate::state::AppState;
use crate::templates::page_context;

/// Multipart part carrying the account photo.
const PHOTO_FIELD: &str = "photo";

/// What the account list shows of each user. The credential never
/// reaches a template.
#[derive(Debug, Serialize)]
struct AccountRow {
    username: String,
    role: Role,
    photo: Option<String>,
}

impl From<&User> for AccountRow {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role,
            photo: user.photo.clone(),
        }
    }
}

/// Query string of the delete link.
#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    /// Account to delete.
    #[serde(default, alias = "usuario")]
    pub username: String,
}

/// `GET /usuarios`.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Response, WebError> {
    render_users(&state, &user, None).await
}

/// `POST /usuarios/novo`.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let form = MultipartForm::read(multipart, PHOTO_FIELD).await?;
    match create_checked(&state, form).await {
        Ok(username) => {
            info!(username = %username, created_by = %user.username, "account created from page");
            Ok(Redirect::to("/usuarios").into_response())
        }
        Err(e) if e.is_user_error() => render_users(&state, &user, Some(&e)).await,
        Err(e) => Err(e),
    }
}

async fn create_checked(state: &AppState, form: MultipartForm) -> Result<String, WebError> {
    let role = form.text("role");
    let draft = UserDraft {
        username: form.text("username").trim().to_owned(),
        password: form.text("password"),
        role: if role.trim().is_empty() {
            Role::default()
        } else {
            role.parse().map_err(WebError::InvalidInput)?
        },
    };
    draft.validate()?;

    if state.users.lock().await.find(&draft.username).is_some() {
        return Err(WebError::Conflict(format!(
            "user {} already exists",
            draft.username
        )));
    }

    let cost = state.config.bcrypt_cost;
    let password = draft.password.clone();
    let password_hash =
        tokio::task::spawn_blocking(move || hash_password(&password, cost)).await??;
    let photo = store_upload(&state.photos, form.upload).await;

    let account = User {
        username: draft.username.clone(),
        password_hash,
        role: draft.role,
        photo: photo.clone(),
    };
    if let Err(e) = state.users.lock().await.insert(account) {
        if let Some(name) = photo {
            state.photos.delete(&name);
        }
        return Err(e.into());
    }
    Ok(draft.username)
}

/// `GET /usuarios/deletar?username=U`.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<UsernameQuery>,
) -> Result<Response, WebError> {
    if query.username == user.username {
        let e = WebError::Conflict("you cannot delete your own account".to_owned());
        return render_users(&state, &user, Some(&e)).await;
    }

    let result = state.users.lock().await.delete(&query.username);
    match result {
        Ok(removed) => {
            if let Some(photo) = removed.photo {
                state.photos.delete(&photo);
            }
            info!(username = %removed.username, deleted_by = %user.username, "account deleted from page");
            Ok(Redirect::to("/usuarios").into_response())
        }
        Err(e) => {
            let e = WebError::from(e);
            if e.is_user_error() {
                render_users(&state, &user, Some(&e)).await
            } else {
                Err(e)
            }
        }
    }
}

async fn render_users(
    state: &AppState,
    user: &SessionUser,
    error: Option<&WebError>,
) -> Result<Response, WebError> {
    let accounts: Vec<AccountRow> = state
        .users
        .lock()
        .await
        .list()
        .iter()
        .map(AccountRow::from)
        .collect();
    let html = state.templates.render(
        "users.html",
        context! {
            accounts => accounts,
            error => error.map(WebError::message),
            ..page_context(&state.config.title, Some(user))
        },
    )?;
    let status = error.map_or(axum::http::StatusCode::OK, WebError::status);
    Ok((status, html).into_response())
}
