//! HTML handlers for shelf management.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/estantes` | Shelves with their item counts |
//! | `POST` | `/estantes/nova` | Add a shelf (`name`) |
//! | `POST` | `/estantes/renomear` | Rename a shelf and its items (`id`, `name`) |
//! | `POST` | `/estantes/deletar` | Delete an unused shelf (`id`) |

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use minijinja::context;
use serde::{Deserialize, Serialize};
use stockroom_store::Inventory;
use stockroom_types::ShelfId;
use tracing::info;

use crate::auth::SessionUser;
use crate::error::WebError;
use crate::forms::parse_shelf_id;
use crate::state::AppState;
use crate::templates::page_context;

/// A shelf with the number of items stored on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShelfSummary {
    /// Shelf id.
    pub id: ShelfId,
    /// Shelf name.
    pub name: String,
    /// Items whose location names this shelf.
    pub items: usize,
}

/// Summaries of every shelf, in registration order.
pub fn summarize(inventory: &Inventory) -> Vec<ShelfSummary> {
    inventory
        .shelves()
        .iter()
        .map(|shelf| ShelfSummary {
            id: shelf.id,
            name: shelf.name.clone(),
            items: inventory.shelf_item_count(&shelf.name),
        })
        .collect()
}

/// Submitted shelf form. Fields absent from a given form stay empty.
#[derive(Debug, Default, Deserialize)]
pub struct ShelfForm {
    /// Shelf id (rename, delete).
    #[serde(default)]
    pub id: String,
    /// Shelf name (add, rename).
    #[serde(default, alias = "nome")]
    pub name: String,
}

/// `GET /estantes`.
pub async fn list_shelves(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Response, WebError> {
    render_shelves(&state, &user, None).await
}

/// `POST /estantes/nova`.
pub async fn add_shelf(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Form(form): Form<ShelfForm>,
) -> Result<Response, WebError> {
    let result = state.catalog.lock().await.add_shelf(&form.name);
    finish(&state, &user, result.map(drop).map_err(WebError::from)).await
}

/// `POST /estantes/renomear`.
pub async fn rename_shelf(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Form(form): Form<ShelfForm>,
) -> Result<Response, WebError> {
    let result = match parse_shelf_id(&form.id) {
        Ok(id) => {
            let renamed = state.catalog.lock().await.rename_shelf(id, &form.name);
            if let Ok(items) = renamed {
                info!(id = %id, username = %user.username, items, "shelf renamed from page");
            }
            renamed.map(drop).map_err(WebError::from)
        }
        Err(e) => Err(e),
    };
    finish(&state, &user, result).await
}

/// `POST /estantes/deletar`.
pub async fn delete_shelf(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Form(form): Form<ShelfForm>,
) -> Result<Response, WebError> {
    let result = match parse_shelf_id(&form.id) {
        Ok(id) => state
            .catalog
            .lock()
            .await
            .delete_shelf(id)
            .map(drop)
            .map_err(WebError::from),
        Err(e) => Err(e),
    };
    finish(&state, &user, result).await
}

/// Redirect back to the listing on success; re-render it with the message
/// on a user error.
async fn finish(
    state: &AppState,
    user: &SessionUser,
    result: Result<(), WebError>,
) -> Result<Response, WebError> {
    match result {
        Ok(()) => Ok(Redirect::to("/estantes").into_response()),
        Err(e) if e.is_user_error() => render_shelves(state, user, Some(&e)).await,
        Err(e) => Err(e),
    }
}

async fn render_shelves(
    state: &AppState,
    user: &SessionUser,
    error: Option<&WebError>,
) -> Result<Response, WebError> {
    let shelves = summarize(state.catalog.lock().await.inventory());
    let html = state.templates.render(
        "shelves.html",
        context! {
            shelves => shelves,
            error => error.map(WebError::message),
            ..page_context(&state.config.title, Some(user))
        },
    )?;
    let status = error.map_or(axum::http::StatusCode::OK, WebError::status);
    Ok((status, html).into_response())
}
