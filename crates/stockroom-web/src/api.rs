//! JSON REST endpoints over the catalog.
//!
//! All routes sit behind the same session gate as the pages; mutating
//! routes also require the `admin` role.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/products` | Page of items (`q`, `page`, `page_size`) |
//! | `GET` | `/product/{id}` | Single item |
//! | `POST` | `/product` | Create an item (201) |
//! | `PUT` | `/product/{id}` | Replace an item |
//! | `DELETE` | `/product/{id}` | Delete an item (204, also for unknown ids) |
//! | `GET` | `/cabinets` | Shelves with item counts |
//!
//! Bodies and query strings that fail to parse are answered with 400 and
//! the usual `{error, status}` JSON, not axum's plain-text rejection.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use stockroom_types::{Item, ItemDraft, Page};
use tracing::info;
use validator::Validate;

use crate::auth::SessionUser;
use crate::error::WebError;
use crate::forms::parse_item_id;
use crate::shelves::{ShelfSummary, summarize};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    /// Substring filter over name and description.
    #[serde(default)]
    pub q: String,
    /// 1-based page (default 1).
    pub page: Option<usize>,
    /// Items per page (default from config).
    pub page_size: Option<usize>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /products`.
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ProductsQuery>, QueryRejection>,
) -> Result<Json<Page<Item>>, WebError> {
    let Query(query) = query?;
    let page = state.catalog.lock().await.list(
        &query.q,
        query.page.unwrap_or(1),
        query.page_size.unwrap_or(state.config.page_size),
    );
    Ok(Json(page))
}

/// `GET /product/{id}`.
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<Item>, WebError> {
    let id = parse_item_id(&raw_id)?;
    state
        .catalog
        .lock()
        .await
        .get(id)
        .cloned()
        .map(Json)
        .ok_or_else(|| WebError::NotFound(format!("item {id} not found")))
}

/// `POST /product`.
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    payload: Result<Json<ItemDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Item>), WebError> {
    let Json(draft) = payload?;
    let draft = draft.normalized();
    draft.validate()?;
    let item = state.catalog.lock().await.create(&draft, None)?;
    info!(id = %item.id, username = %user.username, "item created via API");
    Ok((StatusCode::CREATED, Json(item)))
}

/// `PUT /product/{id}`. The stored photo is kept.
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(raw_id): Path<String>,
    payload: Result<Json<ItemDraft>, JsonRejection>,
) -> Result<Json<Item>, WebError> {
    let id = parse_item_id(&raw_id)?;
    let Json(draft) = payload?;
    let draft = draft.normalized();
    draft.validate()?;
    let updated = state.catalog.lock().await.update(id, &draft, None)?;
    info!(id = %id, username = %user.username, "item updated via API");
    Ok(Json(updated.item))
}

/// `DELETE /product/{id}`.
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, WebError> {
    let id = parse_item_id(&raw_id)?;
    let removed = state.catalog.lock().await.delete(id)?;
    if let Some(item) = removed {
        if let Some(photo) = item.photo {
            state.photos.delete(&photo);
        }
        info!(id = %id, username = %user.username, "item deleted via API");
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /cabinets`.
pub async fn list_cabinets(State(state): State<Arc<AppState>>) -> Json<Vec<ShelfSummary>> {
    Json(summarize(state.catalog.lock().await.inventory()))
}
