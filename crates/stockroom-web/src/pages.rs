//! HTML handlers for the item listing and item forms.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`/`POST` | `/` | Paginated, filtered listing (`q`, `page`) |
//! | `GET`/`POST` | `/novo` | New item form / create |
//! | `GET`/`POST` | `/editar?id=N` | Edit form / update |
//! | `GET` | `/deletar?id=N` | Delete, then back to the listing |
//!
//! Form handlers re-render the form with the error message on validation
//! and conflict errors. Storage errors fail the request.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use minijinja::context;
use serde::Deserialize;
use stockroom_types::{ItemDraft, ItemId};
use tracing::info;
use validator::Validate;

use crate::auth::SessionUser;
use crate::error::WebError;
use crate::forms::{IdQuery, MultipartForm, parse_item_id, store_upload};
use crate::state::AppState;
use crate::templates::page_context;

/// Multipart part carrying the item photo.
const PHOTO_FIELD: &str = "photo";

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Filter and page of the listing, from the query string or a form.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Substring matched against name and description.
    #[serde(default)]
    pub q: String,
    /// 1-based page number.
    pub page: Option<usize>,
}

/// `GET /`.
pub async fn index(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Response, WebError> {
    let Query(query) = query?;
    render_index(&state, &user, &query).await
}

/// `POST /` (the search form).
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Form(query): Form<ListQuery>,
) -> Result<Response, WebError> {
    render_index(&state, &user, &query).await
}

async fn render_index(
    state: &AppState,
    user: &SessionUser,
    query: &ListQuery,
) -> Result<Response, WebError> {
    let page = state.catalog.lock().await.list(
        &query.q,
        query.page.unwrap_or(1),
        state.config.page_size,
    );
    let html = state.templates.render(
        "index.html",
        context! {
            page => page,
            q => query.q,
            ..page_context(&state.config.title, Some(user))
        },
    )?;
    Ok(html.into_response())
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// `GET /novo`.
pub async fn new_item_page(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
) -> Result<Response, WebError> {
    render_form(&state, &user, &ItemForm::create(ItemDraft::default()), None).await
}

/// `POST /novo`.
pub async fn create_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let form = MultipartForm::read(multipart, PHOTO_FIELD).await?;
    let draft = form.item_draft().normalized();
    let view = ItemForm::create(draft.clone());

    let result = create_checked(&state, &draft, form).await;
    match result {
        Ok(id) => {
            info!(id = %id, username = %user.username, "item created from form");
            Ok(Redirect::to("/").into_response())
        }
        Err(e) if e.is_user_error() => render_form(&state, &user, &view, Some(&e)).await,
        Err(e) => Err(e),
    }
}

/// Validate, check the location, store the photo and insert, all under
/// the catalog lock.
async fn create_checked(
    state: &AppState,
    draft: &ItemDraft,
    form: MultipartForm,
) -> Result<ItemId, WebError> {
    draft.validate()?;
    let location = draft.location();

    let mut catalog = state.catalog.lock().await;
    if !catalog.is_location_free(&location, None) {
        return Err(WebError::Conflict(format!(
            "location {location} is already occupied"
        )));
    }

    let photo = store_upload(&state.photos, form.upload).await;
    match catalog.create(draft, photo.clone()) {
        Ok(item) => Ok(item.id),
        Err(e) => {
            if let Some(name) = photo {
                state.photos.delete(&name);
            }
            Err(e.into())
        }
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// `GET /editar?id=N`.
pub async fn edit_item_page(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<IdQuery>,
) -> Result<Response, WebError> {
    let id = parse_item_id(&query.id)?;
    let item = state
        .catalog
        .lock()
        .await
        .get(id)
        .cloned()
        .ok_or_else(|| WebError::NotFound(format!("item {id} not found")))?;

    let view = ItemForm::edit(id, ItemDraft::from_item(&item), item.photo);
    render_form(&state, &user, &view, None).await
}

/// `POST /editar?id=N`.
pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<IdQuery>,
    multipart: Multipart,
) -> Result<Response, WebError> {
    let id = parse_item_id(&query.id)?;
    let form = MultipartForm::read(multipart, PHOTO_FIELD).await?;
    let draft = form.item_draft().normalized();

    match update_checked(&state, id, &draft, form).await {
        Ok(()) => {
            info!(id = %id, username = %user.username, "item updated from form");
            Ok(Redirect::to("/").into_response())
        }
        Err(e) if e.is_user_error() => {
            let photo = state.catalog.lock().await.get(id).and_then(|i| i.photo.clone());
            let view = ItemForm::edit(id, draft, photo);
            render_form(&state, &user, &view, Some(&e)).await
        }
        Err(e) => Err(e),
    }
}

async fn update_checked(
    state: &AppState,
    id: ItemId,
    draft: &ItemDraft,
    form: MultipartForm,
) -> Result<(), WebError> {
    draft.validate()?;
    let location = draft.location();

    let mut catalog = state.catalog.lock().await;
    if catalog.get(id).is_none() {
        return Err(WebError::NotFound(format!("item {id} not found")));
    }
    if !catalog.is_location_free(&location, Some(id)) {
        return Err(WebError::Conflict(format!(
            "location {location} is already occupied"
        )));
    }

    let photo = store_upload(&state.photos, form.upload).await;
    match catalog.update(id, draft, photo.clone()) {
        Ok(updated) => {
            if let Some(old) = updated.replaced_photo {
                state.photos.delete(&old);
            }
            Ok(())
        }
        Err(e) => {
            if let Some(name) = photo {
                state.photos.delete(&name);
            }
            Err(e.into())
        }
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// `GET /deletar?id=N`. Unknown ids are ignored.
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<SessionUser>,
    Query(query): Query<IdQuery>,
) -> Result<Redirect, WebError> {
    let id = parse_item_id(&query.id)?;
    let removed = state.catalog.lock().await.delete(id)?;
    if let Some(item) = removed {
        if let Some(photo) = item.photo {
            state.photos.delete(&photo);
        }
        info!(id = %id, username = %user.username, "item deleted from page");
    }
    Ok(Redirect::to("/"))
}

// ---------------------------------------------------------------------------
// Form rendering
// ---------------------------------------------------------------------------

/// What the item form shows.
#[derive(Debug)]
struct ItemForm {
    item_id: Option<ItemId>,
    draft: ItemDraft,
    photo: Option<String>,
}

impl ItemForm {
    const fn create(draft: ItemDraft) -> Self {
        Self {
            item_id: None,
            draft,
            photo: None,
        }
    }

    const fn edit(id: ItemId, draft: ItemDraft, photo: Option<String>) -> Self {
        Self {
            item_id: Some(id),
            draft,
            photo,
        }
    }

    fn action(&self) -> String {
        self.item_id
            .map_or_else(|| "/novo".to_owned(), |id| format!("/editar?id={id}"))
    }
}

async fn render_form(
    state: &AppState,
    user: &SessionUser,
    form: &ItemForm,
    error: Option<&WebError>,
) -> Result<Response, WebError> {
    let shelves = state.catalog.lock().await.shelves().to_vec();
    let html = state.templates.render(
        "item_form.html",
        context! {
            item_id => form.item_id,
            action => form.action(),
            draft => form.draft,
            photo => form.photo,
            shelves => shelves,
            preview_width => state.config.preview_width,
            error => error.map(WebError::message),
            ..page_context(&state.config.title, Some(user))
        },
    )?;
    let status = error.map_or(axum::http::StatusCode::OK, WebError::status);
    Ok((status, html).into_response())
}
