//! Request parsing shared by the page and API handlers.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::Multipart;
use serde::Deserialize;
use stockroom_store::PhotoStore;
use stockroom_types::{ItemDraft, ItemId, ShelfId};
use tracing::warn;

use crate::error::WebError;

/// Query string carrying an item id (`?id=N`).
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    /// Raw id; parsed with [`parse_item_id`].
    #[serde(default)]
    pub id: String,
}

/// Parse an item id from a path or query value.
pub fn parse_item_id(raw: &str) -> Result<ItemId, WebError> {
    raw.parse()
        .map_err(|e| WebError::InvalidInput(format!("invalid item id {raw:?}: {e}")))
}

/// Parse a shelf id from a form value.
pub fn parse_shelf_id(raw: &str) -> Result<ShelfId, WebError> {
    raw.parse()
        .map_err(|e| WebError::InvalidInput(format!("invalid shelf id {raw:?}: {e}")))
}

/// A file part of a multipart body.
#[derive(Debug)]
pub struct Upload {
    /// Client-side file name, if sent.
    pub file_name: Option<String>,
    /// File content.
    pub bytes: Bytes,
}

/// A decoded multipart body: text fields plus at most one file.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: BTreeMap<String, String>,
    /// The file part, absent when no file was chosen.
    pub upload: Option<Upload>,
}

impl MultipartForm {
    /// Read every part of `multipart`. The part named `file_field` is kept
    /// as the upload; an empty file part counts as no file.
    pub async fn read(mut multipart: Multipart, file_field: &str) -> Result<Self, WebError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| WebError::InvalidInput(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            if name == file_field {
                let file_name = field.file_name().map(ToOwned::to_owned);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| WebError::InvalidInput(e.body_text()))?;
                if !bytes.is_empty() {
                    form.upload = Some(Upload { file_name, bytes });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| WebError::InvalidInput(e.body_text()))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    /// A text field, or the empty string when absent.
    pub fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    /// The item fields of the form.
    pub fn item_draft(&self) -> ItemDraft {
        ItemDraft {
            name: self.text("name"),
            description: self.text("description"),
            shelf: self.text("shelf"),
            rack: self.text("rack"),
            compartment: self.text("compartment"),
        }
    }
}

/// Store an uploaded photo on the blocking pool.
///
/// A photo that cannot be stored is logged and dropped; the record it
/// belongs to is saved without it.
pub async fn store_upload(photos: &PhotoStore, upload: Option<Upload>) -> Option<String> {
    let upload = upload?;
    let photos = photos.clone();
    let result = tokio::task::spawn_blocking(move || {
        photos.save(&upload.bytes, upload.file_name.as_deref())
    })
    .await;

    match result {
        Ok(Ok(name)) => Some(name),
        Ok(Err(e)) => {
            warn!(error = %e, "photo rejected; saving record without it");
            None
        }
        Err(e) => {
            warn!(error = %e, "photo task failed; saving record without it");
            None
        }
    }
}
