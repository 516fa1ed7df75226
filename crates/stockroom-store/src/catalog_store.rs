//! The catalog aggregate bound to its data file.
//!
//! [`CatalogStore`] owns an [`Inventory`] and the path it persists to.
//! Every mutation runs against the in-memory aggregate and then rewrites
//! the whole file. If the write fails the in-memory change is rolled
//! back, so memory and disk never disagree about what was committed.

use std::path::{Path, PathBuf};

use stockroom_types::{Item, ItemDraft, ItemId, Location, Page, Shelf, ShelfId};
use tracing::{debug, info};

use crate::catalog::{Inventory, UpdatedItem};
use crate::error::StoreError;
use crate::persist::{read_json_or_default, write_json_atomic};

/// File-backed catalog.
#[derive(Debug)]
pub struct CatalogStore {
    path: PathBuf,
    inventory: Inventory,
}

impl CatalogStore {
    /// Load the catalog from `path`. A missing file yields an empty
    /// catalog; the file is created on the first mutation.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let inventory: Inventory = read_json_or_default(&path)?;
        info!(
            path = %path.display(),
            items = inventory.items().len(),
            shelves = inventory.shelves().len(),
            "catalog loaded"
        );
        Ok(Self { path, inventory })
    }

    /// The data file this store writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-only view of the aggregate.
    pub const fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Write the whole aggregate to disk.
    pub fn save(&self) -> Result<(), StoreError> {
        write_json_atomic(&self.path, &self.inventory)?;
        debug!(path = %self.path.display(), "catalog saved");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// One page of items matching `filter`.
    pub fn list(&self, filter: &str, page: usize, page_size: usize) -> Page<Item> {
        self.inventory.list(filter, page, page_size)
    }

    /// Look up an item.
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.inventory.get(id)
    }

    /// Whether `location` is free for an item other than `except`.
    pub fn is_location_free(&self, location: &Location, except: Option<ItemId>) -> bool {
        self.inventory.is_location_free(location, except)
    }

    /// All shelves.
    pub fn shelves(&self) -> &[Shelf] {
        self.inventory.shelves()
    }

    // -----------------------------------------------------------------------
    // Mutations (each persists)
    // -----------------------------------------------------------------------

    /// Create an item and persist.
    pub fn create(&mut self, draft: &ItemDraft, photo: Option<String>) -> Result<Item, StoreError> {
        let item = self.commit(|inv| inv.create(draft, photo))?;
        info!(id = %item.id, name = %item.name, location = %item.location, "item created");
        Ok(item)
    }

    /// Replace an item and persist.
    pub fn update(
        &mut self,
        id: ItemId,
        draft: &ItemDraft,
        new_photo: Option<String>,
    ) -> Result<UpdatedItem, StoreError> {
        let updated = self.commit(|inv| inv.update(id, draft, new_photo))?;
        info!(id = %id, location = %updated.item.location, "item updated");
        Ok(updated)
    }

    /// Remove an item if present, then persist regardless.
    pub fn delete(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let removed = self.commit(|inv| Ok(inv.delete(id)))?;
        if removed.is_some() {
            info!(id = %id, "item deleted");
        } else {
            debug!(id = %id, "delete of unknown item ignored");
        }
        Ok(removed)
    }

    /// Register a shelf and persist.
    pub fn add_shelf(&mut self, name: &str) -> Result<Shelf, StoreError> {
        let shelf = self.commit(|inv| inv.add_shelf(name))?;
        info!(id = %shelf.id, name = %shelf.name, "shelf added");
        Ok(shelf)
    }

    /// Rename a shelf, cascade to items and persist.
    pub fn rename_shelf(&mut self, id: ShelfId, new_name: &str) -> Result<usize, StoreError> {
        let rewritten = self.commit(|inv| inv.rename_shelf(id, new_name))?;
        info!(id = %id, new_name, items_rewritten = rewritten, "shelf renamed");
        Ok(rewritten)
    }

    /// Remove an unused shelf and persist.
    pub fn delete_shelf(&mut self, id: ShelfId) -> Result<Shelf, StoreError> {
        let shelf = self.commit(|inv| inv.delete_shelf(id))?;
        info!(id = %id, name = %shelf.name, "shelf deleted");
        Ok(shelf)
    }

    /// Apply `change` and persist, restoring the previous aggregate if
    /// either step fails.
    fn commit<T, F>(&mut self, change: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Inventory) -> Result<T, StoreError>,
    {
        let before = self.inventory.clone();
        let outcome = change(&mut self.inventory).and_then(|value| {
            self.save()?;
            Ok(value)
        });
        if outcome.is_err() {
            self.inventory = before;
        }
        outcome
    }
}
