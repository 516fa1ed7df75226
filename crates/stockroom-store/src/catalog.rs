//! The inventory aggregate: items, shelves and identifier counters.
//!
//! [`Inventory`] holds the rules of the catalog and nothing else. It does
//! no I/O; [`CatalogStore`](crate::catalog_store::CatalogStore) wraps it
//! with a file and persists after each mutation.
//!
//! Invariants maintained by every mutation:
//!
//! - At most one item occupies a (shelf, rack, compartment) location.
//! - Item and shelf identifiers are never reused; the counters only grow.
//! - Every shelf name an item refers to is registered as a shelf, and
//!   shelf names are unique.

use serde::{Deserialize, Serialize};
use stockroom_types::{Item, ItemDraft, ItemId, Location, Page, Shelf, ShelfId};

use crate::error::StoreError;

/// The catalog aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredInventory")]
pub struct Inventory {
    items: Vec<Item>,
    shelves: Vec<Shelf>,
    next_item_id: ItemId,
    next_shelf_id: ShelfId,
}

/// Result of replacing an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedItem {
    /// The item as now stored.
    pub item: Item,
    /// Photo file that was replaced by a new one, if any.
    pub replaced_photo: Option<String>,
}

impl Default for Inventory {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            shelves: Vec::new(),
            next_item_id: ItemId(1),
            next_shelf_id: ShelfId(1),
        }
    }
}

impl Inventory {
    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// All items in insertion order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// All shelves in insertion order.
    pub fn shelves(&self) -> &[Shelf] {
        &self.shelves
    }

    /// Look up an item.
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Look up a shelf.
    pub fn shelf(&self, id: ShelfId) -> Option<&Shelf> {
        self.shelves.iter().find(|shelf| shelf.id == id)
    }

    /// Identifier the next created item will receive.
    pub const fn next_item_id(&self) -> ItemId {
        self.next_item_id
    }

    /// The item stored at `location`, ignoring `except`.
    pub fn occupant(&self, location: &Location, except: Option<ItemId>) -> Option<ItemId> {
        self.items
            .iter()
            .find(|item| Some(item.id) != except && item.location == *location)
            .map(|item| item.id)
    }

    /// Whether `location` is free for an item other than `except`.
    pub fn is_location_free(&self, location: &Location, except: Option<ItemId>) -> bool {
        self.occupant(location, except).is_none()
    }

    /// Number of items stored on the named shelf.
    pub fn shelf_item_count(&self, name: &str) -> usize {
        self.items
            .iter()
            .filter(|item| item.location.shelf == name)
            .count()
    }

    /// Filter items by a case-insensitive substring of name or
    /// description, then return one page of the matches.
    ///
    /// An empty or blank filter matches everything. `page` is clamped to
    /// `[1, total_pages]`.
    pub fn list(&self, filter: &str, page: usize, page_size: usize) -> Page<Item> {
        let needle = filter.trim().to_lowercase();
        let matches: Vec<Item> = self
            .items
            .iter()
            .filter(|item| matches_filter(item, &needle))
            .cloned()
            .collect();
        paginate(matches, page, page_size)
    }

    // -----------------------------------------------------------------------
    // Item mutations
    // -----------------------------------------------------------------------

    /// Append a new item with the next identifier.
    ///
    /// Fails with [`StoreError::DuplicateLocation`] if the location is
    /// taken. Registers the shelf name if it is new.
    pub fn create(&mut self, draft: &ItemDraft, photo: Option<String>) -> Result<Item, StoreError> {
        let draft = draft.normalized();
        let location = draft.location();
        self.ensure_location_free(&location, None)?;

        let id = self.next_item_id;
        let next = id.next().ok_or(StoreError::IdsExhausted)?;
        self.register_shelf(&location.shelf)?;

        let item = Item {
            id,
            name: draft.name,
            description: draft.description,
            location,
            photo,
        };
        self.items.push(item.clone());
        self.next_item_id = next;
        Ok(item)
    }

    /// Replace the fields of an existing item in place.
    ///
    /// `new_photo` replaces the stored photo when present; otherwise the
    /// previous photo is kept.
    pub fn update(
        &mut self,
        id: ItemId,
        draft: &ItemDraft,
        new_photo: Option<String>,
    ) -> Result<UpdatedItem, StoreError> {
        let draft = draft.normalized();
        let location = draft.location();

        if self.get(id).is_none() {
            return Err(StoreError::ItemNotFound(id));
        }
        self.ensure_location_free(&location, Some(id))?;
        self.register_shelf(&location.shelf)?;

        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(StoreError::ItemNotFound(id))?;

        item.name = draft.name;
        item.description = draft.description;
        item.location = location;
        let replaced_photo = match new_photo {
            Some(photo) => item.photo.replace(photo),
            None => None,
        };

        Ok(UpdatedItem {
            item: item.clone(),
            replaced_photo,
        })
    }

    /// Remove an item. Returns it if it existed; a missing id is a no-op.
    pub fn delete(&mut self, id: ItemId) -> Option<Item> {
        let index = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(index))
    }

    // -----------------------------------------------------------------------
    // Shelf mutations
    // -----------------------------------------------------------------------

    /// Register a new shelf.
    pub fn add_shelf(&mut self, name: &str) -> Result<Shelf, StoreError> {
        let name = valid_shelf_name(name)?;
        if self.shelf_by_name(&name).is_some() {
            return Err(StoreError::DuplicateShelf(name));
        }
        self.push_shelf(name)
    }

    /// Rename a shelf and rewrite every item that refers to it.
    ///
    /// Returns the number of items rewritten. Since the new name belongs
    /// to no other shelf, no item can already sit there and the cascade
    /// cannot create a location collision.
    pub fn rename_shelf(&mut self, id: ShelfId, new_name: &str) -> Result<usize, StoreError> {
        let new_name = valid_shelf_name(new_name)?;
        if let Some(existing) = self.shelf_by_name(&new_name)
            && existing.id != id
        {
            return Err(StoreError::DuplicateShelf(new_name));
        }

        let shelf = self
            .shelves
            .iter_mut()
            .find(|shelf| shelf.id == id)
            .ok_or(StoreError::ShelfNotFound(id))?;
        let old_name = std::mem::replace(&mut shelf.name, new_name.clone());

        let mut rewritten: usize = 0;
        for item in self.items.iter_mut().filter(|item| item.location.shelf == old_name) {
            item.location.shelf.clone_from(&new_name);
            rewritten = rewritten.saturating_add(1);
        }
        Ok(rewritten)
    }

    /// Remove a shelf that no item refers to.
    pub fn delete_shelf(&mut self, id: ShelfId) -> Result<Shelf, StoreError> {
        let index = self
            .shelves
            .iter()
            .position(|shelf| shelf.id == id)
            .ok_or(StoreError::ShelfNotFound(id))?;
        let name = self
            .shelves
            .get(index)
            .map(|shelf| shelf.name.clone())
            .ok_or(StoreError::ShelfNotFound(id))?;

        let items = self.shelf_item_count(&name);
        if items > 0 {
            return Err(StoreError::ShelfInUse { name, items });
        }
        Ok(self.shelves.remove(index))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn ensure_location_free(
        &self,
        location: &Location,
        except: Option<ItemId>,
    ) -> Result<(), StoreError> {
        match self.occupant(location, except) {
            Some(occupant) => Err(StoreError::DuplicateLocation {
                location: location.clone(),
                occupant,
            }),
            None => Ok(()),
        }
    }

    fn shelf_by_name(&self, name: &str) -> Option<&Shelf> {
        self.shelves.iter().find(|shelf| shelf.name == name)
    }

    fn register_shelf(&mut self, name: &str) -> Result<(), StoreError> {
        if self.shelf_by_name(name).is_none() {
            self.push_shelf(name.to_owned())?;
        }
        Ok(())
    }

    fn push_shelf(&mut self, name: String) -> Result<Shelf, StoreError> {
        let id = self.next_shelf_id;
        self.next_shelf_id = id.next().ok_or(StoreError::IdsExhausted)?;
        let shelf = Shelf { id, name };
        self.shelves.push(shelf.clone());
        Ok(shelf)
    }
}

/// Slice `entries` into the requested page.
///
/// `total_pages = max(1, ceil(len / page_size))`, `page` is clamped to
/// `[1, total_pages]`, and a zero page size is treated as one.
pub fn paginate<T>(entries: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = entries.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let start = page.saturating_sub(1).saturating_mul(page_size);

    let items: Vec<T> = entries.into_iter().skip(start).take(page_size).collect();
    Page::new(items, page, page_size, total_pages, total_items)
}

fn matches_filter(item: &Item, needle: &str) -> bool {
    needle.is_empty()
        || item.name.to_lowercase().contains(needle)
        || item.description.to_lowercase().contains(needle)
}

fn valid_shelf_name(name: &str) -> Result<String, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Invalid("shelf name must not be blank".to_owned()));
    }
    if name.chars().count() > 50 {
        return Err(StoreError::Invalid(
            "shelf name must be at most 50 characters".to_owned(),
        ));
    }
    Ok(name.to_owned())
}

// ---------------------------------------------------------------------------
// On-disk shape
// ---------------------------------------------------------------------------

/// What a data file may contain. Older files list shelves as bare names,
/// carry no counters and may pad location parts with spaces; all of it is
/// repaired on load.
#[derive(Debug, Default, Deserialize)]
struct StoredInventory {
    #[serde(default, alias = "itens")]
    items: Vec<Item>,
    #[serde(default, alias = "estantes")]
    shelves: Vec<StoredShelf>,
    #[serde(default)]
    next_item_id: Option<ItemId>,
    #[serde(default)]
    next_shelf_id: Option<ShelfId>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredShelf {
    Record(Shelf),
    Name(String),
}

impl TryFrom<StoredInventory> for Inventory {
    type Error = StoreError;

    fn try_from(stored: StoredInventory) -> Result<Self, StoreError> {
        let mut items = stored.items;
        for item in &mut items {
            if item.photo.as_deref().is_some_and(str::is_empty) {
                item.photo = None;
            }
            let location = &item.location;
            item.location = Location::new(
                location.shelf.trim(),
                location.rack.trim(),
                location.compartment.trim(),
            );
        }

        let max_item = items.iter().map(|item| item.id.0).max().unwrap_or(0);
        let next_item_id = ItemId(
            stored
                .next_item_id
                .map_or(0, ItemId::into_inner)
                .max(max_item.saturating_add(1)),
        );

        let max_shelf = stored
            .shelves
            .iter()
            .filter_map(|shelf| match shelf {
                StoredShelf::Record(record) => Some(record.id.0),
                StoredShelf::Name(_) => None,
            })
            .max()
            .unwrap_or(0);
        let next_shelf_id = ShelfId(
            stored
                .next_shelf_id
                .map_or(0, ShelfId::into_inner)
                .max(max_shelf.saturating_add(1)),
        );

        let mut inventory = Self {
            items: Vec::new(),
            shelves: Vec::new(),
            next_item_id,
            next_shelf_id,
        };

        for shelf in stored.shelves {
            match shelf {
                StoredShelf::Record(mut record) => {
                    record.name = record.name.trim().to_owned();
                    if inventory.shelf_by_name(&record.name).is_none() {
                        inventory.shelves.push(record);
                    }
                }
                StoredShelf::Name(name) => inventory.register_shelf(name.trim())?,
            }
        }
        for item in &items {
            inventory.register_shelf(&item.location.shelf)?;
        }
        inventory.items = items;
        Ok(inventory)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn draft(name: &str, shelf: &str, rack: &str, compartment: &str) -> ItemDraft {
        ItemDraft {
            name: name.to_owned(),
            description: format!("{name} description"),
            shelf: shelf.to_owned(),
            rack: rack.to_owned(),
            compartment: compartment.to_owned(),
        }
    }

    fn stocked(n: usize) -> Inventory {
        let mut inv = Inventory::default();
        for i in 0..n {
            inv.create(&draft(&format!("item {i}"), "A", &i.to_string(), "1"), None)
                .unwrap();
        }
        inv
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let inv = stocked(3);
        let ids: Vec<u64> = inv.items().iter().map(|i| i.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn create_rejects_duplicate_location() {
        let mut inv = Inventory::default();
        inv.create(&draft("hammer", "A", "1", "1"), None).unwrap();
        let result = inv.create(&draft("saw", "A", "1", "1"), None);
        assert!(matches!(
            result,
            Err(StoreError::DuplicateLocation { occupant: ItemId(1), .. })
        ));
        assert_eq!(inv.items().len(), 1);
    }

    #[test]
    fn duplicate_check_ignores_surrounding_whitespace() {
        let mut inv = Inventory::default();
        inv.create(&draft("hammer", "A", "1", "1"), None).unwrap();
        assert!(inv.create(&draft("saw", " A ", "1", " 1"), None).is_err());
    }

    #[test]
    fn create_registers_new_shelf() {
        let mut inv = Inventory::default();
        inv.create(&draft("hammer", "B", "1", "1"), None).unwrap();
        inv.create(&draft("saw", "B", "1", "2"), None).unwrap();
        assert_eq!(inv.shelves().len(), 1);
        assert_eq!(inv.shelves()[0].name, "B");
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut inv = stocked(3);
        assert!(inv.delete(ItemId(3)).is_some());
        let item = inv.create(&draft("new", "A", "9", "9"), None).unwrap();
        assert_eq!(item.id, ItemId(4));
    }

    #[test]
    fn delete_missing_leaves_inventory_unchanged() {
        let mut inv = stocked(3);
        let before = inv.clone();
        assert!(inv.delete(ItemId(99)).is_none());
        assert_eq!(inv, before);
    }

    #[test]
    fn update_allows_keeping_own_location() {
        let mut inv = stocked(2);
        let updated = inv
            .update(ItemId(1), &draft("renamed", "A", "0", "1"), None)
            .unwrap();
        assert_eq!(updated.item.name, "renamed");
        assert_eq!(inv.items()[0].name, "renamed");
    }

    #[test]
    fn update_rejects_collision_with_other_item() {
        let mut inv = stocked(2);
        let result = inv.update(ItemId(1), &draft("x", "A", "1", "1"), None);
        assert!(matches!(
            result,
            Err(StoreError::DuplicateLocation { occupant: ItemId(2), .. })
        ));
        assert_eq!(inv.items()[0].name, "item 0");
    }

    #[test]
    fn update_missing_item_is_not_found() {
        let mut inv = stocked(1);
        let result = inv.update(ItemId(7), &draft("x", "A", "5", "5"), None);
        assert!(matches!(result, Err(StoreError::ItemNotFound(ItemId(7)))));
    }

    #[test]
    fn update_replaces_photo_only_when_given() {
        let mut inv = Inventory::default();
        inv.create(&draft("drill", "A", "1", "1"), Some("old.jpg".to_owned()))
            .unwrap();

        let kept = inv
            .update(ItemId(1), &draft("drill", "A", "1", "1"), None)
            .unwrap();
        assert_eq!(kept.item.photo.as_deref(), Some("old.jpg"));
        assert_eq!(kept.replaced_photo, None);

        let swapped = inv
            .update(ItemId(1), &draft("drill", "A", "1", "1"), Some("new.png".to_owned()))
            .unwrap();
        assert_eq!(swapped.item.photo.as_deref(), Some("new.png"));
        assert_eq!(swapped.replaced_photo.as_deref(), Some("old.jpg"));
    }

    #[test]
    fn list_filters_case_insensitively_over_name_and_description() {
        let mut inv = Inventory::default();
        inv.create(&draft("Torque Wrench", "A", "1", "1"), None).unwrap();
        let mut other = draft("Box", "A", "1", "2");
        other.description = String::from("holds a WRENCH set");
        inv.create(&other, None).unwrap();
        inv.create(&draft("Pliers", "A", "1", "3"), None).unwrap();

        let page = inv.list("wrench", 1, 10);
        assert_eq!(page.total_items, 2);
        let names: Vec<&str> = page.items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Torque Wrench", "Box"]);

        assert_eq!(inv.list("   ", 1, 10).total_items, 3);
    }

    #[test]
    fn empty_listing_has_one_page() {
        let inv = Inventory::default();
        let page = inv.list("", 5, 10);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn page_is_clamped() {
        let inv = stocked(25);
        let high = inv.list("", 99, 10);
        assert_eq!(high.page, 3);
        assert_eq!(high.items.len(), 5);
        let low = inv.list("", 0, 10);
        assert_eq!(low.page, 1);
        assert_eq!(low.items.len(), 10);
    }

    #[test]
    fn pages_reassemble_the_filtered_list() {
        for n in 0..23 {
            let inv = stocked(n);
            for size in 1..8 {
                let first = inv.list("", 1, size);
                assert_eq!(first.total_pages, n.div_ceil(size).max(1));

                let mut joined = Vec::new();
                for page in 1..=first.total_pages {
                    joined.extend(inv.list("", page, size).items);
                }
                assert_eq!(joined, inv.items().to_vec(), "n={n} size={size}");
            }
        }
    }

    #[test]
    fn zero_page_size_behaves_as_one() {
        let inv = stocked(3);
        let page = inv.list("", 2, 0);
        assert_eq!(page.page_size, 1);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items[0].id, ItemId(2));
    }

    #[test]
    fn rename_shelf_cascades_to_items() {
        let mut inv = stocked(4);
        inv.create(&draft("elsewhere", "B", "1", "1"), None).unwrap();
        let shelf_a = inv.shelves()[0].id;

        let rewritten = inv.rename_shelf(shelf_a, "Z").unwrap();
        assert_eq!(rewritten, 4);
        assert_eq!(inv.items().len(), 5);
        assert_eq!(inv.shelf_item_count("Z"), 4);
        assert_eq!(inv.shelf_item_count("A"), 0);
        assert_eq!(inv.shelf_item_count("B"), 1);
    }

    #[test]
    fn rename_to_existing_name_is_rejected() {
        let mut inv = Inventory::default();
        let a = inv.add_shelf("A").unwrap();
        inv.add_shelf("B").unwrap();
        assert!(matches!(
            inv.rename_shelf(a.id, "B"),
            Err(StoreError::DuplicateShelf(_))
        ));
        assert_eq!(inv.rename_shelf(a.id, "A").unwrap(), 0);
    }

    #[test]
    fn rename_unknown_shelf_is_not_found() {
        let mut inv = Inventory::default();
        assert!(matches!(
            inv.rename_shelf(ShelfId(5), "X"),
            Err(StoreError::ShelfNotFound(ShelfId(5)))
        ));
    }

    #[test]
    fn add_shelf_rejects_blank_and_duplicates() {
        let mut inv = Inventory::default();
        assert!(matches!(inv.add_shelf("  "), Err(StoreError::Invalid(_))));
        inv.add_shelf("A").unwrap();
        assert!(matches!(inv.add_shelf(" A"), Err(StoreError::DuplicateShelf(_))));
    }

    #[test]
    fn delete_shelf_in_use_is_rejected() {
        let mut inv = stocked(2);
        let id = inv.shelves()[0].id;
        assert!(matches!(
            inv.delete_shelf(id),
            Err(StoreError::ShelfInUse { items: 2, .. })
        ));
        let empty = inv.add_shelf("empty").unwrap();
        assert_eq!(inv.delete_shelf(empty.id).unwrap().name, "empty");
    }

    #[test]
    fn serde_round_trip() {
        let mut inv = stocked(3);
        inv.add_shelf("spare").unwrap();
        inv.delete(ItemId(2));
        let json = serde_json::to_string(&inv).unwrap();
        let back: Inventory = serde_json::from_str(&json).unwrap();
        assert_eq!(back, inv);
    }

    #[test]
    fn legacy_file_is_repaired() {
        let json = r#"{
            "itens": [
                {"id": 4, "nome": "Serra", "descricao": "", "estante": "B",
                 "prateleira": "1", "segmento": "2", "foto": ""}
            ],
            "estantes": ["A", "A", "C"]
        }"#;
        let inv: Inventory = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = inv.shelves().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C", "B"]);
        assert_eq!(inv.next_item_id(), ItemId(5));
        assert_eq!(inv.items()[0].photo, None);
    }

    #[test]
    fn legacy_padding_is_trimmed_on_load() {
        let json = r#"{
            "itens": [
                {"id": 1, "nome": "Serra", "descricao": "", "estante": " B ",
                 "prateleira": "1 ", "segmento": " 2", "foto": ""}
            ],
            "estantes": [" B"]
        }"#;
        let mut inv: Inventory = serde_json::from_str(json).unwrap();
        let names: Vec<&str> = inv.shelves().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["B"]);
        assert_eq!(inv.items()[0].location, Location::new("B", "1", "2"));
        assert_eq!(inv.shelf_item_count("B"), 1);
        assert!(inv.create(&draft("saw", "B", "1", "2"), None).is_err());
    }

    #[test]
    fn exhausted_shelf_ids_fail_the_load() {
        let json = format!(
            r#"{{"items": [], "shelves": ["A"], "next_shelf_id": {}}}"#,
            u64::MAX
        );
        let result: Result<Inventory, _> = serde_json::from_str(&json);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("exhausted"), "{err}");
    }
}
