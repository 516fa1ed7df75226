//! Integration tests for the file-backed catalog.
//!
//! Each test works in its own temporary directory and reopens the store
//! from disk to check what was actually persisted.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use stockroom_store::{CatalogStore, StoreError};
use stockroom_types::{ItemDraft, ItemId};

fn draft(name: &str, shelf: &str, rack: &str, compartment: &str) -> ItemDraft {
    ItemDraft {
        name: name.to_owned(),
        description: String::new(),
        shelf: shelf.to_owned(),
        rack: rack.to_owned(),
        compartment: compartment.to_owned(),
    }
}

#[test]
fn missing_file_opens_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = CatalogStore::open(dir.path().join("dados.json")).unwrap();
    assert!(store.inventory().items().is_empty());
    assert!(store.shelves().is_empty());
    assert!(!store.path().exists());
}

#[test]
fn save_then_load_reproduces_aggregate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dados.json");

    let mut store = CatalogStore::open(&path).unwrap();
    store.create(&draft("hammer", "A", "1", "1"), None).unwrap();
    store
        .create(&draft("saw", "B", "2", "1"), Some("1.jpg".to_owned()))
        .unwrap();
    store.create(&draft("drill", "A", "1", "2"), None).unwrap();
    store.add_shelf("spare").unwrap();
    store.delete(ItemId(2)).unwrap();

    let reopened = CatalogStore::open(&path).unwrap();
    assert_eq!(reopened.inventory(), store.inventory());

    let names: Vec<&str> = reopened
        .inventory()
        .items()
        .iter()
        .map(|i| i.name.as_str())
        .collect();
    assert_eq!(names, vec!["hammer", "drill"]);
}

#[test]
fn counter_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dados.json");

    let mut store = CatalogStore::open(&path).unwrap();
    store.create(&draft("a", "A", "1", "1"), None).unwrap();
    store.create(&draft("b", "A", "1", "2"), None).unwrap();
    store.delete(ItemId(2)).unwrap();
    drop(store);

    let mut reopened = CatalogStore::open(&path).unwrap();
    let item = reopened.create(&draft("c", "A", "1", "3"), None).unwrap();
    assert_eq!(item.id, ItemId(3));
}

#[test]
fn duplicate_location_is_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dados.json");

    let mut store = CatalogStore::open(&path).unwrap();
    store.create(&draft("a", "A", "1", "1"), None).unwrap();
    let result = store.create(&draft("b", "A", "1", "1"), None);
    assert!(matches!(result, Err(StoreError::DuplicateLocation { .. })));

    let reopened = CatalogStore::open(&path).unwrap();
    assert_eq!(reopened.inventory().items().len(), 1);
}

#[test]
fn deleting_unknown_id_still_persists_unchanged_aggregate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dados.json");

    let mut store = CatalogStore::open(&path).unwrap();
    let before = store.inventory().clone();
    assert!(store.delete(ItemId(42)).unwrap().is_none());
    assert!(path.exists());

    let reopened = CatalogStore::open(&path).unwrap();
    assert_eq!(reopened.inventory(), &before);
}

#[test]
fn rename_cascade_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dados.json");

    let mut store = CatalogStore::open(&path).unwrap();
    store.create(&draft("a", "Old", "1", "1"), None).unwrap();
    store.create(&draft("b", "Old", "1", "2"), None).unwrap();
    let shelf_id = store.shelves()[0].id;
    assert_eq!(store.rename_shelf(shelf_id, "New").unwrap(), 2);

    let reopened = CatalogStore::open(&path).unwrap();
    assert_eq!(reopened.inventory().items().len(), 2);
    assert!(
        reopened
            .inventory()
            .items()
            .iter()
            .all(|i| i.location.shelf == "New")
    );
    assert_eq!(reopened.shelves()[0].name, "New");
}

#[test]
fn failed_write_rolls_back_memory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dados.json");

    let mut store = CatalogStore::open(&path).unwrap();
    store.create(&draft("a", "A", "1", "1"), None).unwrap();

    // A directory in place of the data file makes the rename fail.
    std::fs::remove_file(&path).unwrap();
    std::fs::create_dir(&path).unwrap();

    let result = store.create(&draft("b", "A", "1", "2"), None);
    assert!(matches!(result, Err(StoreError::Io(_))));
    assert_eq!(store.inventory().items().len(), 1);
    assert_eq!(store.inventory().next_item_id(), ItemId(2));
}

#[test]
fn list_pages_over_persisted_items() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = CatalogStore::open(dir.path().join("dados.json")).unwrap();
    for i in 0..7 {
        store
            .create(&draft(&format!("bolt {i}"), "A", "1", &i.to_string()), None)
            .unwrap();
    }

    let page = store.list("BOLT", 2, 3);
    assert_eq!(page.total_items, 7);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.items[0].name, "bolt 3");
}
