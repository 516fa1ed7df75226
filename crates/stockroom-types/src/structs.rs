//! Catalog and account records.
//!
//! Field names on disk are English; the `alias` attributes let the
//! loader read files written by the earlier Portuguese-keyed variant of
//! the app (`nome`, `estante`, `prateleira`, ...).

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::ids::{ItemId, ShelfId};

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// Physical storage location of an item: shelf, rack and compartment.
///
/// At most one item may occupy a given location at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Shelf name (denormalized copy of [`Shelf::name`]).
    #[serde(alias = "estante")]
    pub shelf: String,
    /// Rack within the shelf.
    #[serde(alias = "prateleira")]
    pub rack: String,
    /// Compartment within the rack.
    #[serde(alias = "segmento")]
    pub compartment: String,
}

impl Location {
    /// Build a location from its three parts.
    pub fn new(
        shelf: impl Into<String>,
        rack: impl Into<String>,
        compartment: impl Into<String>,
    ) -> Self {
        Self {
            shelf: shelf.into(),
            rack: rack.into(),
            compartment: compartment.into(),
        }
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}/{}", self.shelf, self.rack, self.compartment)
    }
}

// ---------------------------------------------------------------------------
// Item
// ---------------------------------------------------------------------------

/// A catalogued object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Sequential identifier, never reused.
    pub id: ItemId,
    /// Display name.
    #[serde(alias = "nome")]
    pub name: String,
    /// Free-text description.
    #[serde(default, alias = "descricao")]
    pub description: String,
    /// Where the item is stored.
    #[serde(flatten)]
    pub location: Location,
    /// File name of the stored photo, if any.
    #[serde(default, alias = "foto", skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// User-supplied fields for creating or updating an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ItemDraft {
    /// Display name.
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    #[validate(length(max = 2000, message = "description must be at most 2000 characters"))]
    pub description: String,
    /// Shelf name.
    #[validate(length(min = 1, max = 50, message = "shelf must be 1-50 characters"))]
    pub shelf: String,
    /// Rack within the shelf.
    #[validate(length(min = 1, max = 50, message = "rack must be 1-50 characters"))]
    pub rack: String,
    /// Compartment within the rack.
    #[validate(length(min = 1, max = 50, message = "compartment must be 1-50 characters"))]
    pub compartment: String,
}

impl ItemDraft {
    /// Return a copy with surrounding whitespace stripped from every field.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            description: self.description.trim().to_owned(),
            shelf: self.shelf.trim().to_owned(),
            rack: self.rack.trim().to_owned(),
            compartment: self.compartment.trim().to_owned(),
        }
    }

    /// The location this draft asks for.
    pub fn location(&self) -> Location {
        Location::new(&self.shelf, &self.rack, &self.compartment)
    }

    /// Prefill a draft from an existing item (edit forms).
    pub fn from_item(item: &Item) -> Self {
        Self {
            name: item.name.clone(),
            description: item.description.clone(),
            shelf: item.location.shelf.clone(),
            rack: item.location.rack.clone(),
            compartment: item.location.compartment.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Shelf
// ---------------------------------------------------------------------------

/// A named shelf. Items refer to it by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shelf {
    /// Sequential identifier, never reused.
    pub id: ShelfId,
    /// Unique shelf name.
    #[serde(alias = "nome")]
    pub name: String,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Access role of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full read/write access, including user management.
    Admin,
    /// Read-only access to the catalog.
    #[default]
    Viewer,
}

impl Role {
    /// Lowercase wire name of the role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Viewer => "viewer",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A stored account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique login name.
    #[serde(alias = "usuario")]
    pub username: String,
    /// Bcrypt hash, or a legacy plaintext password awaiting upgrade.
    #[serde(alias = "password", alias = "senha")]
    pub password_hash: String,
    /// Access role. Accounts written without one load as viewers.
    #[serde(default)]
    pub role: Role,
    /// File name of the profile photo, if any.
    #[serde(default, alias = "foto", skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// Fields submitted when creating an account.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserDraft {
    /// Unique login name.
    #[validate(length(min = 1, max = 50, message = "username must be 1-50 characters"))]
    pub username: String,
    /// Plaintext password, hashed before it is stored.
    #[validate(length(min = 4, max = 72, message = "password must be 4-72 characters"))]
    pub password: String,
    /// Access role.
    #[serde(default)]
    pub role: Role,
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// One page of a filtered listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    /// Entries on this page, in catalog order.
    pub items: Vec<T>,
    /// 1-based page number after clamping.
    pub page: usize,
    /// Entries per page.
    pub page_size: usize,
    /// Number of pages (at least 1, even when nothing matched).
    pub total_pages: usize,
    /// Number of entries matching the filter across all pages.
    pub total_items: usize,
    /// Whether a page precedes this one.
    pub has_previous: bool,
    /// Whether a page follows this one.
    pub has_next: bool,
}

impl<T> Page<T> {
    /// Assemble a page, deriving the navigation flags.
    pub fn new(
        items: Vec<T>,
        page: usize,
        page_size: usize,
        total_pages: usize,
        total_items: usize,
    ) -> Self {
        Self {
            items,
            page,
            page_size,
            total_pages,
            total_items,
            has_previous: page > 1,
            has_next: page < total_pages,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn item_reads_legacy_keys() {
        let json = r#"{
            "id": 3,
            "nome": "Chave 10mm",
            "descricao": "combinada",
            "estante": "A",
            "prateleira": "2",
            "segmento": "B",
            "foto": "123.jpg"
        }"#;
        let item: Item = serde_json::from_str(json).unwrap();
        assert_eq!(item.id, ItemId(3));
        assert_eq!(item.name, "Chave 10mm");
        assert_eq!(item.location, Location::new("A", "2", "B"));
        assert_eq!(item.photo.as_deref(), Some("123.jpg"));
    }

    #[test]
    fn item_writes_flat_location() {
        let item = Item {
            id: ItemId(1),
            name: String::from("Drill"),
            description: String::new(),
            location: Location::new("A", "1", "1"),
            photo: None,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["shelf"], "A");
        assert_eq!(value["rack"], "1");
        assert!(value.get("photo").is_none());
    }

    #[test]
    fn draft_normalized_trims() {
        let draft = ItemDraft {
            name: String::from("  Saw "),
            description: String::from(" sharp\n"),
            shelf: String::from(" A"),
            rack: String::from("1 "),
            compartment: String::from(" 2 "),
        };
        let clean = draft.normalized();
        assert_eq!(clean.name, "Saw");
        assert_eq!(clean.location(), Location::new("A", "1", "2"));
    }

    #[test]
    fn draft_validation_rejects_blank_name() {
        let draft = ItemDraft {
            name: String::new(),
            description: String::new(),
            shelf: String::from("A"),
            rack: String::from("1"),
            compartment: String::from("1"),
        };
        assert!(draft.validate().is_err());
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("ADMIN".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" viewer ".parse::<Role>(), Ok(Role::Viewer));
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn user_without_role_loads_as_viewer() {
        let json = r#"{"username": "ana", "password": "secret"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.role, Role::Viewer);
        assert_eq!(user.password_hash, "secret");
    }

    #[test]
    fn page_flags() {
        let page = Page::new(vec![1, 2], 2, 2, 3, 6);
        assert!(page.has_previous);
        assert!(page.has_next);
        let last = Page::new(vec![5, 6], 3, 2, 3, 6);
        assert!(!last.has_next);
    }
}
