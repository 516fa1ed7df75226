//! Shared type definitions for the Stockroom workshop inventory.
//!
//! Every crate in the workspace speaks in these types: the catalog
//! aggregate persisted to `dados.json`, the user accounts persisted to
//! `usuarios.json`, and the request payloads accepted by the web layer.
//!
//! # Modules
//!
//! - [`ids`] -- Sequential integer identifiers for items and shelves
//! - [`structs`] -- Items, shelves, users, roles, pages and drafts

pub mod ids;
pub mod structs;

pub use ids::{ItemId, ShelfId};
pub use structs::{Item, ItemDraft, Location, Page, Role, Shelf, User, UserDraft};
