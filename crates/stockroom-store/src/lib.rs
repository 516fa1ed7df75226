//! File-backed storage for the Stockroom inventory.
//!
//! The whole catalog aggregate lives in memory and is rewritten to a
//! single JSON file after every mutation. Accounts follow the same
//! pattern in their own file. Photos are decoded, thumbnailed and
//! re-encoded to an upload directory.
//!
//! # Layout
//!
//! ```text
//! dados.json         <-- CatalogStore (Inventory: items + shelves + counters)
//! usuarios.json      <-- UserStore (accounts, bcrypt hashes)
//! static/uploads/    <-- PhotoStore (originals + thumb_*.jpg)
//! ```
//!
//! # Modules
//!
//! - [`catalog`] -- The in-memory aggregate and its query/mutation rules
//! - [`catalog_store`] -- Aggregate + file, persisting after each change
//! - [`users`] -- Account storage and password verification
//! - [`photos`] -- Photo decode, thumbnail and re-encode
//! - [`persist`] -- Atomic whole-file JSON writes
//! - [`error`] -- Shared error types

pub mod catalog;
pub mod catalog_store;
pub mod error;
pub mod persist;
pub mod photos;
pub mod users;

// Re-export primary types for convenience.
pub use catalog::{Inventory, UpdatedItem, paginate};
pub use catalog_store::CatalogStore;
pub use error::StoreError;
pub use photos::{PhotoError, PhotoStore, thumbnail_name};
pub use users::{UserStore, Verification, hash_password, verify_password};
