//! Error types for the storage layer.
//!
//! All catalog and account failures are propagated via [`StoreError`].
//! Photo failures have their own [`PhotoError`](crate::photos::PhotoError)
//! because callers treat them as recoverable.

use stockroom_types::{ItemId, Location, ShelfId};

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing a data file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A data file could not be serialized or parsed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Password hashing or verification failed.
    #[error("password hash error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// No item with this identifier.
    #[error("item {0} not found")]
    ItemNotFound(ItemId),

    /// No shelf with this identifier.
    #[error("shelf {0} not found")]
    ShelfNotFound(ShelfId),

    /// No account with this username.
    #[error("user {0} not found")]
    UserNotFound(String),

    /// Another item already occupies the location.
    #[error("location {location} is already occupied by item {occupant}")]
    DuplicateLocation {
        /// The requested location.
        location: Location,
        /// The item already stored there.
        occupant: ItemId,
    },

    /// A shelf with this name already exists.
    #[error("shelf {0} already exists")]
    DuplicateShelf(String),

    /// The shelf still holds items.
    #[error("shelf {name} still holds {items} item(s)")]
    ShelfInUse {
        /// Shelf name.
        name: String,
        /// Number of items referencing it.
        items: usize,
    },

    /// An account with this username already exists.
    #[error("user {0} already exists")]
    DuplicateUser(String),

    /// Deleting the account would leave no administrator.
    #[error("cannot delete the last admin account")]
    LastAdmin,

    /// An input value was rejected.
    #[error("invalid input: {0}")]
    Invalid(String),

    /// The identifier counter ran out.
    #[error("identifier space exhausted")]
    IdsExhausted,
}
