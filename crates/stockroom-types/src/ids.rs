//! Type-safe identifier wrappers around `u64`.
//!
//! Items and shelves are numbered sequentially by the catalog. Wrapping
//! the raw integers prevents an item id from being handed to a shelf
//! operation (and vice versa) at compile time. Identifiers are never
//! reused: the catalog keeps a counter that only moves forward.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `u64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Wrap a raw identifier value.
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Return the inner `u64` value.
            pub const fn into_inner(self) -> u64 {
                self.0
            }

            /// The identifier following this one, or `None` on overflow.
            pub const fn next(self) -> Option<Self> {
                match self.0.checked_add(1) {
                    Some(raw) => Some(Self(raw)),
                    None => None,
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = core::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a catalogued item.
    ItemId
}

define_id! {
    /// Unique identifier for a shelf.
    ShelfId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_whitespace() {
        let id: ItemId = " 42 ".parse().unwrap_or(ItemId(0));
        assert_eq!(id, ItemId(42));
    }

    #[test]
    fn rejects_non_numeric() {
        assert!("abc".parse::<ShelfId>().is_err());
        assert!("-1".parse::<ShelfId>().is_err());
    }

    #[test]
    fn next_stops_at_overflow() {
        assert_eq!(ItemId(1).next(), Some(ItemId(2)));
        assert_eq!(ItemId(u64::MAX).next(), None);
    }

    #[test]
    fn serializes_as_bare_integer() {
        let json = serde_json::to_string(&ItemId(7)).unwrap_or_default();
        assert_eq!(json, "7");
    }
}
