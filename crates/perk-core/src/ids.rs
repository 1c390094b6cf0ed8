//! Identifier types for the perk ledger.
//!
//! This module provides strongly-typed identifiers for employees and catalog
//! items.
//!
//! # Macro-based ID Types
//!
//! The `int_id_type!` macro reduces boilerplate for the database-assigned
//! integer identifier types, ensuring consistent implementation of
//! serialization, parsing, ordering and display traits.
//!
//! # Ordering
//!
//! Identifiers are assigned monotonically by the store and are totally
//! ordered. When an operation has to lock more than one account row, locks
//! are always acquired in ascending `EmployeeId` order, so the `Ord`
//! implementation here is load-bearing and must stay consistent with the
//! store's assignment order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macro to define an integer-based identifier type with standard trait
/// implementations.
///
/// This macro generates a newtype wrapper around `i64` with implementations
/// for:
/// - `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - `PartialOrd`, `Ord` (assignment order)
/// - `Serialize`, `Deserialize` (as a plain integer)
/// - `FromStr`, `Display`, `Debug`
macro_rules! int_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create an identifier from its raw database value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Return the raw database value.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

int_id_type!(
    EmployeeId,
    "An employee identifier.\n\nAssigned by the store from a monotonic \
     sequence; the total order over `EmployeeId`s defines the lock \
     acquisition order for multi-account operations."
);
int_id_type!(
    MerchId,
    "A catalog item identifier.\n\nCatalog rows are immutable reference \
     data, so this id is only ever used for lookups and holding keys."
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employee_id_ordering_follows_assignment() {
        let first = EmployeeId::new(1);
        let second = EmployeeId::new(2);
        assert!(first < second);
        assert_eq!(first.min(second), first);
    }

    #[test]
    fn employee_id_parse_roundtrip() {
        let id = EmployeeId::new(42);
        let parsed: EmployeeId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn employee_id_serializes_as_integer() {
        let id = EmployeeId::new(7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "7");
        let parsed: EmployeeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn merch_id_roundtrip() {
        let id = MerchId::new(3);
        let json = serde_json::to_string(&id).unwrap();
        let parsed: MerchId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
