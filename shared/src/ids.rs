//! Newtype identifiers for stock entities.
//!
//! Identifiers are allocated in increasing order by the unit of work, so
//! comparing two ids of the same kind tells which entity was created first.

use serde::{Deserialize, Serialize};

/// Defines a type-safe `u64` identifier.
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create a new ID from a raw value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the underlying value.
            #[must_use]
            pub const fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(SubjectId);
define_id!(StockUnitId);
define_id!(StockAssignmentId);
define_id!(SupplierOrderItemId);
define_id!(ProductionOrderId);
define_id!(WarehouseId);

/// Identifier of a demand line.
///
/// Sale items and production items live in different tables, so the kind is
/// part of the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LineId {
    SaleItem(u64),
    ProductionItem(u64),
}

impl std::fmt::Display for LineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineId::SaleItem(id) => write!(f, "sale_item#{}", id),
            LineId::ProductionItem(id) => write!(f, "production_item#{}", id),
        }
    }
}
