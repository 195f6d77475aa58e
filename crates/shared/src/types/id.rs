//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `CustomerId` where an
//! `AmountEntryId` is expected. IDs wrap the database's `BIGSERIAL` key:
//! ledger replay is sequenced by id order, so identifiers stay integers.

use serde::{Deserialize, Serialize};

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Creates an ID from a raw database key.
            #[must_use]
            pub const fn from_raw(id: i64) -> Self {
                Self(id)
            }

            /// Returns the inner database key.
            #[must_use]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

typed_id!(CustomerId, "Unique identifier for a customer.");
typed_id!(AmountEntryId, "Unique identifier for a balance ledger entry.");
typed_id!(CreditEntryId, "Unique identifier for a credit ledger entry.");
typed_id!(OrderId, "Unique identifier for an insurance or service order.");
