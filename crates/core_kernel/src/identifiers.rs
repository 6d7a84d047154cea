//! Strongly-typed identifiers for case entities
//!
//! Every table in the case store uses a `bigint` surrogate key. Wrapping those
//! keys in distinct newtypes keeps a client id from being passed where a
//! defendant id is expected, even though both are plain integers on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from a raw key
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the underlying key
            pub const fn get(&self) -> i64 {
                self.0
            }

            /// Returns the identifier prefix for display
            pub fn prefix() -> &'static str {
                $prefix
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}-{}", $prefix, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                // Strip prefix if present
                let raw = s.strip_prefix(concat!($prefix, "-")).unwrap_or(s);
                Ok(Self(raw.trim().parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

// Case root
define_id!(CaseId, "CASE");
define_id!(WorkLogId, "LOG");

// Parties to the matter
define_id!(ClientId, "CLI");
define_id!(DefendantId, "DEF");

// Insurance
define_id!(InsurerId, "INS");
define_id!(ClaimId, "CLM");
define_id!(AdjusterId, "ADJ");

// Medical
define_id!(MedicalBillId, "BILL");
define_id!(ProviderId, "PROV");

/// Converts a slice of typed ids into the raw keys a batch query binds
pub fn raw_keys<T: Copy + Into<i64>>(ids: &[T]) -> Vec<i64> {
    ids.iter().map(|id| (*id).into()).collect()
}
