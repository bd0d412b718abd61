//! Strongly-typed identifiers for domain entities.
//!
//! These prevent mixing up IDs from different contexts.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier from a string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

define_id!(
    Epic,
    "Broker's canonical identifier for a tradable instrument."
);
define_id!(DealId, "Broker's identifier for one open position.");
define_id!(
    DealReference,
    "Reference returned by the order endpoint, used to fetch the deal confirmation."
);
define_id!(AccountId, "Broker trading account identifier.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epic_new_and_display() {
        let epic = Epic::new("IX.D.DAX.IFMM.IP");
        assert_eq!(epic.as_str(), "IX.D.DAX.IFMM.IP");
        assert_eq!(format!("{epic}"), "IX.D.DAX.IFMM.IP");
    }

    #[test]
    fn deal_id_equality() {
        let id1 = DealId::new("DIAAAABBBCCC");
        let id2 = DealId::new("DIAAAABBBCCC");
        let id3 = DealId::new("DIAAAABBBCCD");
        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn deal_reference_from_string() {
        let dr: DealReference = "REF123".into();
        assert_eq!(dr.as_str(), "REF123");

        let dr: DealReference = String::from("REF456").into();
        assert_eq!(dr.as_str(), "REF456");
    }

    #[test]
    fn epic_into_inner() {
        let epic = Epic::new("CS.D.EURUSD.MINI.IP");
        assert_eq!(epic.into_inner(), "CS.D.EURUSD.MINI.IP");
    }

    #[test]
    fn serde_roundtrip() {
        let id = DealId::new("DI123");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"DI123\"");

        let parsed: DealId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn hash_works_for_collections() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(DealId::new("DI1"));
        set.insert(DealId::new("DI2"));
        set.insert(DealId::new("DI1")); // duplicate

        assert_eq!(set.len(), 2);
    }
}
