//! Typed IDs for budget tree nodes.
//!
//! Node ids are opaque strings: ids coming back from the document store are kept
//! verbatim, fresh ones are `{prefix}_{uuid v7}`. Using typed IDs prevents passing
//! a `SubItemId` where a `SectorId` is expected.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Error returned when parsing an empty id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("id must not be blank")]
pub struct BlankIdError;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $prefix:literal, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix carried by freshly generated ids.
            pub const PREFIX: &'static str = $prefix;

            /// Creates a new unique ID from a time-ordered UUID v7.
            #[must_use]
            pub fn new() -> Self {
                Self(format!("{}_{}", $prefix, Uuid::now_v7().simple()))
            }

            /// Wraps an existing id verbatim.
            #[must_use]
            pub fn from_raw(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Returns the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = BlankIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(BlankIdError);
                }
                Ok(Self(trimmed.to_string()))
            }
        }
    };
}

typed_id!(SectorId, "sec", "Unique identifier for a budget sector.");
typed_id!(SubItemId, "sub", "Unique identifier for a sector sub-item.");

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
