//! Type-safe ID wrappers for records in the remote task store.
//!
//! IDs are always assigned by the store, so unlike local identifiers these
//! wrappers never generate values themselves. Tables may key rows by UUID or
//! by integer; both are read into the same string form.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Number of characters shown when an ID is abbreviated in chat.
const SHORT_LEN: usize = 8;

/// An ID as it appears in a store row.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Signed(n) => n.to_string(),
            RawId::Unsigned(n) => n.to_string(),
        }
    }
}

/// Macro to generate ID newtypes with common functionality.
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                RawId::deserialize(deserializer).map(|raw| Self(raw.into()))
            }
        }

        impl $name {
            /// Creates an ID from a string returned by the store.
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Returns the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns the first few characters, for compact display.
            pub fn short(&self) -> &str {
                match self.0.char_indices().nth(SHORT_LEN) {
                    Some((idx, _)) => &self.0[..idx],
                    None => &self.0,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(TaskId);
define_id!(SubtaskId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_truncates_uuid() {
        let id = TaskId::from("a95135f0-1970-474a-850c-d280fc6ca217");
        assert_eq!(id.short(), "a95135f0");
    }

    #[test]
    fn test_short_keeps_short_ids() {
        let id = SubtaskId::from("42");
        assert_eq!(id.short(), "42");
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = TaskId::from("task-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"task-1\"");
        let back: TaskId = serde_json::from_str("\"task-1\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_integer_keys_read_as_strings() {
        let id: TaskId = serde_json::from_str("17").unwrap();
        assert_eq!(id.as_str(), "17");
        let sub: SubtaskId = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(sub.as_str(), "18446744073709551615");
        assert!(serde_json::from_str::<TaskId>("true").is_err());
    }
}
