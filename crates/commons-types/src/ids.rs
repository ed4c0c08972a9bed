//! String-backed identifier newtypes.
//!
//! Agent identifiers are externally significant literals (`persona_0`,
//! `persona_1`, ..., and the bookkeeping pseudo-agent `framework`): the
//! downstream analysis scripts match them byte-for-byte in the persisted
//! ledger. Wrapping them in newtypes prevents accidental mixing of agent
//! and run identifiers at compile time while keeping the wire format a
//! plain JSON string.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_name_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create an identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Return the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the inner [`String`].
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_name_id! {
    /// Unique identifier for an agent participating in a run.
    AgentId
}

define_name_id! {
    /// Unique identifier for a single simulation run.
    RunId
}

/// The reserved identifier of the bookkeeping pseudo-agent.
///
/// Entries written under this identifier record engine bookkeeping (e.g.
/// the pool level after a round's harvesting) and are excluded from every
/// metric computation.
pub const FRAMEWORK_AGENT: &str = "framework";

impl AgentId {
    /// The bookkeeping pseudo-agent.
    pub fn framework() -> Self {
        Self(FRAMEWORK_AGENT.to_owned())
    }

    /// Whether this identifier names the bookkeeping pseudo-agent.
    pub fn is_framework(&self) -> bool {
        self.0 == FRAMEWORK_AGENT
    }

    /// Build the conventional persona identifier for an agent index
    /// (`persona_0`, `persona_1`, ...).
    pub fn persona(index: u32) -> Self {
        Self(format!("persona_{index}"))
    }
}

impl RunId {
    /// Generate a fresh run identifier (a UUID v7 string, time-ordered).
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn persona_ids_follow_convention() {
        assert_eq!(AgentId::persona(0).as_str(), "persona_0");
        assert_eq!(AgentId::persona(4).as_str(), "persona_4");
    }

    #[test]
    fn framework_id_is_recognized() {
        assert!(AgentId::framework().is_framework());
        assert!(!AgentId::persona(0).is_framework());
        assert!(AgentId::from("framework").is_framework());
    }

    #[test]
    fn agent_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&AgentId::persona(2)).unwrap();
        assert_eq!(json, "\"persona_2\"");
    }

    #[test]
    fn persona_ids_sort_in_index_order_for_single_digits() {
        let mut ids = vec![AgentId::persona(3), AgentId::persona(0), AgentId::persona(1)];
        ids.sort();
        assert_eq!(ids.first().map(AgentId::as_str), Some("persona_0"));
    }

    #[test]
    fn generated_run_ids_are_distinct() {
        assert_ne!(RunId::generate(), RunId::generate());
    }

    #[test]
    fn run_id_roundtrip_serde() {
        let original = RunId::from("run_0");
        let json = serde_json::to_string(&original).unwrap();
        let restored: RunId = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
    }
}
