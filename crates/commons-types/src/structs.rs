//! Core record structs: ledger entries, harvest requests, round reports.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::Action;
use crate::ids::AgentId;

// ---------------------------------------------------------------------------
// Harvest request (inbound contract)
// ---------------------------------------------------------------------------

/// A single agent's requested harvest for one round.
///
/// Produced by the external decision layer, consumed immediately by the
/// engine; it is not retained beyond producing a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestRequest {
    /// The requesting agent.
    pub agent_id: AgentId,
    /// The round the request applies to (0-indexed).
    pub round: u64,
    /// The non-negative quantity the agent wants to draw from the pool.
    pub requested_amount: Decimal,
}

// ---------------------------------------------------------------------------
// Ledger entry (persisted contract)
// ---------------------------------------------------------------------------

/// One agent-action record in a run's ledger.
///
/// The serialized field names are load-bearing: external analysis scripts
/// key off `round`, `agent_id`, `action`,
/// `resource_in_pool_before_harvesting` and `resource_collected` literally.
///
/// Invariants (violations are programming errors, checked by the ledger
/// audit rather than at append time):
/// `resource_collected <= resource_in_pool_before_harvesting` and
/// `resource_collected <= requested_amount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The round this entry belongs to (0-indexed).
    pub round: u64,
    /// The acting agent, or the framework pseudo-agent for bookkeeping.
    pub agent_id: AgentId,
    /// What kind of entry this is.
    pub action: Action,
    /// The pool stock recorded before any harvesting this round.
    pub resource_in_pool_before_harvesting: Decimal,
    /// The quantity the agent asked for.
    pub requested_amount: Decimal,
    /// The quantity actually granted.
    pub resource_collected: Decimal,
}

// ---------------------------------------------------------------------------
// Round reporting (outbound contract)
// ---------------------------------------------------------------------------

/// Per-agent outcome of one round, as reported to external collaborators.
///
/// These three quantities are the complete contract the prompt-construction
/// layer depends on to describe outcomes in natural language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestOutcome {
    /// The agent this outcome belongs to.
    pub agent_id: AgentId,
    /// The pool stock before any harvesting this round.
    pub resource_in_pool_before_harvesting: Decimal,
    /// The quantity the agent asked for (echoed).
    pub requested_amount: Decimal,
    /// The quantity actually granted.
    pub resource_collected: Decimal,
}

/// Everything the engine reports about one completed round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    /// The round that just completed (0-indexed).
    pub round: u64,
    /// The pool stock before any harvesting this round.
    pub resource_in_pool_before_harvesting: Decimal,
    /// The pool stock after all agents harvested, before regeneration.
    pub resource_after_harvesting: Decimal,
    /// The pool stock after regeneration.
    pub resource_after_regeneration: Decimal,
    /// Per-agent outcomes, in resolution order.
    pub outcomes: Vec<HarvestOutcome>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn entry() -> LedgerEntry {
        LedgerEntry {
            round: 3,
            agent_id: AgentId::persona(1),
            action: Action::Harvesting,
            resource_in_pool_before_harvesting: dec!(100),
            requested_amount: dec!(10),
            resource_collected: dec!(10),
        }
    }

    #[test]
    fn ledger_entry_wire_field_names() {
        let value = serde_json::to_value(entry()).unwrap();
        let object = value.as_object().unwrap();
        for field in [
            "round",
            "agent_id",
            "action",
            "resource_in_pool_before_harvesting",
            "requested_amount",
            "resource_collected",
        ] {
            assert!(object.contains_key(field), "missing field {field}");
        }
        assert_eq!(object.get("action").unwrap(), "harvesting");
        assert_eq!(object.get("agent_id").unwrap(), "persona_1");
    }

    #[test]
    fn ledger_entry_quantities_serialize_as_numbers() {
        let value = serde_json::to_value(entry()).unwrap();
        assert!(value.get("resource_collected").unwrap().is_number());
        assert!(
            value
                .get("resource_in_pool_before_harvesting")
                .unwrap()
                .is_number()
        );
    }

    #[test]
    fn ledger_entry_roundtrip() {
        let original = entry();
        let json = serde_json::to_string(&original).unwrap();
        let restored: LedgerEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(original, restored);
    }

    #[test]
    fn round_report_carries_the_outbound_contract() {
        let report = RoundReport {
            round: 0,
            resource_in_pool_before_harvesting: dec!(100),
            resource_after_harvesting: dec!(60),
            resource_after_regeneration: dec!(100),
            outcomes: vec![HarvestOutcome {
                agent_id: AgentId::persona(0),
                resource_in_pool_before_harvesting: dec!(100),
                requested_amount: dec!(40),
                resource_collected: dec!(40),
            }],
        };
        let value = serde_json::to_value(&report).unwrap();
        let outcome = value
            .get("outcomes")
            .and_then(|o| o.get(0))
            .unwrap();
        assert!(outcome.get("requested_amount").is_some());
        assert!(outcome.get("resource_collected").is_some());
        assert!(outcome.get("resource_in_pool_before_harvesting").is_some());
    }
}
