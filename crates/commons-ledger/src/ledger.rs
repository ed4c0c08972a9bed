//! The run ledger: an append-only log of agent actions.
//!
//! # Design
//!
//! - **Append-only**: entries are never modified or deleted.
//! - **Pure projections**: [`group_by_agent`] and [`group_by_round`] are
//!   non-mutating views usable repeatedly by the metrics layer.
//! - **Framework exclusion**: bookkeeping entries written under the
//!   framework pseudo-agent are part of the record but excluded from
//!   both groupings (and therefore from every metric).
//! - **Interchange format**: the ledger serializes as a JSON array of
//!   entries whose field names external analysis scripts key off
//!   literally.
//!
//! [`group_by_agent`]: RunLedger::group_by_agent
//! [`group_by_round`]: RunLedger::group_by_round

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use commons_types::{AgentId, LedgerEntry};

use crate::LedgerError;
use crate::audit::{self, AuditResult};

/// The permanent record of a single simulation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunLedger {
    /// All entries, in insertion order.
    entries: Vec<LedgerEntry>,
}

impl RunLedger {
    /// Create a new empty ledger.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Return the number of entries in the ledger.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the ledger has no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry to the ledger. O(1); no validation beyond type
    /// structure -- invariant violations are programming errors caught by
    /// [`audit`](Self::audit), not recoverable runtime conditions.
    pub fn append(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    /// Return all entries, in insertion order.
    pub fn all_entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Return all entries for a given round, in insertion order.
    pub fn entries_for_round(&self, round: u64) -> Vec<&LedgerEntry> {
        self.entries.iter().filter(|e| e.round == round).collect()
    }

    /// Group entries by agent, excluding the framework pseudo-agent.
    ///
    /// A pure projection: the ledger is not mutated and repeated calls
    /// yield identical results. Within each agent the entries keep their
    /// insertion order (round order for an engine-produced ledger).
    pub fn group_by_agent(&self) -> BTreeMap<AgentId, Vec<&LedgerEntry>> {
        let mut groups: BTreeMap<AgentId, Vec<&LedgerEntry>> = BTreeMap::new();

        for entry in &self.entries {
            if entry.agent_id.is_framework() {
                continue;
            }
            groups.entry(entry.agent_id.clone()).or_default().push(entry);
        }

        groups
    }

    /// Group entries by round, excluding the framework pseudo-agent.
    ///
    /// A pure projection, like [`group_by_agent`](Self::group_by_agent).
    pub fn group_by_round(&self) -> BTreeMap<u64, Vec<&LedgerEntry>> {
        let mut groups: BTreeMap<u64, Vec<&LedgerEntry>> = BTreeMap::new();

        for entry in &self.entries {
            if entry.agent_id.is_framework() {
                continue;
            }
            groups.entry(entry.round).or_default().push(entry);
        }

        groups
    }

    /// Verify the ledger's consistency invariants.
    ///
    /// See [`audit::audit_entries`] for the exact checks.
    pub fn audit(&self) -> AuditResult {
        audit::audit_entries(&self.entries)
    }

    /// Serialize the ledger to its JSON interchange format.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, LedgerError> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    /// Restore a ledger from its JSON interchange format.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Json`] if the input is not a valid entry
    /// sequence.
    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        let entries: Vec<LedgerEntry> = serde_json::from_str(json)?;
        Ok(Self { entries })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use commons_types::Action;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::*;

    fn harvest_entry(round: u64, agent: u32, before: Decimal, amount: Decimal) -> LedgerEntry {
        LedgerEntry {
            round,
            agent_id: AgentId::persona(agent),
            action: Action::Harvesting,
            resource_in_pool_before_harvesting: before,
            requested_amount: amount,
            resource_collected: amount,
        }
    }

    fn framework_entry(round: u64, after_harvest: Decimal) -> LedgerEntry {
        LedgerEntry {
            round,
            agent_id: AgentId::framework(),
            action: Action::Other,
            resource_in_pool_before_harvesting: after_harvest,
            requested_amount: Decimal::ZERO,
            resource_collected: Decimal::ZERO,
        }
    }

    fn two_round_ledger() -> RunLedger {
        let mut ledger = RunLedger::new();
        ledger.append(harvest_entry(0, 0, dec!(100), dec!(10)));
        ledger.append(harvest_entry(0, 1, dec!(100), dec!(20)));
        ledger.append(framework_entry(0, dec!(70)));
        ledger.append(harvest_entry(1, 0, dec!(100), dec!(15)));
        ledger.append(harvest_entry(1, 1, dec!(100), dec!(5)));
        ledger.append(framework_entry(1, dec!(80)));
        ledger
    }

    #[test]
    fn new_ledger_is_empty() {
        let ledger = RunLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.len(), 0);
    }

    #[test]
    fn group_by_agent_excludes_framework() {
        let ledger = two_round_ledger();
        let groups = ledger.group_by_agent();
        assert_eq!(groups.len(), 2);
        assert!(!groups.contains_key(&AgentId::framework()));
        assert_eq!(
            groups.get(&AgentId::persona(0)).map(Vec::len),
            Some(2)
        );
    }

    #[test]
    fn group_by_round_excludes_framework() {
        let ledger = two_round_ledger();
        let groups = ledger.group_by_round();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups.get(&0).map(Vec::len), Some(2));
        assert_eq!(groups.get(&1).map(Vec::len), Some(2));
    }

    #[test]
    fn groupings_are_idempotent_and_non_mutating() {
        let ledger = two_round_ledger();
        let before = ledger.clone();

        let first = ledger.group_by_agent();
        let second = ledger.group_by_agent();
        assert_eq!(first, second);

        let first = ledger.group_by_round();
        let second = ledger.group_by_round();
        assert_eq!(first, second);

        assert_eq!(ledger, before);
    }

    #[test]
    fn entries_keep_round_order_within_agent() {
        let ledger = two_round_ledger();
        let groups = ledger.group_by_agent();
        let rounds: Vec<u64> = groups
            .get(&AgentId::persona(1))
            .unwrap()
            .iter()
            .map(|e| e.round)
            .collect();
        assert_eq!(rounds, vec![0, 1]);
    }

    #[test]
    fn entries_for_round_includes_framework() {
        let ledger = two_round_ledger();
        assert_eq!(ledger.entries_for_round(0).len(), 3);
        assert_eq!(ledger.entries_for_round(5).len(), 0);
    }

    #[test]
    fn json_roundtrip_preserves_entries() {
        let ledger = two_round_ledger();
        let json = ledger.to_json().unwrap();
        let restored = RunLedger::from_json(&json).unwrap();
        assert_eq!(ledger, restored);
    }

    #[test]
    fn json_is_an_array_of_keyed_records() {
        let ledger = two_round_ledger();
        let value: serde_json::Value =
            serde_json::from_str(&ledger.to_json().unwrap()).unwrap();
        let first = value.as_array().and_then(|a| a.first()).unwrap();
        assert_eq!(first.get("agent_id").unwrap(), "persona_0");
        assert_eq!(first.get("action").unwrap(), "harvesting");
        assert!(first.get("resource_in_pool_before_harvesting").is_some());
    }

    #[test]
    fn identical_ledgers_serialize_identically() {
        let a = two_round_ledger();
        let b = two_round_ledger();
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }
}
