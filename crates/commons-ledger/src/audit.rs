//! Consistency verification for a finished run ledger.
//!
//! An engine-produced ledger satisfies these invariants by construction;
//! the audit exists as defense-in-depth against corrupted or externally
//! produced logs, and as the gate the metrics layer uses before trusting
//! a ledger. The checks are:
//!
//! 1. Every entry's quantities are non-negative.
//! 2. `resource_collected <= resource_in_pool_before_harvesting`.
//! 3. `resource_collected <= requested_amount`.
//! 4. Each agent's entries cover rounds `0..T-1` contiguously, in order.
//! 5. Every agent has the same run length `T`.
//!
//! Check 5 is what makes the reference-agent `survival_time` convention
//! and the theoretical over-usage denominator sound: a ledger where
//! agents recorded different numbers of rounds is rejected rather than
//! silently measured.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use commons_types::{AgentId, LedgerEntry};

/// The result of auditing a ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditResult {
    /// All invariants hold.
    Consistent,
    /// An invariant is violated; the first fault found is reported.
    Fault(LedgerFault),
}

/// A consistency violation found in a ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerFault {
    /// An entry carries a negative quantity.
    #[error("negative quantity in round {round} for agent {agent_id}")]
    NegativeQuantity {
        /// The offending round.
        round: u64,
        /// The offending agent.
        agent_id: AgentId,
    },

    /// More was collected than the pool held before harvesting.
    #[error(
        "agent {agent_id} collected {collected} in round {round} \
         with only {available} in the pool"
    )]
    CollectedExceedsPool {
        /// The offending round.
        round: u64,
        /// The offending agent.
        agent_id: AgentId,
        /// The collected quantity.
        collected: Decimal,
        /// The pre-round pool stock.
        available: Decimal,
    },

    /// More was collected than was requested.
    #[error(
        "agent {agent_id} collected {collected} in round {round} \
         but requested only {requested}"
    )]
    CollectedExceedsRequest {
        /// The offending round.
        round: u64,
        /// The offending agent.
        agent_id: AgentId,
        /// The collected quantity.
        collected: Decimal,
        /// The requested quantity.
        requested: Decimal,
    },

    /// An agent's entries do not cover rounds `0..T-1` contiguously.
    #[error(
        "agent {agent_id} has entry for round {actual} where round \
         {expected} was expected"
    )]
    NonContiguousRounds {
        /// The offending agent.
        agent_id: AgentId,
        /// The round the contiguity rule expected next.
        expected: u64,
        /// The round actually recorded.
        actual: u64,
    },

    /// Agents recorded differing numbers of rounds.
    #[error(
        "agent {agent_id} recorded {rounds} rounds where {expected} \
         were expected"
    )]
    UnevenRunLength {
        /// The offending agent.
        agent_id: AgentId,
        /// That agent's recorded round count.
        rounds: u64,
        /// The round count of the first agent encountered.
        expected: u64,
    },
}

/// Audit a sequence of ledger entries.
///
/// Quantity invariants (checks 1-3) apply to every entry, bookkeeping
/// included; the round-structure invariants (checks 4-5) apply to the
/// non-framework agents only, since bookkeeping entries are excluded
/// from the groupings metrics are computed over. An empty ledger is
/// vacuously consistent.
pub fn audit_entries(entries: &[LedgerEntry]) -> AuditResult {
    if let Some(fault) = check_quantities(entries) {
        return AuditResult::Fault(fault);
    }

    if let Some(fault) = check_round_structure(entries) {
        return AuditResult::Fault(fault);
    }

    AuditResult::Consistent
}

/// Checks 1-3: per-entry quantity invariants.
fn check_quantities(entries: &[LedgerEntry]) -> Option<LedgerFault> {
    for entry in entries {
        if entry.resource_collected < Decimal::ZERO
            || entry.requested_amount < Decimal::ZERO
            || entry.resource_in_pool_before_harvesting < Decimal::ZERO
        {
            return Some(LedgerFault::NegativeQuantity {
                round: entry.round,
                agent_id: entry.agent_id.clone(),
            });
        }

        if entry.resource_collected > entry.resource_in_pool_before_harvesting {
            return Some(LedgerFault::CollectedExceedsPool {
                round: entry.round,
                agent_id: entry.agent_id.clone(),
                collected: entry.resource_collected,
                available: entry.resource_in_pool_before_harvesting,
            });
        }

        if entry.resource_collected > entry.requested_amount {
            return Some(LedgerFault::CollectedExceedsRequest {
                round: entry.round,
                agent_id: entry.agent_id.clone(),
                collected: entry.resource_collected,
                requested: entry.requested_amount,
            });
        }
    }

    None
}

/// Checks 4-5: round contiguity per agent and equal run length across
/// agents.
fn check_round_structure(entries: &[LedgerEntry]) -> Option<LedgerFault> {
    // Next expected round per agent, built in insertion order.
    let mut next_round: BTreeMap<&AgentId, u64> = BTreeMap::new();

    for entry in entries {
        if entry.agent_id.is_framework() {
            continue;
        }

        let expected = next_round.entry(&entry.agent_id).or_insert(0);
        if entry.round != *expected {
            return Some(LedgerFault::NonContiguousRounds {
                agent_id: entry.agent_id.clone(),
                expected: *expected,
                actual: entry.round,
            });
        }
        *expected = expected.saturating_add(1);
    }

    let mut lengths = next_round.iter();
    let Some((_, &expected)) = lengths.next() else {
        return None;
    };

    for (agent_id, &rounds) in lengths {
        if rounds != expected {
            return Some(LedgerFault::UnevenRunLength {
                agent_id: (*agent_id).clone(),
                rounds,
                expected,
            });
        }
    }

    None
}
