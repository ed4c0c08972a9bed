//! Per-run metric computation over a single finished ledger.
//!
//! All arithmetic is exact [`Decimal`] arithmetic; the thresholds use
//! floor division exactly as the evaluation contract defines them
//! (`optimal per round = floor(initial_stock / 2)`, equal share =
//! `floor(floor(pre_round_stock / 2) / agent_count)`).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use commons_ledger::{AuditResult, RunLedger};
use commons_types::{Action, AgentId, LedgerEntry};

use crate::MetricsError;

/// The derived outcome metrics of one run.
///
/// The serialized field names (`gains`, `survival_time`, `efficiency`,
/// `equality`, `over_usage`) are the per-run section keys of the
/// aggregate report and are relied upon by external consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Total collected per agent over the whole run.
    pub gains: BTreeMap<AgentId, Decimal>,
    /// `1 + max(round)` over the reference agent's entries.
    pub survival_time: u64,
    /// How close total gains came to the sustainable optimum, in
    /// `[0, 100]`.
    pub efficiency: Decimal,
    /// Mean-absolute-difference equality index over per-agent gains, in
    /// `[0, 100]`.
    pub equality: Decimal,
    /// Percentage of possible harvesting events that exceeded an equal
    /// sustainable share.
    pub over_usage: Decimal,
}

impl RunMetrics {
    /// Whether the run survived to the configured horizon.
    pub const fn is_success(&self, horizon: u64) -> bool {
        self.survival_time == horizon
    }

    /// Total gains over all agents.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::ArithmeticOverflow`] if the sum overflows.
    pub fn total_gains(&self) -> Result<Decimal, MetricsError> {
        checked_sum(self.gains.values().copied())
    }

    /// Mean per-agent gain (what cross-run `mean_gains` aggregates).
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::EmptyLedger`] if there are no agents, or
    /// [`MetricsError::ArithmeticOverflow`] on overflow.
    pub fn mean_agent_gain(&self) -> Result<Decimal, MetricsError> {
        if self.gains.is_empty() {
            return Err(MetricsError::EmptyLedger);
        }
        let total = self.total_gains()?;
        total
            .checked_div(Decimal::from(self.gains.len()))
            .ok_or(MetricsError::ArithmeticOverflow)
    }
}

/// Compute a run's metrics using the reference-agent convention: the
/// first agent in the ledger's agent ordering (`persona_0` under the
/// standard naming).
///
/// # Errors
///
/// Returns [`MetricsError::InconsistentLedger`] if the audit fails,
/// [`MetricsError::EmptyLedger`] if no agent recorded entries, or any
/// error of [`compute_run_metrics_for`].
pub fn compute_run_metrics(ledger: &RunLedger) -> Result<RunMetrics, MetricsError> {
    let reference = ledger
        .group_by_agent()
        .keys()
        .next()
        .cloned()
        .ok_or(MetricsError::EmptyLedger)?;
    compute_run_metrics_for(ledger, &reference)
}

/// Compute a run's metrics against an explicit reference agent.
///
/// The reference agent determines `survival_time`; the ledger audit
/// guarantees every agent recorded the same number of rounds, so the
/// choice only matters for callers whose configuration order differs
/// from the ledger's lexicographic agent order.
///
/// # Errors
///
/// Returns [`MetricsError::InconsistentLedger`] if the audit fails,
/// [`MetricsError::MissingReferenceAgent`] if the reference agent has no
/// entries, or [`MetricsError::ZeroOptimalGains`] if the initial stock
/// admits no sustainable harvest.
pub fn compute_run_metrics_for(
    ledger: &RunLedger,
    reference: &AgentId,
) -> Result<RunMetrics, MetricsError> {
    if let AuditResult::Fault(fault) = ledger.audit() {
        return Err(MetricsError::InconsistentLedger { fault });
    }

    let groups = ledger.group_by_agent();
    if groups.is_empty() {
        return Err(MetricsError::EmptyLedger);
    }

    let reference_entries =
        groups
            .get(reference)
            .ok_or_else(|| MetricsError::MissingReferenceAgent {
                agent_id: reference.clone(),
            })?;

    let survival_time = survival_time(reference_entries);
    let initial_stock = reference_entries
        .first()
        .map(|e| e.resource_in_pool_before_harvesting)
        .ok_or_else(|| MetricsError::MissingReferenceAgent {
            agent_id: reference.clone(),
        })?;

    let gains = gains(&groups)?;
    let total_gains = checked_sum(gains.values().copied())?;

    let efficiency = efficiency(initial_stock, survival_time, total_gains)?;
    let equality = equality(&gains, total_gains)?;
    let over_usage = over_usage(&groups, survival_time)?;

    Ok(RunMetrics {
        gains,
        survival_time,
        efficiency,
        equality,
        over_usage,
    })
}

/// Sum of `resource_collected` over each agent's harvesting entries.
fn gains(
    groups: &BTreeMap<AgentId, Vec<&LedgerEntry>>,
) -> Result<BTreeMap<AgentId, Decimal>, MetricsError> {
    let mut totals = BTreeMap::new();
    for (agent_id, entries) in groups {
        let collected = checked_sum(
            entries
                .iter()
                .filter(|e| e.action == Action::Harvesting)
                .map(|e| e.resource_collected),
        )?;
        totals.insert(agent_id.clone(), collected);
    }
    Ok(totals)
}

/// `1 + max(round)` over the reference agent's entries.
fn survival_time(entries: &[&LedgerEntry]) -> u64 {
    entries
        .iter()
        .map(|e| e.round)
        .max()
        .map_or(0, |max_round| max_round.saturating_add(1))
}

/// `100 * (1 - max(0, optimal - total) / optimal)` with
/// `optimal = survival_time * floor(initial_stock / 2)` -- the
/// regeneration-neutral group harvest under the doubling rule.
fn efficiency(
    initial_stock: Decimal,
    survival_time: u64,
    total_gains: Decimal,
) -> Result<Decimal, MetricsError> {
    let per_round_optimum = initial_stock
        .checked_div(Decimal::TWO)
        .ok_or(MetricsError::ArithmeticOverflow)?
        .floor();
    let optimal_gains = Decimal::from(survival_time)
        .checked_mul(per_round_optimum)
        .ok_or(MetricsError::ArithmeticOverflow)?;

    if optimal_gains.is_zero() {
        return Err(MetricsError::ZeroOptimalGains);
    }

    let shortfall = optimal_gains
        .checked_sub(total_gains)
        .ok_or(MetricsError::ArithmeticOverflow)?
        .max(Decimal::ZERO);
    let ratio = shortfall
        .checked_div(optimal_gains)
        .ok_or(MetricsError::ArithmeticOverflow)?;

    Decimal::ONE
        .checked_sub(ratio)
        .and_then(|v| v.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(MetricsError::ArithmeticOverflow)
}

/// `100 * (1 - pairwise_abs_difference_sum / (2 * n * total_gains))`.
///
/// The pairwise sum runs over all ordered pairs including self-pairs,
/// which contribute zero. When total gains are zero the index is defined
/// as 100: every agent gained exactly the same, namely nothing.
fn equality(
    gains: &BTreeMap<AgentId, Decimal>,
    total_gains: Decimal,
) -> Result<Decimal, MetricsError> {
    if total_gains.is_zero() {
        return Ok(Decimal::ONE_HUNDRED);
    }

    let mut pairwise = Decimal::ZERO;
    for left in gains.values() {
        for right in gains.values() {
            let diff = left
                .checked_sub(*right)
                .ok_or(MetricsError::ArithmeticOverflow)?
                .abs();
            pairwise = pairwise
                .checked_add(diff)
                .ok_or(MetricsError::ArithmeticOverflow)?;
        }
    }

    let denominator = Decimal::TWO
        .checked_mul(Decimal::from(gains.len()))
        .and_then(|v| v.checked_mul(total_gains))
        .ok_or(MetricsError::ArithmeticOverflow)?;
    let ratio = pairwise
        .checked_div(denominator)
        .ok_or(MetricsError::ArithmeticOverflow)?;

    Decimal::ONE
        .checked_sub(ratio)
        .and_then(|v| v.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(MetricsError::ArithmeticOverflow)
}

/// Percentage of harvesting events exceeding the equal sustainable share
/// `floor(floor(pre_round_stock / 2) / agent_count)`.
///
/// The denominator is the theoretical maximum event count
/// (`survival_time * agent_count`), not the observed count; the ledger
/// audit guarantees every agent acts every recorded round, so the two
/// coincide for engine-produced ledgers.
fn over_usage(
    groups: &BTreeMap<AgentId, Vec<&LedgerEntry>>,
    survival_time: u64,
) -> Result<Decimal, MetricsError> {
    let agent_count = Decimal::from(groups.len());

    let mut over_events = Decimal::ZERO;
    for entries in groups.values() {
        for entry in entries {
            if entry.action != Action::Harvesting {
                continue;
            }

            let share = entry
                .resource_in_pool_before_harvesting
                .checked_div(Decimal::TWO)
                .ok_or(MetricsError::ArithmeticOverflow)?
                .floor()
                .checked_div(agent_count)
                .ok_or(MetricsError::ArithmeticOverflow)?
                .floor();

            if entry.resource_collected > share {
                over_events = over_events
                    .checked_add(Decimal::ONE)
                    .ok_or(MetricsError::ArithmeticOverflow)?;
            }
        }
    }

    let total_events = Decimal::from(survival_time)
        .checked_mul(agent_count)
        .ok_or(MetricsError::ArithmeticOverflow)?;
    if total_events.is_zero() {
        return Err(MetricsError::EmptyLedger);
    }

    over_events
        .checked_div(total_events)
        .and_then(|v| v.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(MetricsError::ArithmeticOverflow)
}

/// Overflow-checked sum of a quantity stream.
fn checked_sum(values: impl Iterator<Item = Decimal>) -> Result<Decimal, MetricsError> {
    let mut total = Decimal::ZERO;
    for value in values {
        total = total
            .checked_add(value)
            .ok_or(MetricsError::ArithmeticOverflow)?;
    }
    Ok(total)
}
