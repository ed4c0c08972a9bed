//! Harvest source trait and stub implementation.
//!
//! Each round the engine asks the [`HarvestSource`] for one requested
//! amount per active agent. The trait abstracts the mechanism by which
//! decisions are obtained -- an LLM-driven agent layer, a scripted
//! policy, or a test stub. The engine treats the amounts as opaque
//! inputs and never calls back into the decision layer.
//!
//! The [`StubHarvestSource`] requests zero for every agent, which allows
//! the round cycle to be exercised end-to-end without a decision layer.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use commons_types::AgentId;

/// Errors that can occur while collecting harvest requests.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// An internal error in the harvest source.
    #[error("harvest source error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

/// What a harvest source gets to see when deciding: the same pre-round
/// snapshot for every agent (simultaneous-decision semantics -- no
/// agent's request is informed by another's outcome within the round).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundContext {
    /// The round being decided (0-indexed).
    pub round: u64,
    /// The pool stock before any harvesting this round.
    pub resource_in_pool: Decimal,
    /// The active agents, in resolution order.
    pub agents: Vec<AgentId>,
}

/// A source of per-agent harvest requests.
pub trait HarvestSource {
    /// Collect the requested amounts for all agents for one round.
    ///
    /// Agents missing from the returned map are treated by the engine as
    /// requesting zero (they forfeit the round).
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError`] if the decision process fails entirely;
    /// individual agent failures should be mapped to zero requests
    /// instead.
    fn collect_requests(
        &mut self,
        context: &RoundContext,
    ) -> Result<BTreeMap<AgentId, Decimal>, DecisionError>;
}

/// A stub source that requests zero for every agent.
#[derive(Debug, Clone, Default)]
pub struct StubHarvestSource;

impl StubHarvestSource {
    /// Create a new stub harvest source.
    pub const fn new() -> Self {
        Self
    }
}

impl HarvestSource for StubHarvestSource {
    fn collect_requests(
        &mut self,
        context: &RoundContext,
    ) -> Result<BTreeMap<AgentId, Decimal>, DecisionError> {
        Ok(context
            .agents
            .iter()
            .map(|agent| (agent.clone(), Decimal::ZERO))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn stub_requests_zero_for_all_agents() {
        let mut source = StubHarvestSource::new();
        let context = RoundContext {
            round: 0,
            resource_in_pool: dec!(100),
            agents: vec![AgentId::persona(0), AgentId::persona(1)],
        };

        let requests = source.collect_requests(&context).unwrap();
        assert_eq!(requests.len(), 2);
        assert!(requests.values().all(|&amount| amount == Decimal::ZERO));
    }

    #[test]
    fn stub_with_no_agents() {
        let mut source = StubHarvestSource::new();
        let context = RoundContext {
            round: 3,
            resource_in_pool: dec!(10),
            agents: Vec::new(),
        };
        assert!(source.collect_requests(&context).unwrap().is_empty());
    }
}
