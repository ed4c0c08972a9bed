//! Scripted harvest policies.
//!
//! These deterministic policies stand in for the external decision layer
//! (the LLM-driven agent runner lives outside this workspace). They are
//! the workhorses of baseline experiments:
//!
//! - `fixed` -- every agent requests a constant amount each round.
//! - `sustainable` -- every agent requests an equal share of the
//!   sustainable half-stock, `floor(floor(stock / 2) / agent_count)`.
//! - `greedy` -- every agent requests the entire pre-round stock.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use commons_core::config::ExperimentConfig;
use commons_core::decision::{DecisionError, HarvestSource, RoundContext};
use commons_types::AgentId;

/// Errors in the scripted-policy configuration.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    /// The experiment names a policy this runner does not provide.
    #[error("unknown policy: {name}")]
    UnknownPolicy {
        /// The unrecognized policy name.
        name: String,
    },

    /// The `fixed` policy requires `policy_amount`.
    #[error("policy `fixed` requires policy_amount")]
    MissingAmount,

    /// `policy_amount` must be non-negative.
    #[error("policy_amount must be non-negative, got {amount}")]
    NegativeAmount {
        /// The invalid amount.
        amount: Decimal,
    },
}

/// A deterministic per-round request rule applied uniformly to all
/// agents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedPolicy {
    /// Request a constant amount every round.
    Fixed {
        /// The per-agent request.
        amount: Decimal,
    },
    /// Request an equal share of the sustainable half-stock.
    Sustainable,
    /// Request the entire pre-round stock.
    Greedy,
}

impl ScriptedPolicy {
    /// Resolve the policy named by an experiment configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::UnknownPolicy`] for an unrecognized name,
    /// [`PolicyError::MissingAmount`] if `fixed` lacks an amount, or
    /// [`PolicyError::NegativeAmount`] for a negative one.
    pub fn from_experiment(config: &ExperimentConfig) -> Result<Self, PolicyError> {
        match config.policy.as_str() {
            "fixed" => {
                let amount = config.policy_amount.ok_or(PolicyError::MissingAmount)?;
                if amount < Decimal::ZERO {
                    return Err(PolicyError::NegativeAmount { amount });
                }
                Ok(Self::Fixed { amount })
            }
            "sustainable" => Ok(Self::Sustainable),
            "greedy" => Ok(Self::Greedy),
            other => Err(PolicyError::UnknownPolicy {
                name: other.to_owned(),
            }),
        }
    }

    /// The per-agent request for one round.
    fn request_for(&self, context: &RoundContext) -> Result<Decimal, DecisionError> {
        match self {
            Self::Fixed { amount } => Ok(*amount),
            Self::Greedy => Ok(context.resource_in_pool),
            Self::Sustainable => {
                let agent_count = Decimal::from(context.agents.len());
                context
                    .resource_in_pool
                    .checked_div(Decimal::TWO)
                    .map(|half| half.floor())
                    .and_then(|half| half.checked_div(agent_count))
                    .map(|share| share.floor())
                    .ok_or_else(|| DecisionError::Internal {
                        message: "sustainable share calculation failed".to_owned(),
                    })
            }
        }
    }
}

impl HarvestSource for ScriptedPolicy {
    fn collect_requests(
        &mut self,
        context: &RoundContext,
    ) -> Result<BTreeMap<AgentId, Decimal>, DecisionError> {
        if context.agents.is_empty() {
            return Ok(BTreeMap::new());
        }

        let request = self.request_for(context)?;
        Ok(context
            .agents
            .iter()
            .map(|agent| (agent.clone(), request))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn context(stock: Decimal, agents: u32) -> RoundContext {
        RoundContext {
            round: 0,
            resource_in_pool: stock,
            agents: (0..agents).map(AgentId::persona).collect(),
        }
    }

    fn experiment(policy: &str, amount: Option<Decimal>) -> ExperimentConfig {
        ExperimentConfig {
            policy: policy.to_owned(),
            policy_amount: amount,
            ..ExperimentConfig::default()
        }
    }

    #[test]
    fn unknown_policy_is_a_configuration_error() {
        let result = ScriptedPolicy::from_experiment(&experiment("universalization", None));
        let message = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(message.contains("universalization"));
    }

    #[test]
    fn fixed_requires_an_amount() {
        assert!(matches!(
            ScriptedPolicy::from_experiment(&experiment("fixed", None)),
            Err(PolicyError::MissingAmount)
        ));
        assert!(matches!(
            ScriptedPolicy::from_experiment(&experiment("fixed", Some(dec!(-1)))),
            Err(PolicyError::NegativeAmount { .. })
        ));
    }

    #[test]
    fn fixed_requests_the_constant_for_every_agent() {
        let mut policy =
            ScriptedPolicy::from_experiment(&experiment("fixed", Some(dec!(10)))).unwrap();
        let requests = policy.collect_requests(&context(dec!(100), 3)).unwrap();
        assert_eq!(requests.len(), 3);
        assert!(requests.values().all(|&amount| amount == dec!(10)));
    }

    #[test]
    fn sustainable_requests_the_equal_share() {
        // floor(floor(100 / 2) / 5) = 10
        let mut policy = ScriptedPolicy::Sustainable;
        let requests = policy.collect_requests(&context(dec!(100), 5)).unwrap();
        assert!(requests.values().all(|&amount| amount == dec!(10)));

        // floor(floor(45 / 2) / 4) = floor(22 / 4) = 5
        let requests = policy.collect_requests(&context(dec!(45), 4)).unwrap();
        assert!(requests.values().all(|&amount| amount == dec!(5)));
    }

    #[test]
    fn greedy_requests_the_whole_pool() {
        let mut policy = ScriptedPolicy::Greedy;
        let requests = policy.collect_requests(&context(dec!(37), 2)).unwrap();
        assert!(requests.values().all(|&amount| amount == dec!(37)));
    }

    #[test]
    fn no_agents_means_no_requests() {
        let mut policy = ScriptedPolicy::Sustainable;
        assert!(
            policy
                .collect_requests(&context(dec!(100), 0))
                .unwrap()
                .is_empty()
        );
    }
}
