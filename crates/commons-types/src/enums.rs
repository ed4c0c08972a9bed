//! Enumeration types for the Commons simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Agent actions
// ---------------------------------------------------------------------------

/// The category of a ledger entry.
///
/// Only `harvesting` entries participate in metric computation; `other`
/// covers engine bookkeeping written under the framework pseudo-agent.
/// The lowercase wire names are part of the persisted-ledger contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// An agent drew a quantity from the shared pool.
    Harvesting,
    /// Engine bookkeeping; excluded from metrics.
    Other,
}

// ---------------------------------------------------------------------------
// Harvesting order
// ---------------------------------------------------------------------------

/// The order in which agents' harvest requests are resolved within a round.
///
/// Only [`Concurrent`] is implemented by this engine. [`Sequential`] is a
/// recognized extension point: it parses from configuration but is rejected
/// at pool construction with a configuration error naming the mode.
///
/// [`Concurrent`]: HarvestOrder::Concurrent
/// [`Sequential`]: HarvestOrder::Sequential
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarvestOrder {
    /// Simultaneous-decision semantics: every request in a round is made
    /// against the same pre-round stock snapshot, without knowledge of
    /// other agents' requests.
    #[default]
    Concurrent,
    /// Turn-taking semantics where each agent observes the stock left by
    /// the previous one. Not implemented.
    Sequential,
}

impl HarvestOrder {
    /// The configuration name of this mode.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Concurrent => "concurrent",
            Self::Sequential => "sequential",
        }
    }
}

impl core::fmt::Display for HarvestOrder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// The resource scenario a run is configured for.
///
/// The scenario is resolved at configuration time and carries only static
/// descriptors; the engine itself is scenario-agnostic and deals purely in
/// quantities. Prompt construction for the decision layer lives outside
/// this workspace and keys off these descriptors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// A lake fished by a community of fishermen.
    #[default]
    Fishing,
    /// A river absorbing factory pollution; the stock is unpolluted water.
    Pollution,
    /// A pasture grazed by shepherds' flocks.
    Sheep,
}

impl Scenario {
    /// The name of the shared pool in this scenario.
    pub const fn pool_name(self) -> &'static str {
        match self {
            Self::Fishing => "lake",
            Self::Pollution => "river",
            Self::Sheep => "pasture",
        }
    }

    /// The unit the pool's stock is measured in.
    pub const fn resource_unit(self) -> &'static str {
        match self {
            Self::Fishing => "tons of fish",
            Self::Pollution => "percent of unpolluted water",
            Self::Sheep => "hectares of grass",
        }
    }
}
