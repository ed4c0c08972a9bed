//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `commons-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror
//! the YAML structure and provides loaders that read and validate it.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use commons_types::{AgentId, HarvestOrder, Scenario};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Simulation configuration for a single run.
///
/// The defaults reproduce the baseline shared-pool game: five agents, a
/// pool of 100 at capacity 100, a 12-round horizon, and early collapse
/// when the post-regeneration stock falls below 5.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// The resource scenario (descriptors only; the engine is
    /// scenario-agnostic).
    #[serde(default)]
    pub scenario: Scenario,

    /// Number of harvesting agents.
    #[serde(default = "default_num_agents")]
    pub num_agents: u32,

    /// Maximum round count; reaching it counts as run success.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u64,

    /// Pool stock at the start of the run.
    #[serde(default = "default_initial_stock")]
    pub initial_stock: Decimal,

    /// Carrying capacity of the pool.
    #[serde(default = "default_capacity")]
    pub capacity: Decimal,

    /// The run ends early once the post-regeneration stock falls below
    /// this threshold.
    #[serde(default = "default_depletion_threshold")]
    pub depletion_threshold: Decimal,

    /// How agents' requests are resolved within a round. Only
    /// `concurrent` is implemented; anything else fails at pool
    /// construction.
    #[serde(default)]
    pub harvesting_order: HarvestOrder,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            scenario: Scenario::default(),
            num_agents: default_num_agents(),
            max_rounds: default_max_rounds(),
            initial_stock: default_initial_stock(),
            capacity: default_capacity(),
            depletion_threshold: default_depletion_threshold(),
            harvesting_order: HarvestOrder::default(),
        }
    }
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yml::from_str(&contents)?)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }

    /// The agent identifiers for this configuration, in resolution order
    /// (`persona_0` through `persona_{n-1}`).
    pub fn agent_ids(&self) -> Vec<AgentId> {
        (0..self.num_agents).map(AgentId::persona).collect()
    }
}

/// Experiment configuration: a batch of repeated independent runs under
/// one condition.
///
/// Two experiments with the same simulation config but different scripted
/// policies can be compared post-hoc through their metrics reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Unique experiment identifier (generated at creation time).
    #[serde(default = "default_experiment_id")]
    pub experiment_id: String,

    /// Human-readable experiment name.
    #[serde(default)]
    pub name: String,

    /// Number of independent runs to execute.
    #[serde(default = "default_runs")]
    pub runs: u32,

    /// Scripted harvest policy name (`fixed`, `sustainable`, `greedy`).
    #[serde(default = "default_policy")]
    pub policy: String,

    /// Per-agent request amount for the `fixed` policy.
    #[serde(default)]
    pub policy_amount: Option<Decimal>,

    /// Directory the per-run ledgers and the metrics report are written
    /// to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            experiment_id: default_experiment_id(),
            name: String::new(),
            runs: default_runs(),
            policy: default_policy(),
            policy_amount: None,
            output_dir: default_output_dir(),
        }
    }
}

impl ExperimentConfig {
    /// Load experiment config from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yml::from_str(&contents)?)
    }

    /// Parse experiment config from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

fn default_experiment_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

const fn default_num_agents() -> u32 {
    5
}

const fn default_max_rounds() -> u64 {
    12
}

const fn default_initial_stock() -> Decimal {
    Decimal::ONE_HUNDRED
}

const fn default_capacity() -> Decimal {
    Decimal::ONE_HUNDRED
}

fn default_depletion_threshold() -> Decimal {
    Decimal::from(5)
}

const fn default_runs() -> u32 {
    5
}

fn default_policy() -> String {
    "sustainable".to_owned()
}

fn default_output_dir() -> String {
    "results".to_owned()
}
