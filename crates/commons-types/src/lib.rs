//! Shared type definitions for the Commons simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Commons workspace: the resource-pool simulation engine, the run ledger,
//! and the metrics layer all speak in the types defined here.
//!
//! # Modules
//!
//! - [`ids`] -- String-backed identifier newtypes for agents and runs
//! - [`enums`] -- Enumeration types (actions, harvesting order, scenarios)
//! - [`structs`] -- Core record structs (ledger entries, harvest requests,
//!   round reports)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Action, HarvestOrder, Scenario};
pub use ids::{AgentId, FRAMEWORK_AGENT, RunId};
pub use structs::{HarvestOutcome, HarvestRequest, LedgerEntry, RoundReport};
