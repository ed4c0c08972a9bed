//! Round cycle, configuration, and orchestration for the Commons
//! simulation.
//!
//! This crate owns the round loop that drives a run: collect one harvest
//! request per agent, resolve them against the shared pool, record the
//! outcomes in the ledger, regenerate the pool, and repeat until the
//! horizon is reached or the pool collapses.
//!
//! # Modules
//!
//! - [`config`] -- Typed YAML configuration for simulations and
//!   experiments.
//! - [`round`] -- [`RoundClock`]: checked round counter with a horizon.
//! - [`decision`] -- [`HarvestSource`] trait and [`StubHarvestSource`]:
//!   the boundary to the external decision layer.
//! - [`reporter`] -- [`RoundReporter`] trait: the injected reporting
//!   boundary (never ambient global state).
//! - [`engine`] -- The [`SimulationEngine`] round loop.
//!
//! [`RoundClock`]: round::RoundClock
//! [`HarvestSource`]: decision::HarvestSource
//! [`StubHarvestSource`]: decision::StubHarvestSource
//! [`RoundReporter`]: reporter::RoundReporter
//! [`SimulationEngine`]: engine::SimulationEngine

pub mod config;
pub mod decision;
pub mod engine;
pub mod reporter;
pub mod round;
