//! Append-only run ledger for the Commons simulation.
//!
//! Every agent action in a run produces one [`LedgerEntry`] appended to a
//! [`RunLedger`]. The ledger is the run's permanent, authoritative record:
//! entries are never modified or deleted, and the metrics layer derives
//! every statistic from it.
//!
//! # Architecture
//!
//! - [`ledger`] -- The [`RunLedger`] struct: append, pure grouping
//!   projections, JSON persistence.
//! - [`audit`] -- Consistency verification over a finished ledger.
//!
//! # Consistency
//!
//! For every harvesting entry:
//!
//! ```text
//! 0 <= resource_collected <= resource_in_pool_before_harvesting
//! resource_collected <= requested_amount
//! ```
//!
//! and every agent's entries cover rounds `0..T-1` contiguously, with the
//! same `T` for all agents. A violation produces a [`LedgerFault`]; the
//! metrics layer refuses to compute over a faulty ledger.
//!
//! [`LedgerEntry`]: commons_types::LedgerEntry
//! [`RunLedger`]: ledger::RunLedger
//! [`LedgerFault`]: audit::LedgerFault

pub mod audit;
pub mod ledger;

// Re-export primary types at crate root.
pub use audit::{AuditResult, LedgerFault};
pub use ledger::RunLedger;

/// Errors that can occur when persisting or restoring a ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The ledger could not be serialized to or deserialized from JSON.
    #[error("ledger JSON error: {source}")]
    Json {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },
}
