//! Outcome metrics for the Commons simulation.
//!
//! The metrics layer consumes finished, immutable run ledgers and derives
//! the quantitative outcomes agent behavior is evaluated on:
//!
//! - **Gains**: what each agent collected over the run.
//! - **Survival time**: how many rounds the run lasted.
//! - **Efficiency**: how close total harvesting came to the theoretical
//!   sustainable maximum.
//! - **Equality**: how evenly gains were distributed
//!   (mean-absolute-difference index).
//! - **Over-usage**: how often individual harvests exceeded an equal
//!   sustainable share.
//!
//! Across repeated independent runs, [`aggregate`] folds per-run metrics
//! into mean / population-standard-deviation pairs plus the survival
//! rate, in the literal report shape downstream table and plot generators
//! expect.
//!
//! Malformed input is fatal by design: a ledger that fails its
//! consistency audit, or a computation whose denominator degenerates, is
//! reported as a [`MetricsError`] rather than silently producing NaN --
//! downstream statistics built on a silent fallback would be misleading.
//!
//! # Modules
//!
//! - [`run`] -- Per-run metric computation over one ledger.
//! - [`aggregate`] -- Cross-run folding and the report shape.
//!
//! [`aggregate`]: aggregate::aggregate

pub mod aggregate;
pub mod run;

// Re-export primary types at crate root.
pub use aggregate::{GeneralStats, GroupReport, aggregate, survival_rate};
pub use run::{RunMetrics, compute_run_metrics, compute_run_metrics_for};

use commons_ledger::LedgerFault;
use commons_types::{AgentId, RunId};

/// Errors that can occur while computing metrics.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// The ledger failed its consistency audit; no metric over it is
    /// meaningful.
    #[error("inconsistent ledger: {fault}")]
    InconsistentLedger {
        /// The first fault the audit found.
        fault: LedgerFault,
    },

    /// The ledger contains no agent entries.
    #[error("ledger contains no agent entries")]
    EmptyLedger,

    /// The designated reference agent has no entries in the ledger.
    #[error("reference agent {agent_id} has no entries")]
    MissingReferenceAgent {
        /// The absent agent.
        agent_id: AgentId,
    },

    /// The theoretical optimal gain is zero (initial stock below 2), so
    /// efficiency is undefined.
    #[error("optimal gains are zero; efficiency is undefined")]
    ZeroOptimalGains,

    /// Aggregation was requested over zero runs.
    #[error("no runs to aggregate")]
    NoRuns,

    /// `general` is reserved for the aggregate section of the report.
    #[error("run id {run_id} collides with the reserved aggregate section")]
    ReservedRunId {
        /// The offending run id.
        run_id: RunId,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in metric calculation")]
    ArithmeticOverflow,

    /// The report could not be serialized.
    #[error("metrics JSON error: {source}")]
    Json {
        /// The underlying serde error.
        #[from]
        source: serde_json::Error,
    },
}
