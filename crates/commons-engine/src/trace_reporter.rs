//! Round reporter that bridges the engine loop to structured logging.

use tracing::{debug, info};

use commons_core::reporter::RoundReporter;
use commons_types::RoundReport;

/// Logs every round at `info` and every per-agent outcome at `debug`.
#[derive(Debug, Clone, Default)]
pub struct TraceReporter;

impl TraceReporter {
    /// Create a new tracing-backed reporter.
    pub const fn new() -> Self {
        Self
    }
}

impl RoundReporter for TraceReporter {
    fn on_round(&mut self, report: &RoundReport) {
        info!(
            round = report.round,
            pre_round = %report.resource_in_pool_before_harvesting,
            after_harvesting = %report.resource_after_harvesting,
            after_regeneration = %report.resource_after_regeneration,
            "Round reported"
        );

        for outcome in &report.outcomes {
            debug!(
                round = report.round,
                agent_id = %outcome.agent_id,
                requested = %outcome.requested_amount,
                collected = %outcome.resource_collected,
                "Agent outcome"
            );
        }
    }
}
