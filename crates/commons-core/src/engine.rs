//! The simulation engine: the round loop over a shared resource pool.
//!
//! Each round the engine takes one pre-round stock snapshot, collects one
//! harvest request per active agent from the [`HarvestSource`], resolves
//! the requests against the pool in agent order (every request is drawn
//! against the same snapshot -- simultaneous-decision semantics), appends
//! one ledger entry per agent plus one bookkeeping entry under the
//! framework pseudo-agent, regenerates the pool, and notifies the
//! [`RoundReporter`].
//!
//! A run terminates at the configured horizon (success) or as soon as the
//! post-regeneration stock falls below the depletion threshold (failure).
//! Stock exactly zero is a valid continuation state; only the threshold
//! terminates.
//!
//! Given identical requests in identical round order, two runs produce
//! byte-identical ledgers: there is no randomness anywhere in the loop.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use commons_ledger::RunLedger;
use commons_pool::ResourcePool;
use commons_types::{Action, AgentId, HarvestOutcome, LedgerEntry, RoundReport};

use crate::config::SimulationConfig;
use crate::decision::{HarvestSource, RoundContext};
use crate::reporter::RoundReporter;
use crate::round::RoundClock;

/// Errors that can occur while constructing or running the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A pool operation failed (including the fail-fast rejection of an
    /// unsupported harvesting order at construction).
    #[error("pool error: {source}")]
    Pool {
        /// The underlying pool error.
        #[from]
        source: commons_pool::PoolError,
    },

    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: crate::round::ClockError,
    },

    /// The harvest source failed.
    #[error("decision error: {source}")]
    Decision {
        /// The underlying decision error.
        #[from]
        source: crate::decision::DecisionError,
    },

    /// The configuration names no agents.
    #[error("configuration must name at least one agent")]
    NoAgents,
}

/// Why a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunEndReason {
    /// The configured maximum round count was reached (success).
    HorizonReached,
    /// The post-regeneration stock fell below the depletion threshold
    /// after the given round.
    PoolDepleted {
        /// The last completed round.
        round: u64,
    },
}

/// The engine's lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed, not yet running.
    Initialized,
    /// Inside the round loop.
    Running,
    /// The termination condition triggered.
    Terminated,
}

/// The product of a finished run. The ledger is the authoritative record;
/// everything else is derivable from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRun {
    /// The run's permanent record.
    pub ledger: RunLedger,
    /// Number of rounds completed before termination.
    pub rounds_completed: u64,
    /// Why the run ended.
    pub end_reason: RunEndReason,
}

impl CompletedRun {
    /// Whether the run reached the configured horizon.
    pub const fn is_success(&self) -> bool {
        matches!(self.end_reason, RunEndReason::HorizonReached)
    }
}

/// Advances rounds, enforces termination, and writes the ledger.
#[derive(Debug)]
pub struct SimulationEngine {
    /// Active agents, in resolution order.
    agents: Vec<AgentId>,
    /// The shared pool.
    pool: ResourcePool,
    /// Round counter and horizon.
    clock: RoundClock,
    /// The run's record, built as rounds complete.
    ledger: RunLedger,
    /// The run ends early once the stock falls below this.
    depletion_threshold: Decimal,
    /// Lifecycle state.
    state: EngineState,
}

impl SimulationEngine {
    /// Build an engine for one run of the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Pool`] if the pool configuration is invalid
    /// (including a harvesting order other than `concurrent`),
    /// [`EngineError::Clock`] for a zero-round horizon, or
    /// [`EngineError::NoAgents`] if no agents are configured.
    pub fn new(config: &SimulationConfig) -> Result<Self, EngineError> {
        if config.num_agents == 0 {
            return Err(EngineError::NoAgents);
        }

        let pool = ResourcePool::new(
            config.initial_stock,
            config.capacity,
            config.harvesting_order,
        )?;
        let clock = RoundClock::new(config.max_rounds)?;

        Ok(Self {
            agents: config.agent_ids(),
            pool,
            clock,
            ledger: RunLedger::new(),
            depletion_threshold: config.depletion_threshold,
            state: EngineState::Initialized,
        })
    }

    /// The engine's lifecycle state.
    pub const fn state(&self) -> EngineState {
        self.state
    }

    /// Run to termination, consuming the engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the harvest source fails or a pool or
    /// clock operation fails. There are no retries: every operation in
    /// the loop is deterministic, so retrying could not change the
    /// outcome.
    pub fn run(
        mut self,
        source: &mut dyn HarvestSource,
        reporter: &mut dyn RoundReporter,
    ) -> Result<CompletedRun, EngineError> {
        self.state = EngineState::Running;
        info!(
            agents = self.agents.len(),
            max_rounds = self.clock.max_rounds(),
            initial_stock = %self.pool.stock(),
            "Run started"
        );

        let end_reason = loop {
            let round = self.clock.round();
            self.run_round(round, source, reporter)?;
            self.clock.advance()?;

            if self.clock.horizon_reached() {
                break RunEndReason::HorizonReached;
            }
            if self.pool.stock() < self.depletion_threshold {
                break RunEndReason::PoolDepleted { round };
            }
        };

        self.state = EngineState::Terminated;
        info!(
            rounds = self.clock.round(),
            end_reason = ?end_reason,
            "Run ended"
        );

        Ok(CompletedRun {
            ledger: self.ledger,
            rounds_completed: self.clock.round(),
            end_reason,
        })
    }

    /// Execute one round: snapshot, collect, harvest, record, regenerate,
    /// report.
    fn run_round(
        &mut self,
        round: u64,
        source: &mut dyn HarvestSource,
        reporter: &mut dyn RoundReporter,
    ) -> Result<(), EngineError> {
        let snapshot = self.pool.stock();
        let context = RoundContext {
            round,
            resource_in_pool: snapshot,
            agents: self.agents.clone(),
        };
        let mut requests = source.collect_requests(&context)?;

        let mut outcomes = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            let requested = requests.remove(agent).unwrap_or_else(|| {
                warn!(round, agent_id = %agent, "No harvest request; agent forfeits the round");
                Decimal::ZERO
            });

            let granted = self.pool.harvest(requested)?;

            self.ledger.append(LedgerEntry {
                round,
                agent_id: agent.clone(),
                action: Action::Harvesting,
                resource_in_pool_before_harvesting: snapshot,
                requested_amount: requested,
                resource_collected: granted,
            });
            outcomes.push(HarvestOutcome {
                agent_id: agent.clone(),
                resource_in_pool_before_harvesting: snapshot,
                requested_amount: requested,
                resource_collected: granted,
            });
        }

        for agent in requests.keys() {
            warn!(round, agent_id = %agent, "Request from unconfigured agent ignored");
        }

        let after_harvesting = self.pool.stock();

        // Bookkeeping: the pool level once the round's harvesting is done.
        self.ledger.append(LedgerEntry {
            round,
            agent_id: AgentId::framework(),
            action: Action::Other,
            resource_in_pool_before_harvesting: after_harvesting,
            requested_amount: Decimal::ZERO,
            resource_collected: Decimal::ZERO,
        });

        let regrown = self.pool.regenerate()?;
        let after_regeneration = self.pool.stock();
        info!(
            round,
            pre_round = %snapshot,
            after_harvesting = %after_harvesting,
            %regrown,
            "Round completed"
        );

        reporter.on_round(&RoundReport {
            round,
            resource_in_pool_before_harvesting: snapshot,
            resource_after_harvesting: after_harvesting,
            resource_after_regeneration: after_regeneration,
            outcomes,
        });

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal_macros::dec;

    use commons_types::HarvestOrder;

    use super::*;
    use crate::decision::{DecisionError, StubHarvestSource};
    use crate::reporter::NoOpReporter;

    /// Requests the same amount for every agent, every round.
    struct FixedSource {
        amount: Decimal,
    }

    impl HarvestSource for FixedSource {
        fn collect_requests(
            &mut self,
            context: &RoundContext,
        ) -> Result<BTreeMap<AgentId, Decimal>, DecisionError> {
            Ok(context
                .agents
                .iter()
                .map(|agent| (agent.clone(), self.amount))
                .collect())
        }
    }

    /// Returns no requests at all; every agent forfeits.
    struct SilentSource;

    impl HarvestSource for SilentSource {
        fn collect_requests(
            &mut self,
            _context: &RoundContext,
        ) -> Result<BTreeMap<AgentId, Decimal>, DecisionError> {
            Ok(BTreeMap::new())
        }
    }

    /// Captures every round report.
    #[derive(Default)]
    struct RecordingReporter {
        reports: Vec<RoundReport>,
    }

    impl RoundReporter for RecordingReporter {
        fn on_round(&mut self, report: &RoundReport) {
            self.reports.push(report.clone());
        }
    }

    fn config(num_agents: u32, max_rounds: u64, initial: Decimal) -> SimulationConfig {
        SimulationConfig {
            num_agents,
            max_rounds,
            initial_stock: initial,
            capacity: dec!(100),
            depletion_threshold: dec!(5),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn engine_starts_initialized() {
        let engine = SimulationEngine::new(&config(1, 1, dec!(100))).unwrap();
        assert_eq!(engine.state(), EngineState::Initialized);
    }

    #[test]
    fn no_agents_rejected() {
        let result = SimulationEngine::new(&config(0, 1, dec!(100)));
        assert!(matches!(result, Err(EngineError::NoAgents)));
    }

    #[test]
    fn sequential_order_rejected_at_engine_construction() {
        let cfg = SimulationConfig {
            harvesting_order: HarvestOrder::Sequential,
            ..SimulationConfig::default()
        };
        assert!(matches!(
            SimulationEngine::new(&cfg),
            Err(EngineError::Pool { .. })
        ));
    }

    #[test]
    fn single_agent_single_round() {
        // Initial stock 100, one agent requests 40: granted 40, stock 60
        // after harvest, doubled to 120 and clamped to capacity 100.
        let engine = SimulationEngine::new(&config(1, 1, dec!(100))).unwrap();
        let mut source = FixedSource { amount: dec!(40) };
        let mut reporter = RecordingReporter::default();

        let run = engine.run(&mut source, &mut reporter).unwrap();
        assert_eq!(run.rounds_completed, 1);
        assert!(run.is_success());

        let report = reporter.reports.first().unwrap();
        assert_eq!(report.resource_in_pool_before_harvesting, dec!(100));
        assert_eq!(report.resource_after_harvesting, dec!(60));
        assert_eq!(report.resource_after_regeneration, dec!(100));

        let outcome = report.outcomes.first().unwrap();
        assert_eq!(outcome.requested_amount, dec!(40));
        assert_eq!(outcome.resource_collected, dec!(40));
    }

    #[test]
    fn joint_over_request_grants_at_most_the_pre_round_stock() {
        // Two agents each request 8 from a pool of 10. Resolution order is
        // agent order within the concurrent snapshot: persona_0 is granted
        // 8, persona_1 the remaining 2, and the stock bottoms out at 0.
        let engine = SimulationEngine::new(&config(2, 1, dec!(10))).unwrap();
        let mut source = FixedSource { amount: dec!(8) };
        let mut reporter = RecordingReporter::default();

        let run = engine.run(&mut source, &mut reporter).unwrap();
        let groups = run.ledger.group_by_agent();
        let first = groups.get(&AgentId::persona(0)).unwrap().first().unwrap();
        let second = groups.get(&AgentId::persona(1)).unwrap().first().unwrap();

        assert_eq!(first.resource_collected, dec!(8));
        assert_eq!(second.resource_collected, dec!(2));
        assert_eq!(
            first.resource_collected + second.resource_collected,
            dec!(10)
        );
        assert_eq!(
            reporter.reports.first().unwrap().resource_after_harvesting,
            dec!(0)
        );
        // Both requests were drawn against the same pre-round snapshot.
        assert_eq!(second.resource_in_pool_before_harvesting, dec!(10));
    }

    #[test]
    fn stub_source_runs_to_the_horizon() {
        let engine = SimulationEngine::new(&config(5, 12, dec!(100))).unwrap();
        let mut source = StubHarvestSource::new();
        let mut reporter = NoOpReporter::new();

        let run = engine.run(&mut source, &mut reporter).unwrap();
        assert_eq!(run.rounds_completed, 12);
        assert_eq!(run.end_reason, RunEndReason::HorizonReached);

        let groups = run.ledger.group_by_agent();
        let rounds: Vec<u64> = groups
            .get(&AgentId::persona(0))
            .unwrap()
            .iter()
            .map(|e| e.round)
            .collect();
        assert_eq!(rounds, (0..12).collect::<Vec<u64>>());
    }

    #[test]
    fn greedy_source_depletes_and_terminates_early() {
        let engine = SimulationEngine::new(&config(1, 12, dec!(100))).unwrap();
        let mut source = FixedSource { amount: dec!(100) };
        let mut reporter = NoOpReporter::new();

        let run = engine.run(&mut source, &mut reporter).unwrap();
        assert_eq!(run.end_reason, RunEndReason::PoolDepleted { round: 0 });
        assert_eq!(run.rounds_completed, 1);
        assert!(!run.is_success());
    }

    #[test]
    fn sustainable_harvesting_sustains_the_pool() {
        // 5 agents each taking an equal share of half the stock
        // (floor(floor(100 / 2) / 5) = 10) leave 50, which regrows to 100.
        let engine = SimulationEngine::new(&config(5, 12, dec!(100))).unwrap();
        let mut source = FixedSource { amount: dec!(10) };
        let mut reporter = RecordingReporter::default();

        let run = engine.run(&mut source, &mut reporter).unwrap();
        assert!(run.is_success());
        for report in &reporter.reports {
            assert_eq!(report.resource_after_regeneration, dec!(100));
        }
    }

    #[test]
    fn framework_bookkeeping_entry_per_round() {
        let engine = SimulationEngine::new(&config(2, 3, dec!(100))).unwrap();
        let mut source = FixedSource { amount: dec!(5) };
        let mut reporter = NoOpReporter::new();

        let run = engine.run(&mut source, &mut reporter).unwrap();
        let bookkeeping: Vec<_> = run
            .ledger
            .all_entries()
            .iter()
            .filter(|e| e.agent_id.is_framework())
            .collect();
        assert_eq!(bookkeeping.len(), 3);
        assert!(bookkeeping.iter().all(|e| e.action == Action::Other));
        // Excluded from the metric-facing groupings.
        assert!(!run.ledger.group_by_agent().contains_key(&AgentId::framework()));
    }

    #[test]
    fn missing_requests_are_zero_requests() {
        let engine = SimulationEngine::new(&config(2, 1, dec!(100))).unwrap();
        let mut source = SilentSource;
        let mut reporter = NoOpReporter::new();

        let run = engine.run(&mut source, &mut reporter).unwrap();
        for entry in run.ledger.group_by_agent().values().flatten() {
            assert_eq!(entry.requested_amount, dec!(0));
            assert_eq!(entry.resource_collected, dec!(0));
        }
    }

    #[test]
    fn identical_request_sequences_produce_identical_ledgers() {
        let run = |amount: Decimal| {
            let engine = SimulationEngine::new(&config(3, 8, dec!(100))).unwrap();
            let mut source = FixedSource { amount };
            let mut reporter = NoOpReporter::new();
            engine.run(&mut source, &mut reporter).unwrap()
        };

        let a = run(dec!(7));
        let b = run(dec!(7));
        assert_eq!(a.ledger, b.ledger);
        assert_eq!(
            a.ledger.to_json().unwrap(),
            b.ledger.to_json().unwrap()
        );
    }

    #[test]
    fn engine_ledgers_pass_the_audit() {
        let engine = SimulationEngine::new(&config(4, 6, dec!(100))).unwrap();
        let mut source = FixedSource { amount: dec!(20) };
        let mut reporter = NoOpReporter::new();

        let run = engine.run(&mut source, &mut reporter).unwrap();
        assert_eq!(run.ledger.audit(), commons_ledger::AuditResult::Consistent);
    }
}
