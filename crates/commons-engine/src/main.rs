//! Experiment runner binary for the Commons simulation.
//!
//! Wires together the round cycle, a scripted harvest policy, and the
//! metrics layer: loads configuration, executes a batch of independent
//! runs, writes each run's ledger to `<output_dir>/<run_id>/log_env.json`,
//! and writes the aggregate metrics report and experiment summary.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `commons-config.yaml` (or the path given
//!    as the first CLI argument)
//! 3. Resolve the scripted harvest policy
//! 4. Execute the configured number of runs
//! 5. Aggregate per-run metrics and write `metrics.json`
//! 6. Write `experiment.json` with wall-clock metadata

mod policy;
mod trace_reporter;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use commons_core::config::{ExperimentConfig, SimulationConfig};
use commons_core::engine::{RunEndReason, SimulationEngine};
use commons_metrics::aggregate::aggregate;
use commons_metrics::run::{RunMetrics, compute_run_metrics};
use commons_types::RunId;

use crate::policy::ScriptedPolicy;
use crate::trace_reporter::TraceReporter;

/// Default path of the canonical configuration file.
const DEFAULT_CONFIG_PATH: &str = "commons-config.yaml";

/// The canonical configuration file: a simulation section and an
/// experiment section, both optional.
#[derive(Debug, Clone, Default, Deserialize)]
struct AppConfig {
    /// The per-run simulation parameters.
    #[serde(default)]
    simulation: SimulationConfig,

    /// The experiment batch parameters.
    #[serde(default)]
    experiment: ExperimentConfig,
}

/// Wall-clock metadata of a finished experiment, written alongside the
/// metrics report.
#[derive(Debug, Clone, Serialize)]
struct ExperimentSummary {
    /// Unique experiment identifier.
    experiment_id: String,
    /// Human-readable experiment name.
    name: String,
    /// The scripted policy the runs used.
    policy: String,
    /// Number of runs executed.
    runs: u32,
    /// When the experiment started.
    started_at: DateTime<Utc>,
    /// When the experiment finished.
    finished_at: DateTime<Utc>,
    /// Total wall-clock duration in milliseconds.
    duration_ms: i64,
    /// Why each run ended.
    end_reasons: BTreeMap<RunId, RunEndReason>,
}

/// Application entry point for the experiment runner.
///
/// # Errors
///
/// Returns an error if configuration loading, any run, metric
/// computation, or result writing fails.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("commons-engine starting");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_owned());
    let config = load_config(Path::new(&config_path))?;
    info!(
        scenario = ?config.simulation.scenario,
        num_agents = config.simulation.num_agents,
        max_rounds = config.simulation.max_rounds,
        runs = config.experiment.runs,
        policy = config.experiment.policy,
        "Configuration loaded"
    );

    // Fail fast on a misconfigured policy before any run starts.
    let _ = ScriptedPolicy::from_experiment(&config.experiment)?;

    let started_at = Utc::now();
    let out_dir = PathBuf::from(&config.experiment.output_dir);
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut per_run: BTreeMap<RunId, RunMetrics> = BTreeMap::new();
    let mut end_reasons: BTreeMap<RunId, RunEndReason> = BTreeMap::new();

    for index in 0..config.experiment.runs {
        let run_id = RunId::from(format!("run_{index}"));
        let (metrics, end_reason) =
            execute_run(&config.simulation, &config.experiment, &run_id, &out_dir)?;
        per_run.insert(run_id.clone(), metrics);
        end_reasons.insert(run_id, end_reason);
    }

    let report = aggregate(&per_run, config.simulation.max_rounds)?;
    let metrics_path = out_dir.join("metrics.json");
    std::fs::write(&metrics_path, report.to_json()?)
        .with_context(|| format!("writing {}", metrics_path.display()))?;
    info!(
        path = %metrics_path.display(),
        survival_rate = report.general.survival_rate,
        mean_efficiency = report.general.mean_efficiency,
        "Metrics report written"
    );

    let finished_at = Utc::now();
    let summary = ExperimentSummary {
        experiment_id: config.experiment.experiment_id.clone(),
        name: config.experiment.name.clone(),
        policy: config.experiment.policy.clone(),
        runs: config.experiment.runs,
        started_at,
        finished_at,
        duration_ms: (finished_at - started_at).num_milliseconds(),
        end_reasons,
    };
    let summary_path = out_dir.join("experiment.json");
    std::fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("writing {}", summary_path.display()))?;

    info!(
        experiment_id = summary.experiment_id,
        duration_ms = summary.duration_ms,
        "Experiment complete"
    );
    Ok(())
}

/// Load the canonical configuration file.
fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    serde_yml::from_str(&contents)
        .with_context(|| format!("parsing config file {}", path.display()))
}

/// Execute one run: build a fresh engine and policy, run to termination,
/// persist the ledger, and compute the run's metrics.
fn execute_run(
    simulation: &SimulationConfig,
    experiment: &ExperimentConfig,
    run_id: &RunId,
    out_dir: &Path,
) -> anyhow::Result<(RunMetrics, RunEndReason)> {
    let engine = SimulationEngine::new(simulation)
        .with_context(|| format!("constructing engine for {run_id}"))?;
    let mut source = ScriptedPolicy::from_experiment(experiment)?;
    let mut reporter = TraceReporter::new();

    let completed = engine
        .run(&mut source, &mut reporter)
        .with_context(|| format!("running {run_id}"))?;
    info!(
        run_id = %run_id,
        rounds = completed.rounds_completed,
        success = completed.is_success(),
        "Run finished"
    );

    let run_dir = out_dir.join(run_id.as_str());
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("creating run directory {}", run_dir.display()))?;
    let ledger_path = run_dir.join("log_env.json");
    std::fs::write(&ledger_path, completed.ledger.to_json()?)
        .with_context(|| format!("writing {}", ledger_path.display()))?;

    let metrics = compute_run_metrics(&completed.ledger)
        .with_context(|| format!("computing metrics for {run_id}"))?;

    Ok((metrics, completed.end_reason))
}
