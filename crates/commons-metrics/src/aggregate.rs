//! Cross-run aggregation: folding repeated independent runs into the
//! report downstream table and plot generators consume.
//!
//! Aggregation is a pure fold over finished [`RunMetrics`] values -- runs
//! share no state and no ordering, so the statistics are insensitive to
//! the order runs completed in. The report serializes as
//!
//! ```text
//! {
//!   "general": { "survival_rate": ..., "mean_survival": ..., ... },
//!   "<run_id>": { "gains": ..., "survival_time": ..., ... },
//!   ...
//! }
//! ```
//!
//! Standard deviations are population deviations (the whole set of runs
//! is the population being described, not a sample from one).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use commons_types::RunId;

use crate::MetricsError;
use crate::run::RunMetrics;

/// The key of the aggregate section; reserved, never a run id.
const GENERAL_SECTION: &str = "general";

/// Aggregate statistics over a group of runs.
///
/// The field names are the literal keys external consumers expect under
/// the `general` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralStats {
    /// Fraction of runs whose survival time reached the horizon.
    pub survival_rate: f64,
    /// Mean survival time.
    pub mean_survival: f64,
    /// Population standard deviation of survival times.
    pub std_survival: f64,
    /// Mean over runs of the per-run mean per-agent gain.
    pub mean_gains: f64,
    /// Population standard deviation of per-run mean per-agent gains.
    pub std_gains: f64,
    /// Mean efficiency.
    pub mean_efficiency: f64,
    /// Population standard deviation of efficiency.
    pub std_efficiency: f64,
    /// Mean equality.
    pub mean_equality: f64,
    /// Population standard deviation of equality.
    pub std_equality: f64,
    /// Mean over-usage rate.
    pub mean_over_usage: f64,
    /// Population standard deviation of over-usage rates.
    pub std_over_usage: f64,
}

/// The full metrics report for one experimental condition: the aggregate
/// section plus one section per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupReport {
    /// Aggregate statistics over all runs.
    pub general: GeneralStats,
    /// Per-run metrics, keyed by run identifier.
    #[serde(flatten)]
    pub runs: BTreeMap<RunId, RunMetrics>,
}

impl GroupReport {
    /// Serialize the report to its JSON interchange format.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Json`] if serialization fails.
    pub fn to_json(&self) -> Result<String, MetricsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Fraction of runs whose survival time equals the configured horizon;
/// every other run counts as a failure.
///
/// # Errors
///
/// Returns [`MetricsError::NoRuns`] for an empty input.
pub fn survival_rate(survival_times: &[u64], horizon: u64) -> Result<f64, MetricsError> {
    if survival_times.is_empty() {
        return Err(MetricsError::NoRuns);
    }

    let successes = survival_times.iter().filter(|&&t| t == horizon).count();
    Ok(ratio(successes, survival_times.len()))
}

/// Fold per-run metrics into a [`GroupReport`].
///
/// # Errors
///
/// Returns [`MetricsError::NoRuns`] for an empty input,
/// [`MetricsError::ReservedRunId`] if a run is keyed `general`, or an
/// arithmetic error from the per-run derived values.
pub fn aggregate(
    runs: &BTreeMap<RunId, RunMetrics>,
    horizon: u64,
) -> Result<GroupReport, MetricsError> {
    if runs.is_empty() {
        return Err(MetricsError::NoRuns);
    }

    if let Some(run_id) = runs.keys().find(|id| id.as_str() == GENERAL_SECTION) {
        return Err(MetricsError::ReservedRunId {
            run_id: run_id.clone(),
        });
    }

    let mut survival_times = Vec::with_capacity(runs.len());
    let mut survival_values = Vec::with_capacity(runs.len());
    let mut gain_values = Vec::with_capacity(runs.len());
    let mut efficiency_values = Vec::with_capacity(runs.len());
    let mut equality_values = Vec::with_capacity(runs.len());
    let mut over_usage_values = Vec::with_capacity(runs.len());

    for metrics in runs.values() {
        survival_times.push(metrics.survival_time);
        survival_values.push(as_f64_lossy(Decimal::from(metrics.survival_time)));
        gain_values.push(as_f64_lossy(metrics.mean_agent_gain()?));
        efficiency_values.push(as_f64_lossy(metrics.efficiency));
        equality_values.push(as_f64_lossy(metrics.equality));
        over_usage_values.push(as_f64_lossy(metrics.over_usage));
    }

    let general = GeneralStats {
        survival_rate: survival_rate(&survival_times, horizon)?,
        mean_survival: mean(&survival_values),
        std_survival: std_pop(&survival_values),
        mean_gains: mean(&gain_values),
        std_gains: std_pop(&gain_values),
        mean_efficiency: mean(&efficiency_values),
        std_efficiency: std_pop(&efficiency_values),
        mean_equality: mean(&equality_values),
        std_equality: std_pop(&equality_values),
        mean_over_usage: mean(&over_usage_values),
        std_over_usage: std_pop(&over_usage_values),
    };

    Ok(GroupReport {
        general,
        runs: runs.clone(),
    })
}

/// Lossy conversion to `f64` for statistics over finished metrics.
///
/// [`Decimal::to_f64`] is total over the decimal range; the fallback is
/// unreachable and exists to avoid a panicking path.
fn as_f64_lossy(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}

/// `numerator / denominator` as `f64`.
#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    numerator as f64 / denominator as f64
}

/// Arithmetic mean. Callers guarantee a non-empty input.
#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation. Callers guarantee a non-empty input.
fn std_pop(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = mean(
        &values
            .iter()
            .map(|v| (v - m) * (v - m))
            .collect::<Vec<f64>>(),
    );
    variance.sqrt()
}
