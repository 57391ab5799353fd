//! Post-hoc run summary computed from scheduler records.

use std::collections::BTreeMap;
use std::fmt;

use super::types::{StepOutcome, StepResult};
use crate::params::EntityId;
use crate::profile::types::SECS_PER_HOUR;
use crate::service::PREDICT_SOLAR_POWER;

/// Aggregate figures derived from a complete run.
///
/// Computed post-hoc from `Vec<StepResult>` so the summary always agrees
/// with the per-tick records.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Calculation invocations recorded (one per entity per tick).
    pub ticks_executed: usize,
    /// Invocations that failed without terminating the run.
    pub ticks_failed: usize,
    /// Invocations whose result was returned for publication.
    pub results_published: usize,
    /// Invocations computed and logged only.
    pub results_compute_only: usize,
    /// Highest single power sample across all published results (W).
    pub peak_power_w: f64,
    /// Energy per installation from published current-step results (Wh).
    pub energy_wh: BTreeMap<EntityId, f64>,
}

impl RunSummary {
    /// Computes the summary from the complete record vector.
    ///
    /// Energy treats each current-step series as one mean value held over
    /// the calculation period. Horizon results are forecasts and do not
    /// contribute to energy.
    pub fn from_results(results: &[StepResult]) -> Self {
        let mut summary = Self {
            ticks_executed: results.len(),
            ..Self::default()
        };

        for r in results {
            match r.outcome {
                StepOutcome::Published => summary.results_published += 1,
                StepOutcome::ComputeOnly => summary.results_compute_only += 1,
                StepOutcome::Failed(_) => summary.ticks_failed += 1,
            }
            if r.outcome != StepOutcome::Published {
                continue;
            }

            let peak = r.power_w.iter().copied().fold(0.0_f64, f64::max);
            summary.peak_power_w = summary.peak_power_w.max(peak);

            if r.calculation == PREDICT_SOLAR_POWER {
                let hours = r.period_secs as f64 / SECS_PER_HOUR as f64;
                *summary.energy_wh.entry(r.entity_id.clone()).or_insert(0.0) +=
                    r.mean_power_w() * hours;
            }
        }

        summary
    }

    /// Total energy over all installations (Wh).
    pub fn total_energy_wh(&self) -> f64 {
        self.energy_wh.values().sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Summary ---")?;
        writeln!(f, "Invocations:           {}", self.ticks_executed)?;
        writeln!(f, "Published:             {}", self.results_published)?;
        writeln!(f, "Compute-only:          {}", self.results_compute_only)?;
        writeln!(f, "Failed:                {}", self.ticks_failed)?;
        writeln!(f, "Peak power:            {:.2} W", self.peak_power_w)?;
        for (entity_id, wh) in &self.energy_wh {
            writeln!(f, "Energy {entity_id}: {wh:.2} Wh")?;
        }
        write!(f, "Total energy:          {:.2} Wh", self.total_energy_wh())
    }
}
