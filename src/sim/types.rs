//! Core scheduler types: run configuration and per-tick records.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::params::EntityId;

/// Run configuration of the local scheduler.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use pvsystem_service::sim::types::SimConfig;
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let cfg = SimConfig::new(start, 960);
/// assert_eq!(cfg.time_at(900).to_rfc3339(), "2024-01-01T00:15:00+00:00");
/// ```
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Simulation time at elapsed second zero.
    pub start_time: DateTime<Utc>,
    /// Total simulated duration (seconds).
    pub duration_secs: u64,
}

impl SimConfig {
    /// Creates a new run configuration.
    ///
    /// # Panics
    ///
    /// Panics if `duration_secs` is zero.
    pub fn new(start_time: DateTime<Utc>, duration_secs: u64) -> Self {
        assert!(duration_secs > 0, "duration_secs must be > 0");
        Self {
            start_time,
            duration_secs,
        }
    }

    /// Simulation time after `elapsed_secs`.
    pub fn time_at(&self, elapsed_secs: u64) -> DateTime<Utc> {
        self.start_time + Duration::seconds(elapsed_secs as i64)
    }
}

/// What happened to the output of one calculation invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The result was returned for publication.
    Published,
    /// The result was computed and logged only.
    ComputeOnly,
    /// The calculation failed and the run continued.
    Failed(String),
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Published => write!(f, "published"),
            StepOutcome::ComputeOnly => write!(f, "compute-only"),
            StepOutcome::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// Record of one calculation invocation for one entity.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Simulation time of the tick.
    pub time: DateTime<Utc>,
    /// Step index of the calculation (1-based).
    pub step: usize,
    /// Total steps of the calculation.
    pub total_steps: usize,
    /// Period of the calculation (seconds).
    pub period_secs: u64,
    /// Calculation name.
    pub calculation: &'static str,
    /// Installation the calculation ran for.
    pub entity_id: EntityId,
    /// Irradiance handed to the calculation (W/m²).
    pub irradiance_wm2: Vec<f64>,
    /// Returned power (W); empty unless published.
    pub power_w: Vec<f64>,
    pub outcome: StepOutcome,
}

impl StepResult {
    /// Mean of the returned power samples, `0.0` when there are none.
    pub fn mean_power_w(&self) -> f64 {
        if self.power_w.is_empty() {
            return 0.0;
        }
        self.power_w.iter().sum::<f64>() / self.power_w.len() as f64
    }
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} step {:>3}/{:<3} | {:<38} {} | samples={:>3}  mean={:>9.2} W | {}",
            self.time.format("%Y-%m-%d %H:%M:%S"),
            self.step,
            self.total_steps,
            self.calculation,
            self.entity_id,
            self.irradiance_wm2.len(),
            self.mean_power_w(),
            self.outcome,
        )
    }
}
