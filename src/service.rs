//! PV system calculation service: the calculations a scheduler registers and ticks.
//!
//! Two calculations are declared, both backed by [`crate::transform`]:
//!
//! | calculation | input | output |
//! |---|---|---|
//! | `predict_solar_power` | `solar_irradiance` | `potential_active_power` |
//! | `potential_active_power_up_to_next_day` | `solar_irradiance_up_to_next_day` | `potential_active_power_up_to_next_day` |
//!
//! Every input is one flat sequence of samples per entity per tick.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{EnergySystemModel, PV_INSTALLATION};
use crate::params::{EntityId, ParameterStore};
use crate::transform::{PowerSeries, compute_forecast_horizon, compute_instant};

pub const PREDICT_SOLAR_POWER: &str = "predict_solar_power";
pub const POTENTIAL_ACTIVE_POWER_UP_TO_NEXT_DAY: &str = "potential_active_power_up_to_next_day";

pub const SOLAR_IRRADIANCE: &str = "solar_irradiance";
pub const SOLAR_IRRADIANCE_UP_TO_NEXT_DAY: &str = "solar_irradiance_up_to_next_day";
pub const POTENTIAL_ACTIVE_POWER: &str = "potential_active_power";

/// Esdl type of the profiles publishing irradiance.
const ENVIRONMENTAL_PROFILES: &str = "EnvironmentalProfiles";

/// Named input values handed to a calculation.
pub type ParamBag = HashMap<String, Vec<f64>>;

/// Named output values returned by a calculation.
pub type ResultBag = HashMap<String, Vec<f64>>;

/// Simulation time information for one tick. Used for traceability only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeStepContext {
    /// Simulation wall-clock time of the tick.
    pub simulation_time: DateTime<Utc>,
    /// Step index (1-based).
    pub step: usize,
    /// Total number of steps of the calculation.
    pub total_steps: usize,
}

impl fmt::Display for TimeStepContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (step {}/{})",
            self.simulation_time.to_rfc3339(),
            self.step,
            self.total_steps
        )
    }
}

/// An input the calculation subscribes to.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionDescription {
    pub esdl_type: &'static str,
    pub input_name: &'static str,
    pub input_unit: &'static str,
}

/// An output the calculation publishes.
#[derive(Debug, Clone, PartialEq)]
pub struct PublicationDescription {
    pub global: bool,
    pub esdl_type: &'static str,
    pub output_name: &'static str,
    pub output_unit: &'static str,
}

/// Scheduling metadata of one calculation.
///
/// Opaque to the calculation itself; interpreted by the scheduler only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculationSettings {
    /// Tick cadence (seconds).
    pub period_secs: u64,
    /// One-shot offset applied before the first tick (seconds).
    pub offset_secs: u64,
    pub uninterruptible: bool,
    pub wait_for_current_time_update: bool,
    /// Whether a calculation error aborts the whole run.
    pub terminate_on_error: bool,
    /// Whether results are published; when `false` they are only logged.
    pub publish: bool,
}

impl Default for CalculationSettings {
    fn default() -> Self {
        Self {
            period_secs: 900,
            offset_secs: 0,
            uninterruptible: false,
            wait_for_current_time_update: false,
            terminate_on_error: true,
            publish: true,
        }
    }
}

/// A calculation as registered with the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationDescription {
    pub name: &'static str,
    pub inputs: Vec<SubscriptionDescription>,
    pub outputs: Vec<PublicationDescription>,
    pub settings: CalculationSettings,
}

impl CalculationDescription {
    /// Current-step power prediction.
    pub fn predict_solar_power(settings: CalculationSettings) -> Self {
        Self::vector_to_vector(
            PREDICT_SOLAR_POWER,
            SOLAR_IRRADIANCE,
            POTENTIAL_ACTIVE_POWER,
            settings,
        )
    }

    /// Power prediction over the irradiance horizon up to the next day.
    pub fn potential_active_power_up_to_next_day(settings: CalculationSettings) -> Self {
        Self::vector_to_vector(
            POTENTIAL_ACTIVE_POWER_UP_TO_NEXT_DAY,
            SOLAR_IRRADIANCE_UP_TO_NEXT_DAY,
            POTENTIAL_ACTIVE_POWER_UP_TO_NEXT_DAY,
            settings,
        )
    }

    fn vector_to_vector(
        name: &'static str,
        input_name: &'static str,
        output_name: &'static str,
        settings: CalculationSettings,
    ) -> Self {
        Self {
            name,
            inputs: vec![SubscriptionDescription {
                esdl_type: ENVIRONMENTAL_PROFILES,
                input_name,
                input_unit: "Wm2",
            }],
            outputs: vec![PublicationDescription {
                global: true,
                esdl_type: PV_INSTALLATION,
                output_name,
                output_unit: "W",
            }],
            settings,
        }
    }

    /// Outputs actually published: none for compute-only calculations.
    pub fn published_outputs(&self) -> &[PublicationDescription] {
        if self.settings.publish {
            &self.outputs
        } else {
            &[]
        }
    }
}

/// Calculation service for PV installations.
///
/// Holds the calculation declarations and, once initialized, the resolved
/// [`ParameterStore`]. All tick entry points take `&self`.
#[derive(Debug)]
pub struct PvSystemService {
    calculations: Vec<CalculationDescription>,
    store: Option<ParameterStore>,
}

impl Default for PvSystemService {
    fn default() -> Self {
        Self::new(CalculationSettings::default(), CalculationSettings::default())
    }
}

impl PvSystemService {
    /// Creates a service declaring both calculations.
    ///
    /// # Arguments
    ///
    /// * `instant` - Settings for `predict_solar_power`
    /// * `horizon` - Settings for `potential_active_power_up_to_next_day`
    pub fn new(instant: CalculationSettings, horizon: CalculationSettings) -> Self {
        Self {
            calculations: vec![
                CalculationDescription::predict_solar_power(instant),
                CalculationDescription::potential_active_power_up_to_next_day(horizon),
            ],
            store: None,
        }
    }

    /// Declared calculations in registration order.
    pub fn calculations(&self) -> &[CalculationDescription] {
        &self.calculations
    }

    /// Looks up a declared calculation by name.
    pub fn calculation(&self, name: &str) -> Option<&CalculationDescription> {
        self.calculations.iter().find(|c| c.name == name)
    }

    /// Resolves the physical parameters of `entity_ids` from `model`.
    ///
    /// Must complete before any tick is issued.
    ///
    /// # Errors
    ///
    /// * [`Error::AlreadyInitialized`] on a second call
    /// * [`Error::Resolution`] if an id cannot be resolved
    pub fn init_calculation_service<M>(&mut self, entity_ids: &[EntityId], model: &M) -> Result<()>
    where
        M: EnergySystemModel + ?Sized,
    {
        if self.store.is_some() {
            return Err(Error::AlreadyInitialized);
        }
        info!(entities = entity_ids.len(), "init calculation service");
        self.store = Some(ParameterStore::initialize(entity_ids, model)?);
        Ok(())
    }

    /// Resolved parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] before initialization.
    pub fn parameters(&self) -> Result<&ParameterStore> {
        self.store.as_ref().ok_or(Error::NotInitialized)
    }

    /// Predicts power for the current step from `solar_irradiance`.
    ///
    /// # Errors
    ///
    /// * [`Error::NotInitialized`] before initialization
    /// * [`Error::MissingInput`] if `solar_irradiance` is absent
    /// * any error of [`compute_instant`]
    pub fn predict_solar_power(
        &self,
        params: &ParamBag,
        ctx: &TimeStepContext,
        entity_id: &EntityId,
    ) -> Result<ResultBag> {
        debug!(calculation = PREDICT_SOLAR_POWER, entity_id = %entity_id, %ctx, "calculation started");
        let store = self.parameters()?;
        let irradiance = params
            .get(SOLAR_IRRADIANCE)
            .ok_or(Error::MissingInput {
                calculation: PREDICT_SOLAR_POWER,
                input: SOLAR_IRRADIANCE,
            })?;
        let power = compute_instant(store, irradiance, entity_id)?;

        let mut ret = ResultBag::new();
        ret.insert(POTENTIAL_ACTIVE_POWER.to_string(), power);
        Ok(ret)
    }

    /// Predicts power over the horizon in `solar_irradiance_up_to_next_day`.
    ///
    /// An absent or empty horizon yields an empty result without touching the
    /// installation parameters, even before initialization.
    ///
    /// # Errors
    ///
    /// * [`Error::NotInitialized`] for a non-empty horizon before initialization
    /// * any error of [`compute_forecast_horizon`]
    pub fn potential_active_power_up_to_next_day(
        &self,
        params: &ParamBag,
        ctx: &TimeStepContext,
        entity_id: &EntityId,
    ) -> Result<ResultBag> {
        debug!(
            calculation = POTENTIAL_ACTIVE_POWER_UP_TO_NEXT_DAY,
            entity_id = %entity_id,
            %ctx,
            "calculation started"
        );
        let power = match params.get(SOLAR_IRRADIANCE_UP_TO_NEXT_DAY) {
            Some(horizon) if !horizon.is_empty() => {
                compute_forecast_horizon(self.parameters()?, Some(horizon), entity_id)?
            }
            _ => PowerSeries::new(),
        };

        let mut ret = ResultBag::new();
        ret.insert(POTENTIAL_ACTIVE_POWER_UP_TO_NEXT_DAY.to_string(), power);
        Ok(ret)
    }

    /// Runs the calculation registered under `name`.
    ///
    /// # Returns
    ///
    /// * `Some(results)` - For published calculations
    /// * `None` - For compute-only calculations; the result is logged instead
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownCalculation`] for an undeclared name, or the
    /// calculation's own error.
    pub fn run_calculation(
        &self,
        name: &str,
        params: &ParamBag,
        ctx: &TimeStepContext,
        entity_id: &EntityId,
    ) -> Result<Option<ResultBag>> {
        let calculation = self
            .calculation(name)
            .ok_or_else(|| Error::UnknownCalculation(name.to_string()))?;

        let results = match calculation.name {
            PREDICT_SOLAR_POWER => self.predict_solar_power(params, ctx, entity_id)?,
            POTENTIAL_ACTIVE_POWER_UP_TO_NEXT_DAY => {
                self.potential_active_power_up_to_next_day(params, ctx, entity_id)?
            }
            other => return Err(Error::UnknownCalculation(other.to_string())),
        };

        if calculation.settings.publish {
            Ok(Some(results))
        } else {
            for (output, values) in &results {
                info!(
                    calculation = name,
                    entity_id = %entity_id,
                    %ctx,
                    output = %output,
                    values = ?values,
                    "computed result (not published)"
                );
            }
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::model::{Asset, EnergySystem};

    fn ctx() -> TimeStepContext {
        TimeStepContext {
            simulation_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            step: 1,
            total_steps: 2,
        }
    }

    fn pv() -> EntityId {
        EntityId::from("pv")
    }

    fn initialized(mut service: PvSystemService) -> PvSystemService {
        let es = EnergySystem::with_assets("es", vec![Asset::pv_installation("pv", 14.0, 0.2)]);
        service.init_calculation_service(&[pv()], &es).unwrap();
        service
    }

    fn bag(key: &str, values: Vec<f64>) -> ParamBag {
        let mut bag = ParamBag::new();
        bag.insert(key.to_string(), values);
        bag
    }

    #[test]
    fn declares_both_calculations_in_order() {
        let service = PvSystemService::default();
        let names: Vec<&str> = service.calculations().iter().map(|c| c.name).collect();
        assert_eq!(names, vec![PREDICT_SOLAR_POWER, POTENTIAL_ACTIVE_POWER_UP_TO_NEXT_DAY]);

        let predict = service.calculation(PREDICT_SOLAR_POWER).unwrap();
        assert_eq!(predict.inputs[0].input_name, SOLAR_IRRADIANCE);
        assert_eq!(predict.outputs[0].output_name, POTENTIAL_ACTIVE_POWER);
        assert_eq!(predict.settings.period_secs, 900);
        assert!(predict.settings.terminate_on_error);
    }

    #[test]
    fn predict_solar_power_keys_result_by_output_name() {
        let service = initialized(PvSystemService::default());
        let ret = service
            .predict_solar_power(&bag(SOLAR_IRRADIANCE, vec![25.0]), &ctx(), &pv())
            .unwrap();
        assert_eq!(ret[POTENTIAL_ACTIVE_POWER], vec![70.0]);
    }

    #[test]
    fn predict_solar_power_requires_input() {
        let service = initialized(PvSystemService::default());
        let err = service
            .predict_solar_power(&ParamBag::new(), &ctx(), &pv())
            .unwrap_err();
        assert!(matches!(err, Error::MissingInput { .. }));
    }

    #[test]
    fn horizon_without_input_is_empty() {
        let service = initialized(PvSystemService::default());
        let ret = service
            .potential_active_power_up_to_next_day(&ParamBag::new(), &ctx(), &pv())
            .unwrap();
        assert!(ret[POTENTIAL_ACTIVE_POWER_UP_TO_NEXT_DAY].is_empty());
    }

    #[test]
    fn empty_horizon_before_init_is_empty() {
        let service = PvSystemService::default();
        let ret = service
            .potential_active_power_up_to_next_day(
                &bag(SOLAR_IRRADIANCE_UP_TO_NEXT_DAY, Vec::new()),
                &ctx(),
                &pv(),
            )
            .unwrap();
        assert!(ret[POTENTIAL_ACTIVE_POWER_UP_TO_NEXT_DAY].is_empty());

        let ret = service
            .potential_active_power_up_to_next_day(&ParamBag::new(), &ctx(), &pv())
            .unwrap();
        assert!(ret[POTENTIAL_ACTIVE_POWER_UP_TO_NEXT_DAY].is_empty());

        let err = service
            .potential_active_power_up_to_next_day(
                &bag(SOLAR_IRRADIANCE_UP_TO_NEXT_DAY, vec![25.0]),
                &ctx(),
                &pv(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::NotInitialized));
    }

    #[test]
    fn calls_before_init_fail() {
        let service = PvSystemService::default();
        let err = service
            .predict_solar_power(&bag(SOLAR_IRRADIANCE, vec![1.0]), &ctx(), &pv())
            .unwrap_err();
        assert!(matches!(err, Error::NotInitialized));
    }

    #[test]
    fn second_init_is_rejected() {
        let mut service = initialized(PvSystemService::default());
        let es = EnergySystem::with_assets("es", Vec::new());
        let err = service.init_calculation_service(&[], &es).unwrap_err();
        assert!(matches!(err, Error::AlreadyInitialized));
    }

    #[test]
    fn run_calculation_dispatches_by_name() {
        let service = initialized(PvSystemService::default());
        let ret = service
            .run_calculation(
                POTENTIAL_ACTIVE_POWER_UP_TO_NEXT_DAY,
                &bag(SOLAR_IRRADIANCE_UP_TO_NEXT_DAY, vec![25.0, 0.0]),
                &ctx(),
                &pv(),
            )
            .unwrap();
        assert_eq!(
            ret.unwrap()[POTENTIAL_ACTIVE_POWER_UP_TO_NEXT_DAY],
            vec![70.0, 0.0]
        );
    }

    #[test]
    fn run_calculation_unknown_name() {
        let service = initialized(PvSystemService::default());
        let err = service
            .run_calculation("bogus", &ParamBag::new(), &ctx(), &pv())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownCalculation(ref n) if n == "bogus"));
    }

    #[test]
    fn compute_only_returns_nothing_but_still_validates() {
        let compute_only = CalculationSettings {
            publish: false,
            ..CalculationSettings::default()
        };
        let service = initialized(PvSystemService::new(compute_only.clone(), compute_only));
        assert!(
            service
                .calculation(PREDICT_SOLAR_POWER)
                .unwrap()
                .published_outputs()
                .is_empty()
        );

        let ret = service
            .run_calculation(
                PREDICT_SOLAR_POWER,
                &bag(SOLAR_IRRADIANCE, vec![1.0, 2.0]),
                &ctx(),
                &pv(),
            )
            .unwrap();
        assert!(ret.is_none());

        let err = service
            .run_calculation(
                PREDICT_SOLAR_POWER,
                &bag(SOLAR_IRRADIANCE, vec![1.0]),
                &ctx(),
                &EntityId::from("unknown"),
            )
            .unwrap_err();
        assert!(matches!(err, Error::UnknownEntity { .. }));
    }

    #[test]
    fn context_display_includes_step() {
        assert_eq!(ctx().to_string(), "2024-01-01T00:00:00+00:00 (step 1/2)");
    }
}
