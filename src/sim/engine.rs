//! Local scheduler that ticks the calculation service over simulated time.

use tracing::{debug, error, info};

use crate::error::Result;
use crate::params::EntityId;
use crate::profile::IrradianceSource;
use crate::service::{
    CalculationDescription, ParamBag, PvSystemService, SOLAR_IRRADIANCE,
    SOLAR_IRRADIANCE_UP_TO_NEXT_DAY, TimeStepContext,
};

use super::clock::Clock;
use super::types::{SimConfig, StepOutcome, StepResult};

/// One scheduled invocation of a calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Seconds since the simulation start.
    pub elapsed_secs: u64,
    /// Index of the calculation in the service's declaration order.
    pub calculation: usize,
    /// Step index of the calculation (1-based).
    pub step: usize,
    /// Total steps of the calculation.
    pub total_steps: usize,
}

/// Scheduler owning the service, the irradiance source, and the entities to tick.
///
/// Generic over `S: IrradianceSource` for static dispatch.
pub struct Engine<S: IrradianceSource> {
    config: SimConfig,
    service: PvSystemService,
    source: S,
    entity_ids: Vec<EntityId>,
}

impl<S: IrradianceSource> Engine<S> {
    /// Creates a new scheduler.
    ///
    /// # Arguments
    ///
    /// * `config` - Run start time and duration
    /// * `service` - Calculation service, already initialized for `entity_ids`
    /// * `source` - Irradiance source feeding calculation inputs
    /// * `entity_ids` - Installations ticked at every scheduled time, in order
    pub fn new(
        config: SimConfig,
        service: PvSystemService,
        source: S,
        entity_ids: Vec<EntityId>,
    ) -> Self {
        Self {
            config,
            service,
            source,
            entity_ids,
        }
    }

    /// All ticks of the run, ordered by time and then declaration order.
    pub fn schedule(&self) -> Vec<Tick> {
        let mut ticks = Vec::new();
        for (index, calculation) in self.service.calculations().iter().enumerate() {
            let settings = &calculation.settings;
            let mut clock = Clock::new(
                settings.period_secs,
                settings.offset_secs,
                self.config.duration_secs,
            );
            let total_steps = clock.total();
            clock.run(|step, elapsed_secs| {
                ticks.push(Tick {
                    elapsed_secs,
                    calculation: index,
                    step,
                    total_steps,
                });
            });
        }
        ticks.sort_by_key(|t| (t.elapsed_secs, t.calculation));
        ticks
    }

    /// Executes one tick for every entity.
    ///
    /// # Errors
    ///
    /// Propagates the first calculation error when the calculation is
    /// configured with `terminate_on_error`; otherwise failures are logged
    /// and recorded as [`StepOutcome::Failed`].
    pub fn step(&mut self, tick: &Tick) -> Result<Vec<StepResult>> {
        let calculation = self.service.calculations()[tick.calculation].clone();
        let ctx = TimeStepContext {
            simulation_time: self.config.time_at(tick.elapsed_secs),
            step: tick.step,
            total_steps: tick.total_steps,
        };
        let params = self.inputs(&calculation, &ctx);

        let irradiance_wm2 = calculation
            .inputs
            .first()
            .and_then(|input| params.get(input.input_name))
            .cloned()
            .unwrap_or_default();

        let mut results = Vec::with_capacity(self.entity_ids.len());
        for entity_id in &self.entity_ids {
            let returned = self
                .service
                .run_calculation(calculation.name, &params, &ctx, entity_id);
            let (power_w, outcome) = match returned {
                Ok(Some(mut bag)) => {
                    let output = calculation.outputs[0].output_name;
                    (bag.remove(output).unwrap_or_default(), StepOutcome::Published)
                }
                Ok(None) => (Vec::new(), StepOutcome::ComputeOnly),
                Err(e) if calculation.settings.terminate_on_error => {
                    error!(
                        calculation = calculation.name,
                        entity_id = %entity_id,
                        %ctx,
                        error = %e,
                        "calculation failed, terminating run"
                    );
                    return Err(e);
                }
                Err(e) => {
                    error!(
                        calculation = calculation.name,
                        entity_id = %entity_id,
                        %ctx,
                        error = %e,
                        "calculation failed"
                    );
                    (Vec::new(), StepOutcome::Failed(e.to_string()))
                }
            };

            results.push(StepResult {
                time: ctx.simulation_time,
                step: tick.step,
                total_steps: tick.total_steps,
                period_secs: calculation.settings.period_secs,
                calculation: calculation.name,
                entity_id: entity_id.clone(),
                irradiance_wm2: irradiance_wm2.clone(),
                power_w,
                outcome,
            });
        }
        Ok(results)
    }

    /// Executes every scheduled tick and returns all records.
    ///
    /// # Errors
    ///
    /// See [`Engine::step`].
    pub fn run(&mut self) -> Result<Vec<StepResult>> {
        let ticks = self.schedule();
        info!(
            ticks = ticks.len(),
            entities = self.entity_ids.len(),
            source = self.source.source_type(),
            "starting simulation"
        );
        for calculation in self.service.calculations() {
            debug!(
                calculation = calculation.name,
                period_secs = calculation.settings.period_secs,
                offset_secs = calculation.settings.offset_secs,
                uninterruptible = calculation.settings.uninterruptible,
                wait_for_current_time_update = calculation.settings.wait_for_current_time_update,
                terminate_on_error = calculation.settings.terminate_on_error,
                publish = calculation.settings.publish,
                "registered calculation"
            );
        }

        let mut results = Vec::with_capacity(ticks.len() * self.entity_ids.len());
        for tick in &ticks {
            results.extend(self.step(tick)?);
        }
        Ok(results)
    }

    /// Returns a reference to the calculation service.
    pub fn service(&self) -> &PvSystemService {
        &self.service
    }

    /// Returns a reference to the run configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Builds the input bag of `calculation` from the irradiance source.
    ///
    /// Sampled once per tick and shared by all entities.
    fn inputs(&mut self, calculation: &CalculationDescription, ctx: &TimeStepContext) -> ParamBag {
        let mut params = ParamBag::new();
        for input in &calculation.inputs {
            let values = match input.input_name {
                SOLAR_IRRADIANCE => self
                    .source
                    .current(ctx.simulation_time, calculation.settings.period_secs),
                SOLAR_IRRADIANCE_UP_TO_NEXT_DAY => self.source.horizon(ctx.simulation_time),
                _ => continue,
            };
            params.insert(input.input_name.to_string(), values);
        }
        params
    }
}
