//! Irradiance-to-power transform.
//!
//! Both operations apply the same fixed linear model
//! `power[i] = efficiency * area * irradiance[i]` and differ only in how
//! they treat an empty input.

use crate::error::Result;
use crate::params::{EntityId, ParameterStore, PhysicalParameters};

/// Predicted active power samples (W).
pub type PowerSeries = Vec<f64>;

/// Scales irradiance samples (W/m²) into power samples (W).
///
/// Samples are passed through unchanged in order; negative or non-finite
/// values are not corrected.
pub fn scale(params: &PhysicalParameters, irradiance: &[f64]) -> PowerSeries {
    let factor = params.panel_efficiency * params.surface_area;
    irradiance.iter().map(|irr| factor * irr).collect()
}

/// Predicts power for the current simulation step.
///
/// Parameter checks run regardless of the irradiance content, so an empty
/// input still fails for an invalid installation.
///
/// # Errors
///
/// * [`Error::UnknownEntity`](crate::error::Error::UnknownEntity) if `entity_id` was never initialized
/// * [`Error::InvalidParameter`](crate::error::Error::InvalidParameter) if area or efficiency is not > 0
pub fn compute_instant(
    store: &ParameterStore,
    irradiance: &[f64],
    entity_id: &EntityId,
) -> Result<PowerSeries> {
    let params = store.get(entity_id)?;
    params.validate(entity_id)?;
    Ok(scale(params, irradiance))
}

/// Predicts power over a rolling forecast horizon.
///
/// An absent or empty horizon yields an empty series without looking up or
/// validating the installation. Otherwise identical to [`compute_instant`].
///
/// # Errors
///
/// Same as [`compute_instant`], for non-empty horizons only.
pub fn compute_forecast_horizon(
    store: &ParameterStore,
    horizon: Option<&[f64]>,
    entity_id: &EntityId,
) -> Result<PowerSeries> {
    match horizon {
        Some(samples) if !samples.is_empty() => compute_instant(store, samples, entity_id),
        _ => Ok(Vec::new()),
    }
}
