//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use pvsystem_service::model::{Asset, EnergySystem};
use pvsystem_service::params::EntityId;
use pvsystem_service::profile::IrradianceSource;
use pvsystem_service::service::{CalculationSettings, PvSystemService, TimeStepContext};
use pvsystem_service::sim::types::SimConfig;

/// Reference installation: 14 m² of panels at 20% efficiency.
pub const REFERENCE_ID: &str = "3a7d4da8-3104-4640-ab70-b6a2b28986fc";

/// Reference irradiance series (W/m²), 49 samples.
pub const REFERENCE_IRRADIANCE: [f64; 49] = [
    8.333333333333334,
    16.666666666666668,
    25.0,
    33.333333333333336,
    59.72222222222223,
    86.11111111111111,
    112.5,
    138.88888888888889,
    174.99999999999997,
    211.1111111111111,
    247.22222222222223,
    283.3333333333333,
    308.3333333333333,
    333.3333333333333,
    358.33333333333326,
    383.3333333333333,
    376.38888888888886,
    369.44444444444446,
    362.5,
    355.55555555555554,
    309.72222222222223,
    263.8888888888889,
    218.0555555555556,
    172.22222222222223,
    188.19444444444443,
    204.16666666666663,
    220.13888888888889,
    236.11111111111111,
    223.6111111111111,
    211.1111111111111,
    198.61111111111111,
    186.1111111111111,
    202.77777777777777,
    219.44444444444443,
    236.11111111111111,
    252.77777777777777,
    270.1388888888889,
    287.5,
    304.8611111111111,
    322.22222222222223,
    334.0277777777778,
    345.8333333333333,
    357.63888888888886,
    369.44444444444446,
    340.2777777777778,
    311.1111111111111,
    281.94444444444446,
    252.77777777777777,
    213.19444444444449,
];

pub fn reference_id() -> EntityId {
    EntityId::from(REFERENCE_ID)
}

/// Start of the reference run (2024-01-01T00:00:00Z).
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Reference run: 960 s from [`start_time`].
pub fn reference_config() -> SimConfig {
    SimConfig::new(start_time(), 960)
}

/// Context of the first of two steps.
pub fn first_step() -> TimeStepContext {
    TimeStepContext {
        simulation_time: start_time(),
        step: 1,
        total_steps: 2,
    }
}

/// Model holding the reference installation plus a non-PV asset.
pub fn reference_model() -> EnergySystem {
    EnergySystem::with_assets(
        "test-system",
        vec![
            Asset::pv_installation(REFERENCE_ID, 14.0, 0.2),
            Asset {
                asset_type: "EConnection".to_string(),
                ..Asset::pv_installation("e-connection", 0.0, 0.0)
            },
        ],
    )
}

/// Service with default settings, initialized for the reference installation.
pub fn reference_service() -> PvSystemService {
    initialized_service(CalculationSettings::default(), CalculationSettings::default())
}

/// Service with the given settings, initialized for the reference installation.
pub fn initialized_service(
    instant: CalculationSettings,
    horizon: CalculationSettings,
) -> PvSystemService {
    let mut service = PvSystemService::new(instant, horizon);
    service
        .init_calculation_service(&[reference_id()], &reference_model())
        .unwrap();
    service
}

/// Expected power for `irradiance` on the reference installation.
pub fn expected_power(irradiance: &[f64]) -> Vec<f64> {
    irradiance.iter().map(|irr| 0.2 * 14.0 * irr).collect()
}

/// Irradiance source replaying the same vectors at every tick.
#[derive(Debug, Clone)]
pub struct FixedSource {
    pub current: Vec<f64>,
    pub horizon: Vec<f64>,
}

impl FixedSource {
    /// Reference series for both the current step and the horizon.
    pub fn reference() -> Self {
        Self {
            current: REFERENCE_IRRADIANCE.to_vec(),
            horizon: REFERENCE_IRRADIANCE.to_vec(),
        }
    }
}

impl IrradianceSource for FixedSource {
    fn current(&mut self, _time: DateTime<Utc>, _period_secs: u64) -> Vec<f64> {
        self.current.clone()
    }

    fn horizon(&mut self, _time: DateTime<Utc>) -> Vec<f64> {
        self.horizon.clone()
    }

    fn source_type(&self) -> &'static str {
        "Fixed"
    }
}
