//! TOML-based service configuration and preset definitions.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use crate::error::Result;
use crate::params::EntityId;
use crate::profile::csv_profile::CsvProfile;
use crate::profile::{ClearSkyProfile, Profile};
use crate::service::{CalculationSettings, PvSystemService};
use crate::sim::types::SimConfig;

/// Installation used by the reference deployment.
pub const REFERENCE_ENTITY_ID: &str = "3a7d4da8-3104-4640-ab70-b6a2b28986fc";

/// Longest accepted forecast horizon (one week).
pub const MAX_HORIZON_HOURS: u64 = 168;

/// Top-level service configuration parsed from TOML.
///
/// All fields have defaults matching the baseline deployment. Load from
/// TOML with [`ServiceConfig::from_toml_file`] or use
/// [`ServiceConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Run start and duration.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Energy-system model and the installations to serve.
    #[serde(default)]
    pub model: ModelConfig,
    /// Scheduling metadata of both calculations.
    #[serde(default)]
    pub calculations: CalculationsConfig,
    /// Irradiance source feeding the calculations.
    #[serde(default)]
    pub irradiance: IrradianceConfig,
}

/// Run start and duration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Simulation time at elapsed second zero, as an RFC 3339 string.
    pub start_time: DateTime<Utc>,
    /// Simulated duration (seconds, must be > 0).
    pub duration_secs: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            start_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().unwrap_or_default(),
            duration_secs: 86_400,
        }
    }
}

/// Energy-system model and the installations to serve.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// JSON energy-system description.
    pub path: PathBuf,
    /// Installations resolved at initialization and ticked every step.
    pub entity_ids: Vec<EntityId>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/energy_system.json"),
            entity_ids: vec![EntityId::from(REFERENCE_ENTITY_ID)],
        }
    }
}

/// Scheduling metadata of both calculations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalculationsConfig {
    pub predict_solar_power: CalculationSettings,
    pub potential_active_power_up_to_next_day: CalculationSettings,
}

/// Irradiance source parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IrradianceConfig {
    /// Source type: `"clear_sky"` (synthetic) or `"csv"` (recorded).
    pub source: String,
    /// Clear-sky irradiance at solar noon (W/m²).
    pub peak_wm2: f64,
    /// Hour of day when irradiance starts.
    pub sunrise_hour: f64,
    /// Hour of day when irradiance ends.
    pub sunset_hour: f64,
    /// Relative noise standard deviation.
    pub noise_std: f64,
    /// Random seed for the noise.
    pub seed: u64,
    /// Samples per current step.
    pub samples_per_step: usize,
    /// Forecast horizon length (hours); 0 disables the horizon.
    pub horizon_hours: u64,
    /// Spacing of horizon samples (seconds).
    pub horizon_resolution_secs: u64,
    /// Recorded series, required when `source = "csv"`.
    pub csv_path: Option<PathBuf>,
}

impl Default for IrradianceConfig {
    fn default() -> Self {
        Self {
            source: "clear_sky".to_string(),
            peak_wm2: 1000.0,
            sunrise_hour: 6.0,
            sunset_hour: 18.0,
            noise_std: 0.05,
            seed: 42,
            samples_per_step: 1,
            horizon_hours: 24,
            horizon_resolution_secs: 900,
            csv_path: None,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.duration_secs"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl ServiceConfig {
    /// Returns the baseline deployment: both calculations every 15 minutes,
    /// published, aborting on the first error.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the compute-only preset: both calculations run and log their
    /// results but publish nothing, and failures do not stop the run.
    pub fn compute_only() -> Self {
        let settings = CalculationSettings {
            terminate_on_error: false,
            publish: false,
            ..CalculationSettings::default()
        };
        Self {
            calculations: CalculationsConfig {
                predict_solar_power: settings.clone(),
                potential_active_power_up_to_next_day: settings,
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "compute_only"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> std::result::Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "compute_only" => Ok(Self::compute_only()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> std::result::Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.simulation.duration_secs == 0 {
            errors.push(ConfigError {
                field: "simulation.duration_secs".into(),
                message: "must be > 0".into(),
            });
        }

        let m = &self.model;
        if m.entity_ids.is_empty() {
            errors.push(ConfigError {
                field: "model.entity_ids".into(),
                message: "must list at least one installation".into(),
            });
        }
        let mut seen = HashSet::new();
        for id in &m.entity_ids {
            if id.as_str().is_empty() {
                errors.push(ConfigError {
                    field: "model.entity_ids".into(),
                    message: "must not contain empty ids".into(),
                });
            } else if !seen.insert(id.as_str()) {
                errors.push(ConfigError {
                    field: "model.entity_ids".into(),
                    message: format!("duplicate id \"{id}\""),
                });
            }
        }

        let calcs = [
            ("predict_solar_power", &self.calculations.predict_solar_power),
            (
                "potential_active_power_up_to_next_day",
                &self.calculations.potential_active_power_up_to_next_day,
            ),
        ];
        for (name, settings) in calcs {
            if settings.period_secs == 0 {
                errors.push(ConfigError {
                    field: format!("calculations.{name}.period_secs"),
                    message: "must be > 0".into(),
                });
            }
        }

        let irr = &self.irradiance;
        if irr.horizon_hours > MAX_HORIZON_HOURS {
            errors.push(ConfigError {
                field: "irradiance.horizon_hours".into(),
                message: format!("must be <= {MAX_HORIZON_HOURS}"),
            });
        }
        match irr.source.as_str() {
            "clear_sky" => {
                let finite = [
                    ("irradiance.sunrise_hour", irr.sunrise_hour),
                    ("irradiance.sunset_hour", irr.sunset_hour),
                    ("irradiance.peak_wm2", irr.peak_wm2),
                    ("irradiance.noise_std", irr.noise_std),
                ];
                for (field, value) in finite {
                    if !value.is_finite() {
                        errors.push(ConfigError {
                            field: field.into(),
                            message: format!("must be a finite number, got {value}"),
                        });
                    }
                }
                if irr.sunrise_hour >= irr.sunset_hour {
                    errors.push(ConfigError {
                        field: "irradiance.sunrise_hour".into(),
                        message: "must be < irradiance.sunset_hour".into(),
                    });
                }
                if irr.sunrise_hour < 0.0 {
                    errors.push(ConfigError {
                        field: "irradiance.sunrise_hour".into(),
                        message: "must be >= 0".into(),
                    });
                }
                if irr.sunset_hour > 24.0 {
                    errors.push(ConfigError {
                        field: "irradiance.sunset_hour".into(),
                        message: "must be <= 24".into(),
                    });
                }
                if irr.peak_wm2 < 0.0 {
                    errors.push(ConfigError {
                        field: "irradiance.peak_wm2".into(),
                        message: "must be >= 0".into(),
                    });
                }
                if irr.noise_std < 0.0 {
                    errors.push(ConfigError {
                        field: "irradiance.noise_std".into(),
                        message: "must be >= 0".into(),
                    });
                }
                if irr.samples_per_step == 0 {
                    errors.push(ConfigError {
                        field: "irradiance.samples_per_step".into(),
                        message: "must be > 0".into(),
                    });
                }
                if irr.horizon_resolution_secs == 0 {
                    errors.push(ConfigError {
                        field: "irradiance.horizon_resolution_secs".into(),
                        message: "must be > 0".into(),
                    });
                }
            }
            "csv" => {
                if irr.csv_path.is_none() {
                    errors.push(ConfigError {
                        field: "irradiance.csv_path".into(),
                        message: "required when irradiance.source = \"csv\"".into(),
                    });
                }
            }
            other => errors.push(ConfigError {
                field: "irradiance.source".into(),
                message: format!("must be \"clear_sky\" or \"csv\", got \"{other}\""),
            }),
        }

        errors
    }

    /// Run configuration for the local scheduler.
    ///
    /// # Panics
    ///
    /// Panics if `simulation.duration_secs` is zero; call [`Self::validate`] first.
    pub fn sim_config(&self) -> SimConfig {
        SimConfig::new(self.simulation.start_time, self.simulation.duration_secs)
    }

    /// Uninitialized service declaring both calculations with their settings.
    pub fn service(&self) -> PvSystemService {
        PvSystemService::new(
            self.calculations.predict_solar_power.clone(),
            self.calculations.potential_active_power_up_to_next_day.clone(),
        )
    }

    /// Builds the configured irradiance source.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::Error::Profile`] if the CSV series cannot be loaded.
    ///
    /// # Panics
    ///
    /// Panics on clear-sky parameters rejected by [`Self::validate`].
    pub fn build_profile(&self) -> Result<Profile> {
        let irr = &self.irradiance;
        match (irr.source.as_str(), &irr.csv_path) {
            ("csv", Some(path)) => Ok(Profile::Csv(CsvProfile::from_path(
                path,
                self.simulation.start_time,
                irr.horizon_hours,
            )?)),
            _ => Ok(Profile::ClearSky(ClearSkyProfile::new(
                irr.peak_wm2,
                irr.sunrise_hour,
                irr.sunset_hour,
                irr.noise_std,
                irr.samples_per_step,
                irr.horizon_hours,
                irr.horizon_resolution_secs,
                irr.seed,
            ))),
        }
    }
}
