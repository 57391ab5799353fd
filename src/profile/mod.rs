//! Environmental irradiance profiles feeding the calculations.

/// Synthetic clear-sky irradiance with Gaussian noise.
pub mod clear_sky;
/// Irradiance samples recorded in a CSV file.
pub mod csv_profile;
pub mod types;

pub use clear_sky::ClearSkyProfile;
pub use csv_profile::CsvProfile;
pub use types::IrradianceSource;

use chrono::{DateTime, Utc};

/// Irradiance source selected by configuration.
#[derive(Debug, Clone)]
pub enum Profile {
    ClearSky(ClearSkyProfile),
    Csv(CsvProfile),
}

impl IrradianceSource for Profile {
    fn current(&mut self, time: DateTime<Utc>, period_secs: u64) -> Vec<f64> {
        match self {
            Profile::ClearSky(p) => p.current(time, period_secs),
            Profile::Csv(p) => p.current(time, period_secs),
        }
    }

    fn horizon(&mut self, time: DateTime<Utc>) -> Vec<f64> {
        match self {
            Profile::ClearSky(p) => p.horizon(time),
            Profile::Csv(p) => p.horizon(time),
        }
    }

    fn source_type(&self) -> &'static str {
        match self {
            Profile::ClearSky(p) => p.source_type(),
            Profile::Csv(p) => p.source_type(),
        }
    }
}
