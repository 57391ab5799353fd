use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::types::{IrradianceSource, SECS_PER_HOUR};
use crate::error::{Error, Result};

/// One recorded sample: seconds since simulation start and irradiance.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct IrradianceSample {
    pub time_offset_secs: u64,
    pub irradiance_wm2: f64,
}

/// Irradiance replayed from a recorded time series.
///
/// Expects a CSV with header `time_offset_secs,irradiance_wm2`. Offsets are
/// relative to the simulation start; rows need not be sorted.
#[derive(Debug, Clone)]
pub struct CsvProfile {
    start_time: DateTime<Utc>,
    horizon_hours: u64,
    samples: Vec<IrradianceSample>,
}

impl CsvProfile {
    /// Creates a profile from already-parsed samples.
    pub fn new(
        start_time: DateTime<Utc>,
        horizon_hours: u64,
        mut samples: Vec<IrradianceSample>,
    ) -> Self {
        samples.sort_by_key(|s| s.time_offset_secs);
        Self {
            start_time,
            horizon_hours,
            samples,
        }
    }

    /// Loads a profile from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Profile`] if the file cannot be opened or a row is malformed.
    pub fn from_path(path: &Path, start_time: DateTime<Utc>, horizon_hours: u64) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| Error::Profile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_reader(file, start_time, horizon_hours).map_err(|e| match e {
            Error::Profile { message, .. } => Error::Profile {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Loads a profile from any CSV reader.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Profile`] if a row is malformed.
    pub fn from_reader(
        reader: impl Read,
        start_time: DateTime<Utc>,
        horizon_hours: u64,
    ) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let mut samples = Vec::new();
        for record in rdr.deserialize() {
            let sample: IrradianceSample = record.map_err(|e| Error::Profile {
                path: "<reader>".into(),
                message: e.to_string(),
            })?;
            samples.push(sample);
        }
        Ok(Self::new(start_time, horizon_hours, samples))
    }

    /// Number of recorded samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Irradiance values with offsets in `[from, to)`.
    fn window(&self, from: u64, to: u64) -> Vec<f64> {
        self.samples
            .iter()
            .filter(|s| s.time_offset_secs >= from && s.time_offset_secs < to)
            .map(|s| s.irradiance_wm2)
            .collect()
    }

    fn offset_secs(&self, time: DateTime<Utc>) -> u64 {
        u64::try_from((time - self.start_time).num_seconds()).unwrap_or(0)
    }
}

impl IrradianceSource for CsvProfile {
    fn current(&mut self, time: DateTime<Utc>, period_secs: u64) -> Vec<f64> {
        let from = self.offset_secs(time);
        self.window(from, from.saturating_add(period_secs))
    }

    fn horizon(&mut self, time: DateTime<Utc>) -> Vec<f64> {
        let from = self.offset_secs(time);
        let horizon_secs = self.horizon_hours.saturating_mul(SECS_PER_HOUR);
        self.window(from, from.saturating_add(horizon_secs))
    }

    fn source_type(&self) -> &'static str {
        "Csv"
    }
}
