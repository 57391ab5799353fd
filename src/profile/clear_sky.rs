use chrono::{DateTime, Duration, Timelike, Utc};
use rand::{SeedableRng, rngs::StdRng};

use super::types::{IrradianceSource, SECS_PER_HOUR, clear_sky_fraction, gaussian_noise};

/// Synthetic irradiance following a half-sine clear-sky curve.
///
/// Irradiance rises from zero at sunrise to `peak_wm2` at solar noon and
/// falls back to zero at sunset. Each sample is multiplied by
/// `1 + noise` (Gaussian, relative) and clamped at zero to mimic passing
/// clouds.
#[derive(Debug, Clone)]
pub struct ClearSkyProfile {
    /// Irradiance at solar noon under clear sky (W/m²).
    pub peak_wm2: f64,

    /// Hour of day when irradiance starts (inclusive).
    pub sunrise_hour: f64,

    /// Hour of day when irradiance ends (exclusive).
    pub sunset_hour: f64,

    /// Standard deviation of the relative noise.
    pub noise_std: f64,

    /// Samples returned per current step.
    samples_per_step: usize,

    /// Length of the forecast horizon (hours); zero disables it.
    horizon_hours: u64,

    /// Spacing of horizon samples (seconds).
    horizon_resolution_secs: u64,

    rng: StdRng,
}

impl ClearSkyProfile {
    /// Creates a new clear-sky profile.
    ///
    /// # Arguments
    ///
    /// * `peak_wm2` - Irradiance at solar noon (negative values are clamped to 0)
    /// * `sunrise_hour` - Hour of day when irradiance starts
    /// * `sunset_hour` - Hour of day when irradiance ends
    /// * `noise_std` - Relative noise standard deviation (e.g., 0.05 for +/-5%)
    /// * `samples_per_step` - Number of samples per current step
    /// * `horizon_hours` - Forecast horizon length, 0 for none
    /// * `horizon_resolution_secs` - Spacing of horizon samples
    /// * `seed` - Random seed for reproducible noise
    ///
    /// # Panics
    ///
    /// Panics if `sunrise_hour >= sunset_hour`, `sunset_hour > 24`,
    /// `samples_per_step == 0` or `horizon_resolution_secs == 0`.
    #[expect(clippy::too_many_arguments)]
    pub fn new(
        peak_wm2: f64,
        sunrise_hour: f64,
        sunset_hour: f64,
        noise_std: f64,
        samples_per_step: usize,
        horizon_hours: u64,
        horizon_resolution_secs: u64,
        seed: u64,
    ) -> Self {
        assert!(sunrise_hour < sunset_hour && sunset_hour <= 24.0);
        assert!(samples_per_step > 0, "samples_per_step must be > 0");
        assert!(horizon_resolution_secs > 0, "horizon_resolution_secs must be > 0");
        Self {
            peak_wm2: peak_wm2.max(0.0),
            sunrise_hour,
            sunset_hour,
            noise_std: noise_std.max(0.0),
            samples_per_step,
            horizon_hours,
            horizon_resolution_secs,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Noisy irradiance at `time`.
    fn sample(&mut self, time: DateTime<Utc>) -> f64 {
        let hour = f64::from(time.num_seconds_from_midnight()) / SECS_PER_HOUR as f64;
        let frac = clear_sky_fraction(hour, self.sunrise_hour, self.sunset_hour);
        if frac <= 0.0 {
            return 0.0;
        }
        let noise_mult = 1.0 + gaussian_noise(&mut self.rng, self.noise_std);
        (self.peak_wm2 * frac * noise_mult).max(0.0)
    }

    fn samples(&mut self, start: DateTime<Utc>, count: usize, spacing_secs: i64) -> Vec<f64> {
        (0..count)
            .map(|i| self.sample(start + Duration::seconds(spacing_secs * i as i64)))
            .collect()
    }
}

impl IrradianceSource for ClearSkyProfile {
    fn current(&mut self, time: DateTime<Utc>, period_secs: u64) -> Vec<f64> {
        let spacing = (period_secs / self.samples_per_step as u64) as i64;
        self.samples(time, self.samples_per_step, spacing)
    }

    fn horizon(&mut self, time: DateTime<Utc>) -> Vec<f64> {
        let horizon_secs = self.horizon_hours.saturating_mul(SECS_PER_HOUR);
        let count = (horizon_secs / self.horizon_resolution_secs) as usize;
        self.samples(time, count, self.horizon_resolution_secs as i64)
    }

    fn source_type(&self) -> &'static str {
        "ClearSky"
    }
}
