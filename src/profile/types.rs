//! Common types and helpers for irradiance profiles.

use chrono::{DateTime, Utc};
use rand::{Rng, rngs::StdRng};

/// Seconds in one hour.
pub const SECS_PER_HOUR: u64 = 3600;

/// A source of irradiance samples (W/m²) for the calculation inputs.
///
/// Stands in for the environmental profiles publisher: every tick the
/// scheduler asks for the samples of the current step and, separately, for
/// the rolling horizon up to the next day.
pub trait IrradianceSource {
    /// Returns the samples covering `[time, time + period_secs)`.
    fn current(&mut self, time: DateTime<Utc>, period_secs: u64) -> Vec<f64>;

    /// Returns the samples of the forecast horizon starting at `time`.
    ///
    /// May be empty when no forecast is available.
    fn horizon(&mut self, time: DateTime<Utc>) -> Vec<f64>;

    /// Returns a human-readable type name for the source.
    fn source_type(&self) -> &'static str;
}

/// Fraction of peak irradiance at `hour` (fractional hour of day).
///
/// Half-sine between sunrise (inclusive) and sunset (exclusive), zero at
/// night.
pub fn clear_sky_fraction(hour: f64, sunrise_hour: f64, sunset_hour: f64) -> f64 {
    if hour < sunrise_hour || hour >= sunset_hour {
        return 0.0;
    }
    let x = (hour - sunrise_hour) / (sunset_hour - sunrise_hour);
    (std::f64::consts::PI * x).sin().max(0.0)
}

/// Gaussian noise with mean 0 via the Box-Muller transform.
///
/// Returns 0.0 for a non-positive `std_dev`.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn clear_sky_is_zero_at_night() {
        assert_eq!(clear_sky_fraction(0.0, 6.0, 18.0), 0.0);
        assert_eq!(clear_sky_fraction(5.99, 6.0, 18.0), 0.0);
        assert_eq!(clear_sky_fraction(18.0, 6.0, 18.0), 0.0);
        assert_eq!(clear_sky_fraction(23.5, 6.0, 18.0), 0.0);
    }

    #[test]
    fn clear_sky_peaks_at_solar_noon_and_is_symmetric() {
        assert!((clear_sky_fraction(12.0, 6.0, 18.0) - 1.0).abs() < 1e-12);
        assert!((clear_sky_fraction(9.0, 6.0, 18.0) - clear_sky_fraction(15.0, 6.0, 18.0)).abs() < 1e-12);
    }

    #[test]
    fn zero_std_dev_gives_no_noise() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(gaussian_noise(&mut rng, 0.0), 0.0);
        assert_eq!(gaussian_noise(&mut rng, -1.0), 0.0);
    }

    #[test]
    fn noise_is_reproducible_for_same_seed() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(gaussian_noise(&mut a, 0.1), gaussian_noise(&mut b, 0.1));
        }
    }
}
