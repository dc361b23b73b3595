//! Doppler velocity relative to the hydrogen rest frequency.

use crate::{HYDROGEN_LINE_HZ, SPEED_OF_LIGHT};

/// Radial velocity in km/s implied by observing the line at `frequency` Hz.
///
/// Positive values are receding (redshifted below the rest frequency).
#[must_use]
pub fn radial_velocity_kms(frequency: f64) -> f64 {
    SPEED_OF_LIGHT * ((HYDROGEN_LINE_HZ - frequency) / HYDROGEN_LINE_HZ) / 1000.0
}

/// [`radial_velocity_kms`] over a frequency axis.
#[must_use]
pub fn velocity_axis(frequencies: &[f64]) -> Vec<f64> {
    frequencies.iter().copied().map(radial_velocity_kms).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_at_rest_frequency() {
        assert!(radial_velocity_kms(HYDROGEN_LINE_HZ).abs() < 1e-12);
    }

    #[test]
    fn test_sign_and_scale() {
        // 1 MHz below the line is ~211 km/s receding
        let receding = radial_velocity_kms(HYDROGEN_LINE_HZ - 1e6);
        assert!((receding - 211.06).abs() < 0.01);
        assert!(radial_velocity_kms(HYDROGEN_LINE_HZ + 1e6) < 0.0);
    }

    #[test]
    fn test_axis_is_descending_for_ascending_frequencies() {
        let v = velocity_axis(&[1.42e9, 1.4205e9, 1.421e9]);
        assert!(v.windows(2).all(|w| w[0] > w[1]));
    }
}
