//! FFT and power reductions.
//!
//! Bins are always returned in ascending frequency order, the ordering numpy
//! produces with `argsort(fftfreq(n))`: the most negative frequency first,
//! DC at index `n / 2`.

use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::error::{Error, Result};

/// Samples per continuum power reading (256 Ki, about 109 ms at 2.4 MS/s).
pub const CONTINUUM_BLOCK_SIZE: usize = 256 * 1024;

/// Position in the natural FFT output of the bin that sorts to position `j`.
#[must_use]
pub fn shift_index(n: usize, j: usize) -> usize {
    (j + n.div_ceil(2)) % n
}

/// Normalized bin frequencies (cycles per sample) in ascending order.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "FFT sizes are far below 2^52")]
pub fn fftfreq_sorted(n: usize) -> Vec<f64> {
    let half = (n / 2) as f64;
    (0..n).map(|j| (j as f64 - half) / n as f64).collect()
}

/// Absolute frequency in Hz of sorted bin `j` out of `n`.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "FFT sizes are far below 2^52")]
pub fn bin_frequency(n: usize, j: usize, center_frequency: f64, sample_rate: f64) -> f64 {
    center_frequency + sample_rate * ((j as f64 - (n / 2) as f64) / n as f64)
}

/// Absolute bin frequencies in Hz: `fc + rs * f` for each sorted bin.
#[must_use]
pub fn frequency_axis(n: usize, center_frequency: f64, sample_rate: f64) -> Vec<f64> {
    (0..n).map(|j| bin_frequency(n, j, center_frequency, sample_rate)).collect()
}

/// Reorder a natural-order FFT result into ascending frequency order.
#[must_use]
pub fn to_frequency_order<T: Copy>(natural: &[T]) -> Vec<T> {
    let n = natural.len();
    (0..n).map(|j| natural[shift_index(n, j)]).collect()
}

/// Arithmetic mean; zero for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "bin counts are far below 2^52")]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Replace the strongest bin with the spectrum mean.
///
/// On RTL-SDR receivers the strongest bin is almost always the DC spike at
/// the tuned frequency. Ties resolve to the first maximum. Returns the index
/// that was replaced.
pub fn suppress_peak(power: &mut [f64]) -> Option<usize> {
    let idx = argmax(power)?;
    power[idx] = mean(power);
    Some(idx)
}

fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Convert a linear power to dB.
#[must_use]
pub fn to_db(power: f64) -> f64 {
    10.0 * power.log10()
}

/// Reusable forward FFT of a fixed size producing `|X[k]|²` in natural order.
pub struct Periodogram {
    fft: Arc<dyn Fft<f64>>,
    buffer: Vec<Complex<f64>>,
    scratch: Vec<Complex<f64>>,
}

impl std::fmt::Debug for Periodogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Periodogram").field("size", &self.size()).finish_non_exhaustive()
    }
}

impl Periodogram {
    /// Plan a forward FFT of `size` points.
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidParameter {
                field: "fft_size",
                value: size.to_string(),
            });
        }
        let fft = FftPlanner::new().plan_fft_forward(size);
        let scratch = vec![Complex::default(); fft.get_inplace_scratch_len()];
        Ok(Self {
            fft,
            buffer: vec![Complex::default(); size],
            scratch,
        })
    }

    /// FFT size in points.
    #[must_use]
    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Unnormalized power `|X[k]|²` of `samples`, in natural FFT order.
    pub fn power(&mut self, samples: &[Complex<f32>]) -> Result<Vec<f64>> {
        if samples.len() != self.size() {
            return Err(Error::ShortRead {
                expected: self.size(),
                actual: samples.len(),
            });
        }
        for (dst, src) in self.buffer.iter_mut().zip(samples) {
            *dst = Complex::new(f64::from(src.re), f64::from(src.im));
        }
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);
        Ok(self.buffer.iter().map(Complex::norm_sqr).collect())
    }
}

/// One continuum power measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuumReading {
    /// Total power across the band in dB
    pub power_db: f64,
    /// Total linear power across the band
    pub total_power: f64,
    /// Frequency of the strongest bin after spike suppression, in Hz
    pub peak_frequency: f64,
}

/// Reduces sample blocks to continuum power readings.
#[derive(Debug)]
pub struct ContinuumMeter {
    periodogram: Periodogram,
}

impl ContinuumMeter {
    /// Create a meter for blocks of `block_size` samples.
    pub fn new(block_size: usize) -> Result<Self> {
        Ok(Self {
            periodogram: Periodogram::new(block_size)?,
        })
    }

    /// Block size in samples.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.periodogram.size()
    }

    /// Measure the continuum power of one block.
    ///
    /// The spectrum is normalized by `n²` (FFT scaled by `1/n`, then squared),
    /// the strongest bin is replaced by the mean and all bins are summed.
    pub fn measure(
        &mut self,
        samples: &[Complex<f32>],
        center_frequency: f64,
        sample_rate: f64,
    ) -> Result<ContinuumReading> {
        let n = self.block_size();
        #[allow(clippy::cast_precision_loss, reason = "block sizes are far below 2^52")]
        let norm = (n as f64) * (n as f64);

        let natural = self.periodogram.power(samples)?;
        let mut power: Vec<f64> = to_frequency_order(&natural).into_iter().map(|p| p / norm).collect();
        suppress_peak(&mut power);

        let peak_bin = argmax(&power).unwrap_or(n / 2);
        let total_power: f64 = power.iter().sum();

        Ok(ContinuumReading {
            power_db: to_db(total_power),
            total_power,
            peak_frequency: bin_frequency(n, peak_bin, center_frequency, sample_rate),
        })
    }
}

/// Measure the continuum power of one block of samples.
pub fn continuum_power(
    samples: &[Complex<f32>],
    center_frequency: f64,
    sample_rate: f64,
) -> Result<ContinuumReading> {
    ContinuumMeter::new(samples.len())?.measure(samples, center_frequency, sample_rate)
}

/// Power spectrum of one PSD pass, in ascending frequency order.
///
/// `|X[k]|²` with the DC bin replaced by the spectrum mean, divided by `n`.
pub fn psd_pass(periodogram: &mut Periodogram, samples: &[Complex<f32>]) -> Result<Vec<f64>> {
    let mut natural = periodogram.power(samples)?;
    natural[0] = mean(&natural);

    #[allow(clippy::cast_precision_loss, reason = "FFT sizes are far below 2^52")]
    let n = natural.len() as f64;
    Ok(to_frequency_order(&natural).into_iter().map(|p| p / n).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, reason = "test")]
    fn tone(n: usize, bin: f64, amplitude: f64) -> Vec<Complex<f32>> {
        (0..n)
            .map(|k| {
                let phase = 2.0 * PI * bin * k as f64 / n as f64;
                Complex::new((amplitude * phase.cos()) as f32, (amplitude * phase.sin()) as f32)
            })
            .collect()
    }

    #[test]
    fn test_fftfreq_sorted_even() {
        assert_eq!(fftfreq_sorted(4), vec![-0.5, -0.25, 0.0, 0.25]);
        let order: Vec<usize> = (0..4).map(|j| shift_index(4, j)).collect();
        assert_eq!(order, vec![2, 3, 0, 1]);
    }

    #[test]
    fn test_fftfreq_sorted_odd() {
        assert_eq!(fftfreq_sorted(5), vec![-0.4, -0.2, 0.0, 0.2, 0.4]);
        let order: Vec<usize> = (0..5).map(|j| shift_index(5, j)).collect();
        assert_eq!(order, vec![3, 4, 0, 1, 2]);
    }

    #[test]
    fn test_frequency_axis() {
        let axis = frequency_axis(4, 1000.0, 400.0);
        assert_eq!(axis, vec![800.0, 900.0, 1000.0, 1100.0]);
        assert_eq!(bin_frequency(4, 3, 1000.0, 400.0), axis[3]);
    }

    #[test]
    fn test_suppress_peak_replaces_only_max() {
        let mut power = vec![1.0, 9.0, 2.0, 9.0];
        assert_eq!(suppress_peak(&mut power), Some(1));
        assert_eq!(power, vec![1.0, 5.25, 2.0, 9.0]);
        assert_eq!(suppress_peak(&mut []), None);
    }

    #[test]
    fn test_periodogram_rejects_wrong_length() {
        let mut p = Periodogram::new(8).unwrap();
        assert!(p.power(&[Complex::default(); 4]).is_err());
        assert!(Periodogram::new(0).is_err());
    }

    #[test]
    fn test_tone_lands_in_sorted_bin() {
        let n = 64;
        let mut p = Periodogram::new(n).unwrap();
        let power = to_frequency_order(&p.power(&tone(n, 5.0, 1.0)).unwrap());
        let peak = argmax(&power).unwrap();
        assert_eq!(peak, n / 2 + 5);
        assert!((power[peak] / (n * n) as f64 - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_continuum_power_of_tone() {
        // A tone of amplitude A puts A² in one bin; suppression swaps it for the mean A²/n
        let n = 1024;
        let reading = continuum_power(&tone(n, 100.0, 0.5), 1.42e9, 2.4e6).unwrap();
        let expected = 0.25 / n as f64;
        assert!((reading.total_power - expected).abs() < 1e-9);
        assert!((reading.power_db - to_db(expected)).abs() < 1e-4);
    }

    #[test]
    fn test_continuum_power_ignores_dc_spike() {
        let n = 4096;
        let noise: Vec<Complex<f32>> = tone(n, 300.0, 0.1)
            .into_iter()
            .zip(tone(n, -700.0, 0.05))
            .map(|(a, b)| a + b + Complex::new(0.8, 0.0))
            .collect();
        let reading = continuum_power(&noise, 1000.0, 4096.0).unwrap();
        // DC removed, the 300-bin tone is the strongest remaining bin
        assert!((reading.peak_frequency - 1300.0).abs() < 1e-9);
        let expected = 0.01 + 0.0025 + (0.64 + 0.01 + 0.0025) / n as f64;
        assert!((reading.total_power - expected).abs() < 1e-6);
    }

    #[test]
    fn test_psd_pass_replaces_dc_bin() {
        let n = 16;
        let samples = vec![Complex::new(1.0f32, 0.0); n];
        let mut p = Periodogram::new(n).unwrap();
        let psd = psd_pass(&mut p, &samples).unwrap();
        // DC was n² and is replaced by the mean n²/n = n; dividing by n leaves 1
        assert_eq!(psd.len(), n);
        assert!((psd[n / 2] - 1.0).abs() < 1e-9);
        assert!(psd.iter().enumerate().all(|(i, &v)| i == n / 2 || v.abs() < 1e-9));
    }
}
