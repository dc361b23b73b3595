//! Synthetic receiver for running without hardware.
//!
//! Produces complex Gaussian noise with a slow gain drift, a DC offset (the
//! spike every RTL-SDR shows at the tuned frequency) and a cluster of weak
//! tones shaped like a hydrogen emission profile around 1420.405751786 MHz.
//! Output is deterministic for a given seed.

use std::f64::consts::PI;
use std::time::{Duration, Instant};

use num_complex::Complex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::{ReceiverConfig, SampleSource};
use crate::error::{Error, Result};
use crate::HYDROGEN_LINE_HZ;

const DEFAULT_SEED: u64 = 0x1420_4057;

/// Number of tones making up the simulated emission profile.
const LINE_TONES: usize = 15;

/// Spacing between simulated emission tones in Hz.
const LINE_TONE_SPACING_HZ: f64 = 7_000.0;

/// Per-component standard deviation of the noise floor.
const NOISE_SIGMA: f32 = 0.1;

/// Period of the simulated continuum drift in seconds of sample time.
const DRIFT_PERIOD_SECS: f64 = 60.0;

#[derive(Debug, Clone, Copy)]
struct Tone {
    offset_hz: f64,
    amplitude: f64,
    phase: f64,
}

/// Deterministic simulated receiver.
#[derive(Debug)]
pub struct SyntheticSource {
    rng: StdRng,
    center_frequency: f64,
    sample_rate: f64,
    ppm_correction: i32,
    dc_offset: Complex<f32>,
    tones: Vec<Tone>,
    sample_index: u64,
    /// Wall-clock pacing start, set when real-time pacing is enabled
    paced_since: Option<Instant>,
}

impl SyntheticSource {
    /// Create a synthetic source tuned like `config`.
    #[must_use]
    pub fn new(config: &ReceiverConfig) -> Self {
        Self::with_seed(config, DEFAULT_SEED)
    }

    /// Create a synthetic source with an explicit RNG seed.
    #[must_use]
    pub fn with_seed(config: &ReceiverConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let line_offset = HYDROGEN_LINE_HZ - config.center_frequency;

        #[allow(clippy::cast_precision_loss, reason = "tone indices are tiny")]
        let tones = (0..LINE_TONES)
            .map(|i| {
                // half-bin offset keeps every tone off the DC bin
                let k = i as f64 - (LINE_TONES / 2) as f64 + 0.5;
                Tone {
                    offset_hz: line_offset + k * LINE_TONE_SPACING_HZ,
                    // Gaussian profile, peak well below the noise floor per sample
                    amplitude: 0.02 * (-(k * k) / 18.0).exp(),
                    phase: rng.gen_range(0.0..2.0 * PI),
                }
            })
            .collect();

        Self {
            rng,
            center_frequency: config.center_frequency,
            sample_rate: f64::from(config.sample_rate),
            ppm_correction: config.ppm_correction,
            dc_offset: Complex::new(0.04, -0.03),
            tones,
            sample_index: 0,
            paced_since: None,
        }
    }

    /// Pace reads to the configured sample rate, like a real receiver.
    #[must_use]
    pub fn realtime(mut self, enabled: bool) -> Self {
        self.paced_since = enabled.then(Instant::now);
        self
    }

    fn pace(&self) {
        let Some(started) = self.paced_since else {
            return;
        };
        #[allow(clippy::cast_precision_loss, reason = "sample counts stay far below 2^52")]
        let due = Duration::from_secs_f64(self.sample_index as f64 / self.sample_rate);
        if let Some(wait) = due.checked_sub(started.elapsed()) {
            std::thread::sleep(wait);
        }
    }
}

impl SampleSource for SyntheticSource {
    fn read_samples(&mut self, n: usize) -> Result<Vec<Complex<f32>>> {
        if self.sample_rate <= 0.0 {
            return Err(Error::InvalidParameter {
                field: "sample_rate",
                value: self.sample_rate.to_string(),
            });
        }

        let mut samples = Vec::with_capacity(n);
        for _ in 0..n {
            #[allow(clippy::cast_precision_loss, reason = "sample counts stay far below 2^52")]
            let t = self.sample_index as f64 / self.sample_rate;
            #[allow(clippy::cast_possible_truncation, reason = "gain drift is a small factor")]
            let drift = (1.0 + 0.1 * (2.0 * PI * t / DRIFT_PERIOD_SECS).sin()) as f32;

            let mut line = Complex::new(0.0f64, 0.0f64);
            for tone in &self.tones {
                line += Complex::from_polar(tone.amplitude, 2.0 * PI * tone.offset_hz * t + tone.phase);
            }

            let re: f32 = self.rng.sample(StandardNormal);
            let im: f32 = self.rng.sample(StandardNormal);
            let noise = Complex::new(re, im) * NOISE_SIGMA;
            #[allow(clippy::cast_possible_truncation, reason = "samples are f32 like the hardware path")]
            let line = Complex::new(line.re as f32, line.im as f32);

            samples.push(noise * drift + line + self.dc_offset);
            self.sample_index += 1;
        }

        self.pace();
        Ok(samples)
    }

    fn center_frequency(&self) -> f64 {
        self.center_frequency
    }

    fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    fn freq_correction(&self) -> i32 {
        self.ppm_correction
    }

    fn set_freq_correction(&mut self, ppm: i32) -> Result<()> {
        self.ppm_correction = ppm;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_for_seed() {
        let config = ReceiverConfig::default();
        let a = SyntheticSource::with_seed(&config, 7).read_samples(256).unwrap();
        let b = SyntheticSource::with_seed(&config, 7).read_samples(256).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dc_offset_present() {
        let mut source = SyntheticSource::new(&ReceiverConfig::default());
        let samples = source.read_samples(65_536).unwrap();
        #[allow(clippy::cast_precision_loss, reason = "test")]
        let mean = samples.iter().sum::<Complex<f32>>() / samples.len() as f32;
        assert!((mean.re - 0.04).abs() < 0.01);
        assert!((mean.im + 0.03).abs() < 0.01);
    }

    #[test]
    fn test_freq_correction_round_trip() {
        let mut source = SyntheticSource::new(&ReceiverConfig::default());
        assert_eq!(source.freq_correction(), 55);
        source.set_freq_correction(12).unwrap();
        assert_eq!(source.freq_correction(), 12);
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let config = ReceiverConfig { sample_rate: 0, ..ReceiverConfig::default() };
        let mut source = SyntheticSource::new(&config);
        assert!(source.read_samples(16).is_err());
    }
}
