//! Fixed-time PSD integration.
//!
//! An integration reads `floor(t * rs / n)` blocks of `n` samples, turns each
//! into a frequency-ordered power spectrum and averages them bin by bin.

use crate::error::{Error, Result};
use crate::receiver::SampleSource;
use crate::spectrum::{frequency_axis, psd_pass, to_db, Periodogram};
use crate::velocity::velocity_axis;

/// Default FFT size for PSD passes.
pub const DEFAULT_PSD_FFT_SIZE: usize = 2048;

/// Parameters for one integration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntegrationSettings {
    /// Integration time in whole seconds of sample time
    pub integration_secs: u64,
    /// Samples per pass (FFT size)
    pub fft_size: usize,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            integration_secs: 1,
            fft_size: DEFAULT_PSD_FFT_SIZE,
        }
    }
}

/// Number of passes covering `integration_secs` of samples.
pub fn passes_for(integration_secs: u64, sample_rate: f64, fft_size: usize) -> Result<usize> {
    if fft_size == 0 {
        return Err(Error::InvalidParameter {
            field: "fft_size",
            value: fft_size.to_string(),
        });
    }

    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "floor of a positive sample count"
    )]
    let passes = (integration_secs as f64 * sample_rate / fft_size as f64).floor() as usize;

    if passes == 0 {
        return Err(Error::InvalidParameter {
            field: "integration_secs",
            value: format!("{integration_secs} (shorter than one {fft_size}-sample pass)"),
        });
    }
    Ok(passes)
}

/// Running per-bin sum of power spectra.
#[derive(Debug, Clone)]
pub struct PsdAccumulator {
    sums: Vec<f64>,
    passes: usize,
}

impl PsdAccumulator {
    /// Accumulator for spectra of `bins` bins.
    #[must_use]
    pub fn new(bins: usize) -> Self {
        Self {
            sums: vec![0.0; bins],
            passes: 0,
        }
    }

    /// Add one pass.
    pub fn add(&mut self, spectrum: &[f64]) -> Result<()> {
        if spectrum.len() != self.sums.len() {
            return Err(Error::InvalidParameter {
                field: "spectrum",
                value: format!("{} bins, expected {}", spectrum.len(), self.sums.len()),
            });
        }
        for (sum, &p) in self.sums.iter_mut().zip(spectrum) {
            *sum += p;
        }
        self.passes += 1;
        Ok(())
    }

    /// Passes accumulated so far.
    #[must_use]
    pub fn passes(&self) -> usize {
        self.passes
    }

    /// Per-bin mean of everything added.
    pub fn finish(self) -> Result<Vec<f64>> {
        if self.passes == 0 {
            return Err(Error::Empty("no passes accumulated"));
        }
        #[allow(clippy::cast_precision_loss, reason = "pass counts are far below 2^52")]
        let n = self.passes as f64;
        Ok(self.sums.into_iter().map(|s| s / n).collect())
    }
}

/// Result of an integration.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragedPsd {
    /// Bin frequencies in Hz, ascending
    pub frequencies: Vec<f64>,
    /// Mean linear power per bin
    pub power: Vec<f64>,
    /// Number of passes averaged
    pub passes: usize,
}

/// One bin of an [`AveragedPsd`] as written to CSV.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PsdRow {
    pub frequency_hz: f64,
    pub power_db: f64,
    pub velocity_kms: f64,
}

impl AveragedPsd {
    /// Power per bin in dB.
    #[must_use]
    pub fn power_db(&self) -> Vec<f64> {
        self.power.iter().copied().map(to_db).collect()
    }

    /// Radial velocity per bin in km/s.
    #[must_use]
    pub fn velocities(&self) -> Vec<f64> {
        velocity_axis(&self.frequencies)
    }

    /// Per-bin rows in frequency order.
    #[must_use]
    pub fn rows(&self) -> Vec<PsdRow> {
        self.frequencies
            .iter()
            .zip(self.power_db())
            .zip(self.velocities())
            .map(|((&frequency_hz, power_db), velocity_kms)| PsdRow {
                frequency_hz,
                power_db,
                velocity_kms,
            })
            .collect()
    }
}

/// Integrate `settings.integration_secs` of samples from `source`.
///
/// `progress` is called after every pass with `(done, total)`.
pub fn integrate<S, F>(source: &mut S, settings: &IntegrationSettings, mut progress: F) -> Result<AveragedPsd>
where
    S: SampleSource + ?Sized,
    F: FnMut(usize, usize),
{
    let n = settings.fft_size;
    let passes = passes_for(settings.integration_secs, source.sample_rate(), n)?;
    log::info!(
        "Integrating {} s: {} passes of {} samples at {:.3} MHz",
        settings.integration_secs,
        passes,
        n,
        source.sample_rate() / 1e6
    );

    let frequencies = frequency_axis(n, source.center_frequency(), source.sample_rate());
    let mut periodogram = Periodogram::new(n)?;
    let mut accumulator = PsdAccumulator::new(n);

    for done in 1..=passes {
        let samples = source.read_samples(n)?;
        accumulator.add(&psd_pass(&mut periodogram, &samples)?)?;
        progress(done, passes);
    }

    Ok(AveragedPsd {
        frequencies,
        power: accumulator.finish()?,
        passes,
    })
}
