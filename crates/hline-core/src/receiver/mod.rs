//! Receiver layer: RTL-SDR configuration and IQ sample acquisition.
//!
//! Every consumer reads samples through the [`SampleSource`] trait so the
//! measurement code never knows whether the samples came from hardware or
//! from the [`SyntheticSource`] used for demos and tests.

mod rtl_sdr;
mod synthetic;

pub use self::rtl_sdr::{list_devices, DeviceInfo, RtlSdrReceiver};
pub use self::synthetic::SyntheticSource;

use num_complex::Complex;

use crate::error::Result;
use crate::HYDROGEN_LINE_HZ;

/// Gain mode for the RTL-SDR tuner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainMode {
    /// Automatic gain control
    Auto,
    /// Manual gain (value in tenths of dB, e.g. 496 = 49.6 dB)
    Manual(i32),
}

impl GainMode {
    /// Manual gain from a value in whole dB.
    #[must_use]
    pub fn from_db(db: f64) -> Self {
        #[allow(clippy::cast_possible_truncation, reason = "tuner gains are well inside i32")]
        Self::Manual((db * 10.0).round() as i32)
    }
}

/// Receiver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiverConfig {
    /// Device index to open
    pub device_index: u32,
    /// Center frequency in Hz
    pub center_frequency: f64,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Tuner gain mode
    pub gain: GainMode,
    /// Frequency correction in PPM
    pub ppm_correction: i32,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            device_index: 0,
            center_frequency: HYDROGEN_LINE_HZ,
            sample_rate: 2_400_000, // 2.4 MHz
            gain: GainMode::Manual(500),
            ppm_correction: 55,
        }
    }
}

/// A source of complex baseband samples.
///
/// Implementations are not required to be `Send`: the RTL-SDR handle wraps a
/// raw device pointer, so sources are opened on the thread that reads them.
pub trait SampleSource {
    /// Read exactly `n` samples.
    fn read_samples(&mut self, n: usize) -> Result<Vec<Complex<f32>>>;

    /// Tuned center frequency in Hz as reported by the receiver.
    fn center_frequency(&self) -> f64;

    /// Sample rate in Hz as reported by the receiver.
    fn sample_rate(&self) -> f64;

    /// Current frequency correction in PPM.
    fn freq_correction(&self) -> i32;

    /// Apply a new frequency correction in PPM.
    fn set_freq_correction(&mut self, ppm: i32) -> Result<()>;
}

/// Open a sample source for the given configuration.
///
/// With `demo` set a real-time paced [`SyntheticSource`] is returned; otherwise the RTL-SDR
/// at `config.device_index` is opened and configured.
pub fn open_source(config: &ReceiverConfig, demo: bool) -> Result<Box<dyn SampleSource>> {
    if demo {
        log::info!("Using synthetic receiver (demo mode)");
        return Ok(Box::new(SyntheticSource::new(config).realtime(true)));
    }
    Ok(Box::new(RtlSdrReceiver::open(config)?))
}

/// Convert interleaved unsigned 8-bit IQ bytes to complex samples in [-1, 1].
///
/// RTL-SDR outputs I, Q, I, Q, ... centred at 127.5.
#[must_use]
pub fn iq_from_u8(buf: &[u8]) -> Vec<Complex<f32>> {
    buf.chunks_exact(2)
        .map(|pair| {
            Complex::new(
                (f32::from(pair[0]) - 127.5) / 127.5,
                (f32::from(pair[1]) - 127.5) / 127.5,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iq_from_u8_range() {
        let samples = iq_from_u8(&[0, 255, 127, 128, 9]);
        // trailing odd byte is dropped
        assert_eq!(samples.len(), 2);
        assert!((samples[0].re + 1.0).abs() < 1e-6);
        assert!((samples[0].im - 1.0).abs() < 1e-6);
        assert!(samples[1].re < 0.0 && samples[1].re > -0.01);
        assert!(samples[1].im > 0.0 && samples[1].im < 0.01);
    }

    #[test]
    fn test_gain_from_db() {
        assert_eq!(GainMode::from_db(49.6), GainMode::Manual(496));
        assert_eq!(GainMode::from_db(50.0), GainMode::Manual(500));
    }

    #[test]
    fn test_default_config_targets_hydrogen_line() {
        let config = ReceiverConfig::default();
        assert!((config.center_frequency - 1_420_405_751.786).abs() < 1e-3);
        assert_eq!(config.sample_rate, 2_400_000);
        assert_eq!(config.ppm_correction, 55);
    }

    #[test]
    fn test_open_demo_source() {
        let mut source = open_source(&ReceiverConfig::default(), true).unwrap();
        assert_eq!(source.read_samples(64).unwrap().len(), 64);
    }
}
