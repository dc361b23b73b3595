//! RTL-SDR hardware receiver.
//!
//! Enable the `hardware` feature to compile with RTL-SDR support. Without it,
//! enumeration returns nothing and opening a device fails with a descriptive
//! error, so both binaries still run against the synthetic source.

#[cfg(feature = "hardware")]
use num_complex::Complex;

use super::ReceiverConfig;
#[cfg(feature = "hardware")]
use super::{iq_from_u8, GainMode, SampleSource};
use crate::error::{Error, Result};

/// Information about an RTL-SDR device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Device index (0-based)
    pub index: u32,
    /// Device name (manufacturer + product)
    pub name: String,
    /// Device serial number
    pub serial: String,
}

/// Enumerate available RTL-SDR devices.
#[cfg(feature = "hardware")]
#[must_use]
pub fn list_devices() -> Vec<DeviceInfo> {
    let count = ::rtlsdr::get_device_count();
    let mut devices = Vec::new();

    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, reason = "device counts are tiny")]
    for i in 0..count {
        let name = ::rtlsdr::get_device_name(i);
        if let Ok(usb_strings) = ::rtlsdr::get_device_usb_strings(i) {
            devices.push(DeviceInfo {
                index: i as u32,
                name,
                serial: usb_strings.serial,
            });
        }
    }

    devices
}

/// Enumerate available RTL-SDR devices (stub when hardware feature is disabled).
#[cfg(not(feature = "hardware"))]
#[must_use]
pub fn list_devices() -> Vec<DeviceInfo> {
    log::warn!("RTL-SDR hardware support not compiled (enable 'hardware' feature)");
    Vec::new()
}

/// RTL-SDR backed [`SampleSource`](super::SampleSource).
#[cfg(feature = "hardware")]
pub struct RtlSdrReceiver {
    device: ::rtlsdr::RTLSDRDevice,
    center_frequency: u32,
    sample_rate: u32,
    ppm_correction: i32,
}

#[cfg(feature = "hardware")]
impl std::fmt::Debug for RtlSdrReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RtlSdrReceiver")
            .field("center_frequency", &self.center_frequency)
            .field("sample_rate", &self.sample_rate)
            .field("ppm_correction", &self.ppm_correction)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "hardware")]
impl RtlSdrReceiver {
    /// Open and configure the RTL-SDR at `config.device_index`.
    pub fn open(config: &ReceiverConfig) -> Result<Self> {
        log::info!("Opening RTL-SDR device {}...", config.device_index);

        let index = i32::try_from(config.device_index).map_err(|e| Error::InvalidParameter {
            field: "device_index",
            value: format!("{} ({e})", config.device_index),
        })?;
        let mut device = ::rtlsdr::open(index)
            .map_err(|e| Error::Device(format!("failed to open RTL-SDR device {index}: {e}")))?;

        // librtlsdr tunes in whole Hz
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "checked against u32 range")]
        let center_frequency = if (0.0..=f64::from(u32::MAX)).contains(&config.center_frequency) {
            config.center_frequency as u32
        } else {
            return Err(Error::InvalidParameter {
                field: "center_frequency",
                value: config.center_frequency.to_string(),
            });
        };

        device
            .set_center_freq(center_frequency)
            .map_err(|e| Error::Device(format!("failed to set center frequency: {e}")))?;
        device
            .set_sample_rate(config.sample_rate)
            .map_err(|e| Error::Device(format!("failed to set sample rate: {e}")))?;

        match config.gain {
            GainMode::Auto => {
                device
                    .set_tuner_gain_mode(false)
                    .map_err(|e| Error::Device(format!("failed to set gain mode: {e}")))?;
            }
            GainMode::Manual(tenths_db) => {
                device
                    .set_tuner_gain_mode(true)
                    .map_err(|e| Error::Device(format!("failed to set gain mode: {e}")))?;
                device
                    .set_tuner_gain(tenths_db)
                    .map_err(|e| Error::Device(format!("failed to set gain: {e}")))?;
            }
        }

        // librtlsdr rejects a correction equal to the current one, which starts at 0
        if config.ppm_correction != 0 {
            device
                .set_freq_correction(config.ppm_correction)
                .map_err(|e| Error::Device(format!("failed to set PPM correction: {e}")))?;
        }

        device
            .reset_buffer()
            .map_err(|e| Error::Device(format!("failed to reset buffer: {e}")))?;

        log::info!("RTL-SDR configured:");
        log::info!("  Center frequency: {:.6} MHz", f64::from(center_frequency) / 1e6);
        log::info!("  Sample rate: {:.3} MHz", f64::from(config.sample_rate) / 1e6);
        log::info!("  Gain: {:?}", config.gain);
        log::info!("  PPM correction: {}", config.ppm_correction);

        Ok(Self {
            device,
            center_frequency,
            sample_rate: config.sample_rate,
            ppm_correction: config.ppm_correction,
        })
    }
}

#[cfg(feature = "hardware")]
impl SampleSource for RtlSdrReceiver {
    fn read_samples(&mut self, n: usize) -> Result<Vec<Complex<f32>>> {
        let wanted = n * 2;
        let mut bytes = Vec::with_capacity(wanted);

        // read_sync may return fewer bytes than asked for; keep reading
        while bytes.len() < wanted {
            // USB transfers must be a multiple of 512 bytes
            let request = (wanted - bytes.len()).next_multiple_of(512);
            let buf = self
                .device
                .read_sync(request)
                .map_err(|e| Error::Device(format!("read failed: {e}")))?;
            if buf.is_empty() {
                return Err(Error::ShortRead {
                    expected: n,
                    actual: bytes.len() / 2,
                });
            }
            bytes.extend_from_slice(&buf);
        }
        bytes.truncate(wanted);

        Ok(iq_from_u8(&bytes))
    }

    fn center_frequency(&self) -> f64 {
        f64::from(self.center_frequency)
    }

    fn sample_rate(&self) -> f64 {
        f64::from(self.sample_rate)
    }

    fn freq_correction(&self) -> i32 {
        self.ppm_correction
    }

    fn set_freq_correction(&mut self, ppm: i32) -> Result<()> {
        if ppm == self.ppm_correction {
            return Ok(());
        }
        self.device
            .set_freq_correction(ppm)
            .map_err(|e| Error::Device(format!("failed to set PPM correction: {e}")))?;
        log::info!("PPM correction changed {} -> {}", self.ppm_correction, ppm);
        self.ppm_correction = ppm;
        Ok(())
    }
}

#[cfg(feature = "hardware")]
impl Drop for RtlSdrReceiver {
    fn drop(&mut self) {
        log::info!("Closing RTL-SDR device");
    }
}

/// Stub implementation when hardware feature is disabled.
#[cfg(not(feature = "hardware"))]
#[derive(Debug)]
pub struct RtlSdrReceiver;

#[cfg(not(feature = "hardware"))]
impl RtlSdrReceiver {
    /// Open an RTL-SDR device (stub when hardware feature is disabled).
    pub fn open(_config: &ReceiverConfig) -> Result<Self> {
        Err(Error::Device(String::from(
            "RTL-SDR hardware support not compiled (enable 'hardware' feature)",
        )))
    }
}

#[cfg(not(feature = "hardware"))]
impl super::SampleSource for RtlSdrReceiver {
    fn read_samples(&mut self, n: usize) -> Result<Vec<num_complex::Complex<f32>>> {
        Err(Error::ShortRead { expected: n, actual: 0 })
    }

    fn center_frequency(&self) -> f64 {
        0.0
    }

    fn sample_rate(&self) -> f64 {
        0.0
    }

    fn freq_correction(&self) -> i32 {
        0
    }

    fn set_freq_correction(&mut self, _ppm: i32) -> Result<()> {
        Ok(())
    }
}

#[cfg(all(test, not(feature = "hardware")))]
mod tests {
    use super::*;

    #[test]
    fn test_open_without_hardware_fails() {
        let err = RtlSdrReceiver::open(&ReceiverConfig::default()).unwrap_err();
        assert!(err.to_string().contains("hardware"));
        assert!(list_devices().is_empty());
    }
}
