// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Hydrogen line measurement library.
//!
//! This crate holds everything the `hline` desktop application and CLI share
//! for measuring power near the 1420.405751786 MHz neutral hydrogen line:
//!
//! - **Receiver layer**: RTL-SDR configuration and sample acquisition, plus a
//!   synthetic source for running without hardware
//! - **Spectrum layer**: FFT, frequency ordering, DC spike suppression and
//!   continuum power reduction
//! - **Integration layer**: pass counting and per-bin PSD averaging
//! - **Export layer**: timestamped CSV and PDF plot output
//!
//! # Quick Start
//!
//! Measure the continuum power of one block from the synthetic source:
//!
//! ```
//! use hline_core::receiver::{SampleSource, SyntheticSource};
//! use hline_core::spectrum::{continuum_power, CONTINUUM_BLOCK_SIZE};
//! use hline_core::ReceiverConfig;
//!
//! let mut source = SyntheticSource::new(&ReceiverConfig::default());
//! let samples = source.read_samples(CONTINUUM_BLOCK_SIZE / 16).unwrap();
//! let reading = continuum_power(&samples, source.center_frequency(), source.sample_rate()).unwrap();
//! println!("continuum power: {:.2} dB", reading.power_db);
//! ```
//!
//! # Averaged PSD
//!
//! ```
//! use hline_core::integrate::{integrate, IntegrationSettings};
//! use hline_core::receiver::SyntheticSource;
//! use hline_core::ReceiverConfig;
//!
//! let config = ReceiverConfig { sample_rate: 16_384, ..ReceiverConfig::default() };
//! let mut source = SyntheticSource::new(&config);
//! let settings = IntegrationSettings { integration_secs: 1, fft_size: 2048 };
//! let psd = integrate(&mut source, &settings, |_, _| {}).unwrap();
//! assert_eq!(psd.passes, 8);
//! ```

pub mod capture;
pub mod error;
pub mod export;
pub mod integrate;
pub mod receiver;
pub mod spectrum;
pub mod velocity;

pub use capture::{CaptureLog, PowerSample};
pub use error::{Error, Result};
pub use integrate::{AveragedPsd, IntegrationSettings, PsdAccumulator};
pub use receiver::{open_source, GainMode, ReceiverConfig, SampleSource};
pub use spectrum::ContinuumReading;

/// Rest frequency of the neutral hydrogen 21 cm line in Hz.
pub const HYDROGEN_LINE_HZ: f64 = 1_420_405_751.786;

/// Speed of light in m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
