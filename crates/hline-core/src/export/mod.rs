//! Export layer: timestamped CSV and PDF plot files.
//!
//! File names follow `<prefix>_<timestamp>.<ext>`; the timestamp is local
//! time with millisecond resolution and no characters that need quoting on
//! any common filesystem.

pub mod csv;
pub mod plot;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// File name prefix for continuum CSV exports.
pub const CONTINUUM_CSV_PREFIX: &str = "mapper_output";
/// File name prefix for continuum plot exports.
pub const CONTINUUM_PLOT_PREFIX: &str = "cont_plot";
/// File name prefix for PSD exports (both CSV and plot).
pub const PSD_PREFIX: &str = "psd";

/// Timestamp format used in exported file names.
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S%.3f";

/// Build `<dir>/<prefix>_<timestamp>.<ext>`.
#[must_use]
pub fn timestamped_path(dir: &Path, prefix: &str, ext: &str, at: DateTime<Local>) -> PathBuf {
    dir.join(format!("{prefix}_{}.{ext}", at.format(FILE_TIMESTAMP_FORMAT)))
}

/// Output paths for one PSD run; CSV and plot share a timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PsdOutputs {
    pub csv: PathBuf,
    pub plot: PathBuf,
}

impl PsdOutputs {
    #[must_use]
    pub fn new(dir: &Path, at: DateTime<Local>) -> Self {
        Self {
            csv: timestamped_path(dir, PSD_PREFIX, "csv", at),
            plot: timestamped_path(dir, PSD_PREFIX, plot::PLOT_EXTENSION, at),
        }
    }
}
