//! Continuum capture log.
//!
//! Timestamp and power are stored as pairs so the two series can never fall
//! out of alignment.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local};

/// One continuum power reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerSample {
    /// Local time the block finished reading
    pub timestamp: DateTime<Local>,
    /// Continuum power in dB
    pub power_db: f64,
}

impl PowerSample {
    /// Timestamp as fractional Unix seconds, for plot axes.
    #[must_use]
    #[allow(clippy::cast_precision_loss, reason = "millisecond timestamps fit in f64")]
    pub fn unix_seconds(&self) -> f64 {
        self.timestamp.timestamp_millis() as f64 / 1000.0
    }
}

/// Power readings accumulated during a capture session.
#[derive(Debug, Clone, Default)]
pub struct CaptureLog {
    samples: Vec<PowerSample>,
}

/// Capture log shared between the acquisition thread and the UI.
pub type SharedCaptureLog = Arc<Mutex<CaptureLog>>;

impl CaptureLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty log wrapped for sharing.
    #[must_use]
    pub fn shared() -> SharedCaptureLog {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Append a reading.
    pub fn push(&mut self, timestamp: DateTime<Local>, power_db: f64) {
        self.samples.push(PowerSample { timestamp, power_db });
    }

    /// Discard every reading.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Most recent reading.
    #[must_use]
    pub fn latest(&self) -> Option<&PowerSample> {
        self.samples.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PowerSample> {
        self.samples.iter()
    }

    /// All readings in capture order.
    #[must_use]
    pub fn samples(&self) -> &[PowerSample] {
        &self.samples
    }

    /// `[unix_seconds, power_db]` pairs for plotting.
    #[must_use]
    pub fn plot_points(&self) -> Vec<[f64; 2]> {
        self.samples.iter().map(|s| [s.unix_seconds(), s.power_db]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_push_keeps_alignment() {
        let t0 = Local.with_ymd_and_hms(2017, 5, 15, 12, 0, 0).unwrap();
        let mut log = CaptureLog::new();
        log.push(t0, -3.5);
        log.push(t0 + Duration::milliseconds(110), -3.25);

        assert_eq!(log.len(), 2);
        assert_eq!(log.latest().unwrap().power_db, -3.25);

        let points = log.plot_points();
        assert_eq!(points[0][1], -3.5);
        assert!((points[1][0] - points[0][0] - 0.11).abs() < 1e-3);
    }

    #[test]
    fn test_clear_empties_log() {
        let mut log = CaptureLog::new();
        log.push(Local::now(), 1.0);
        log.clear();
        assert!(log.is_empty());
        assert!(log.latest().is_none());
        assert!(log.plot_points().is_empty());
    }
}
