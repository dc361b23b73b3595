//! CSV writers.
//!
//! Files carry no header row, matching the column layouts below:
//!
//! - continuum: `timestamp, power_db`
//! - PSD: `frequency_hz, power_db, velocity_kms`

use std::io::Write;
use std::path::Path;

use ::csv::WriterBuilder;

use crate::capture::CaptureLog;
use crate::error::Result;
use crate::integrate::AveragedPsd;

/// Timestamp format for continuum rows.
pub const ROW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

fn writer<W: Write>(inner: W) -> ::csv::Writer<W> {
    WriterBuilder::new().has_headers(false).quote(b'|').from_writer(inner)
}

/// Write continuum readings to any writer.
pub fn write_continuum<W: Write>(inner: W, log: &CaptureLog) -> Result<()> {
    let mut wtr = writer(inner);
    for sample in log.iter() {
        wtr.write_record([
            sample.timestamp.format(ROW_TIMESTAMP_FORMAT).to_string(),
            sample.power_db.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write continuum readings to `path`.
pub fn save_continuum(path: &Path, log: &CaptureLog) -> Result<()> {
    write_continuum(std::fs::File::create(path)?, log)?;
    log::info!("Wrote {} continuum readings to {}", log.len(), path.display());
    Ok(())
}

/// Write an averaged PSD to any writer.
pub fn write_psd<W: Write>(inner: W, psd: &AveragedPsd) -> Result<()> {
    let mut wtr = writer(inner);
    for row in psd.rows() {
        wtr.write_record([
            row.frequency_hz.to_string(),
            row.power_db.to_string(),
            row.velocity_kms.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write an averaged PSD to `path`.
pub fn save_psd(path: &Path, psd: &AveragedPsd) -> Result<()> {
    write_psd(std::fs::File::create(path)?, psd)?;
    log::info!("Wrote {} PSD bins to {}", psd.frequencies.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HYDROGEN_LINE_HZ;
    use chrono::{Local, TimeZone};

    #[test]
    fn test_continuum_rows() {
        let t0 = Local.with_ymd_and_hms(2017, 5, 15, 12, 30, 0).unwrap();
        let mut log = CaptureLog::new();
        log.push(t0, -12.5);
        log.push(t0, -12.25);

        let mut out = Vec::new();
        write_continuum(&mut out, &log).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![
            "2017-05-15 12:30:00.000000,-12.5",
            "2017-05-15 12:30:00.000000,-12.25",
        ]);
    }

    #[test]
    fn test_empty_log_writes_empty_file() {
        let mut out = Vec::new();
        write_continuum(&mut out, &CaptureLog::new()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_psd_rows_to_file() {
        let psd = AveragedPsd {
            frequencies: vec![HYDROGEN_LINE_HZ - 1e6, HYDROGEN_LINE_HZ],
            power: vec![10.0, 100.0],
            passes: 3,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("psd.csv");
        save_psd(&path, &psd).unwrap();

        let mut rdr = ::csv::ReaderBuilder::new().has_headers(false).from_path(&path).unwrap();
        let rows: Vec<Vec<f64>> = rdr
            .records()
            .map(|r| r.unwrap().iter().map(|f| f.parse().unwrap()).collect())
            .collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][1], 10.0);
        assert!((rows[0][2] - 211.061).abs() < 1e-3);
        assert_eq!(rows[1][1], 20.0);
        assert_eq!(rows[1][2], 0.0);
    }
}
