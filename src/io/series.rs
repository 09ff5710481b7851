//! CSV persistence for raw and adjusted series.
//!
//! Raw files hold `date,raw_value`; adjusted files hold `date,adjusted_value`.
//! Both are one row per unit, oldest first.

use std::fs::{self, File};
use std::path::Path;

use crate::domain::{AdjustedPoint, AdjustedSeries, Resolution, Sample, TimeSeries};
use crate::error::AppError;

fn create(path: &Path) -> Result<File, AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::new(2, format!("Failed to create directory '{}': {e}", parent.display())))?;
    }
    File::create(path).map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::new(3, format!("Failed to open '{}': {e}", path.display())))
}

pub fn write_raw_csv(path: &Path, series: &TimeSeries) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(create(path)?);
    for sample in &series.samples {
        writer
            .serialize(sample)
            .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))
}

pub fn read_raw_csv(path: &Path, resolution: Resolution) -> Result<TimeSeries, AppError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(open(path)?);
    let samples = reader
        .deserialize::<Sample>()
        .enumerate()
        .map(|(idx, row)| {
            // +2: header line, 1-based numbering
            row.map_err(|e| AppError::new(2, format!("'{}' line {}: {e}", path.display(), idx + 2)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(TimeSeries::new(resolution, samples))
}

pub fn write_adjusted_csv(path: &Path, series: &AdjustedSeries, decimals: usize) -> Result<(), AppError> {
    let write_err = |e: csv::Error| AppError::new(2, format!("Failed to write '{}': {e}", path.display()));

    let mut writer = csv::Writer::from_writer(create(path)?);
    writer.write_record(["date", "adjusted_value"]).map_err(write_err)?;
    for point in &series.points {
        writer
            .write_record([point.date.to_string(), format!("{:.*}", decimals, point.adjusted_value)])
            .map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to write '{}': {e}", path.display())))
}

pub fn read_adjusted_csv(path: &Path, resolution: Resolution) -> Result<AdjustedSeries, AppError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(open(path)?);
    let points = reader
        .deserialize::<AdjustedPoint>()
        .enumerate()
        .map(|(idx, row)| row.map_err(|e| AppError::new(2, format!("'{}' line {}: {e}", path.display(), idx + 2))))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AdjustedSeries { resolution, points })
}
