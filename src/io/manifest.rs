//! Read/write the run manifest next to the adjusted series.
//!
//! The manifest records what produced the adjusted files: keyword, requested
//! range, cadence constants, row counts and the anchoring diagnostics. `update`
//! reads it back to learn the cadence of the existing run.

use std::fs::{self, File};
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{AdjustedPoint, CadenceConfig, DateRange};
use crate::error::AppError;
use crate::reconcile::Diagnostics;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowCounts {
    pub monthly: usize,
    pub weekly: usize,
    pub daily: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub tool: String,
    pub keyword: String,
    pub range: DateRange,
    pub cadence: CadenceConfig,
    pub rows: RowCounts,
    pub diagnostics: Diagnostics,
    /// Full-precision last rows; the CSVs are rounded to the output decimals.
    #[serde(default)]
    pub last_daily: Option<AdjustedPoint>,
    #[serde(default)]
    pub last_weekly: Option<AdjustedPoint>,
    pub generated_at: NaiveDateTime,
}

pub fn write_manifest_json(path: &Path, manifest: &RunManifest) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::new(2, format!("Failed to create directory '{}': {e}", parent.display())))?;
    }
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create manifest '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(file, manifest)
        .map_err(|e| AppError::new(2, format!("Failed to write manifest JSON: {e}")))?;

    Ok(())
}

pub fn read_manifest_json(path: &Path) -> Result<RunManifest, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(3, format!("Failed to open manifest '{}': {e}", path.display())))?;
    let manifest: RunManifest =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid manifest JSON: {e}")))?;
    Ok(manifest)
}
