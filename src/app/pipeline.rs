//! Shared per-keyword workflow used by every subcommand.
//!
//! fetch -> stitch -> write raw CSVs -> reconcile -> write adjusted CSVs + manifest
//!
//! Sources are passed in so the workflow runs the same against the live client
//! and the in-memory source used by tests.

use std::path::Path;

use chrono::{Local, NaiveDate};
use tracing::info;

use crate::data::RawSeriesSource;
use crate::domain::{AdjustedPoint, AdjustedSeries, DateRange, Resolution, RunConfig};
use crate::error::AppError;
use crate::io::{self, KeywordPaths, RowCounts, RunManifest};
use crate::reconcile::extend::extend_from_source;
use crate::reconcile::{self, RawInputs, Reconciliation};

/// Outputs of reconciling one keyword.
#[derive(Debug, Clone)]
pub struct KeywordRun {
    pub inputs: RawInputs,
    pub reconciliation: Reconciliation,
}

/// Outputs of extending one keyword.
#[derive(Debug, Clone)]
pub struct UpdateRun {
    pub manifest: RunManifest,
    pub daily_added: usize,
    pub weekly_added: usize,
}

/// Fetch and stitch all resolutions for `config.keyword`, then persist them.
pub fn fetch_keyword<S: RawSeriesSource + ?Sized>(source: &S, config: &RunConfig) -> Result<RawInputs, AppError> {
    info!(keyword = %config.keyword, start = %config.range.start, end = %config.range.end, "fetching keyword");
    let inputs = reconcile::fetch_inputs(source, config.range, &config.cadence)?;

    let paths = KeywordPaths::new(&config.data_dir, &config.keyword);
    io::write_raw_csv(&paths.unadjusted(Resolution::Monthly), &inputs.monthly)?;
    io::write_raw_csv(&paths.unadjusted(Resolution::Weekly), &inputs.weekly)?;
    io::write_raw_csv(&paths.unadjusted(Resolution::Daily), &inputs.daily)?;
    info!(dir = %paths.root().display(), "wrote unadjusted series");

    Ok(inputs)
}

/// Read previously fetched raw series for `config.keyword`.
pub fn load_inputs(config: &RunConfig) -> Result<RawInputs, AppError> {
    let paths = KeywordPaths::new(&config.data_dir, &config.keyword);
    Ok(RawInputs {
        monthly: io::read_raw_csv(&paths.unadjusted(Resolution::Monthly), Resolution::Monthly)?,
        weekly: io::read_raw_csv(&paths.unadjusted(Resolution::Weekly), Resolution::Weekly)?,
        daily: io::read_raw_csv(&paths.unadjusted(Resolution::Daily), Resolution::Daily)?,
    })
}

/// Reconcile `inputs` and write the adjusted series plus the manifest.
pub fn adjust_inputs(config: &RunConfig, inputs: RawInputs) -> Result<KeywordRun, AppError> {
    let reconciliation = reconcile::reconcile(&inputs, &config.cadence, config.range.start)?;

    let paths = KeywordPaths::new(&config.data_dir, &config.keyword);
    io::write_adjusted_csv(&paths.adjusted(Resolution::Weekly), &reconciliation.weekly, config.decimals)?;
    io::write_adjusted_csv(&paths.adjusted(Resolution::Daily), &reconciliation.daily, config.decimals)?;

    let manifest = RunManifest {
        tool: "trends".to_string(),
        keyword: config.keyword.clone(),
        range: config.range,
        cadence: config.cadence,
        rows: RowCounts {
            monthly: inputs.monthly.len(),
            weekly: reconciliation.weekly.len(),
            daily: reconciliation.daily.len(),
        },
        diagnostics: reconciliation.diagnostics.clone(),
        last_daily: reconciliation.daily.last().copied(),
        last_weekly: reconciliation.weekly.last().copied(),
        generated_at: Local::now().naive_local(),
    };
    io::write_manifest_json(&paths.manifest(), &manifest)?;
    info!(keyword = %config.keyword, daily = reconciliation.daily.len(), "wrote adjusted series");

    Ok(KeywordRun { inputs, reconciliation })
}

/// Fetch and adjust one keyword of a batch. `None` when its adjusted output
/// already exists and `force` is off.
pub fn run_keyword<S: RawSeriesSource + ?Sized>(
    source: &S,
    config: &RunConfig,
    force: bool,
) -> Result<Option<KeywordRun>, AppError> {
    let paths = KeywordPaths::new(&config.data_dir, &config.keyword);
    if !force && paths.adjusted(Resolution::Daily).exists() {
        info!(keyword = %config.keyword, "adjusted output exists, skipping");
        return Ok(None);
    }

    let inputs = fetch_keyword(source, config)?;
    adjust_inputs(config, inputs).map(Some)
}

/// Extend the stored adjusted series of `keyword` up to `end`.
pub fn update_keyword<S: RawSeriesSource + ?Sized>(
    source: &S,
    data_dir: &Path,
    keyword: &str,
    end: NaiveDate,
    decimals: usize,
) -> Result<UpdateRun, AppError> {
    let paths = KeywordPaths::new(data_dir, keyword);
    let mut manifest = io::read_manifest_json(&paths.manifest())?;
    let cadence = manifest.cadence;

    let daily = with_exact_tail(
        io::read_adjusted_csv(&paths.adjusted(Resolution::Daily), Resolution::Daily)?,
        manifest.last_daily,
    );
    let weekly = with_exact_tail(
        io::read_adjusted_csv(&paths.adjusted(Resolution::Weekly), Resolution::Weekly)?,
        manifest.last_weekly,
    );
    let (daily_before, weekly_before) = (daily.len(), weekly.len());

    let daily = extend_from_source(source, daily, end, cadence.window_span(Resolution::Daily))?;
    let weekly = extend_from_source(source, weekly, end, cadence.window_span(Resolution::Weekly))?;

    io::write_adjusted_csv(&paths.adjusted(Resolution::Daily), &daily, decimals)?;
    io::write_adjusted_csv(&paths.adjusted(Resolution::Weekly), &weekly, decimals)?;

    manifest.range = DateRange {
        start: manifest.range.start,
        end: manifest.range.end.max(end),
    };
    manifest.rows.daily = daily.len();
    manifest.rows.weekly = weekly.len();
    manifest.last_daily = daily.last().copied();
    manifest.last_weekly = weekly.last().copied();
    manifest.generated_at = Local::now().naive_local();
    io::write_manifest_json(&paths.manifest(), &manifest)?;

    let run = UpdateRun {
        manifest,
        daily_added: daily.len() - daily_before,
        weekly_added: weekly.len() - weekly_before,
    };
    info!(keyword, daily_added = run.daily_added, weekly_added = run.weekly_added, "updated adjusted series");
    Ok(run)
}

/// Swap the rounded last CSV row for the manifest's full-precision copy, so
/// extension chains from the exact value.
fn with_exact_tail(mut series: AdjustedSeries, tail: Option<AdjustedPoint>) -> AdjustedSeries {
    if let (Some(last), Some(tail)) = (series.points.last_mut(), tail) {
        if last.date == tail.date {
            *last = tail;
        }
    }
    series
}

/// Keywords listed one per line; blank lines and `#` comments are skipped.
pub fn read_keywords_file(path: &Path) -> Result<Vec<String>, AppError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| AppError::new(3, format!("Failed to read keywords file '{}': {e}", path.display())))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}
