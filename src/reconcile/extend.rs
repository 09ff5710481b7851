//! Incremental extension of an already reconciled series.
//!
//! A fresh raw page starting on the last reconciled date carries that date's
//! value forward through its own percentage-change chain, so new rows land on
//! the existing scale without re-running the full reconciliation.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::data::RawSeriesSource;
use crate::domain::{AdjustedPoint, AdjustedSeries, FetchWindow, TimeSeries, WindowSpan};
use crate::error::ReconcileError;
use crate::reconcile::chain::PctChain;

pub fn extend_adjusted(existing: &AdjustedSeries, fresh: &TimeSeries) -> Result<AdjustedSeries, ReconcileError> {
    let resolution = existing.resolution;
    let last = existing
        .last()
        .ok_or_else(|| ReconcileError::invalid(resolution, "no reconciled rows to extend"))?;
    fresh.validate()?;

    let first = fresh.first_date();
    if first != Some(last.date) {
        return Err(ReconcileError::AnchorNotFound {
            resolution,
            detail: format!(
                "fresh page starts at {} but the reconciled series ends at {}",
                first.map(|d| d.to_string()).unwrap_or_default(),
                last.date
            ),
        });
    }

    let chain = PctChain::from_series(fresh);
    let mut points = existing.points.clone();
    let mut value = last.adjusted_value;
    for (idx, sample) in fresh.samples.iter().enumerate().skip(1) {
        value = chain
            .forward(value, idx)
            .ok_or_else(|| ReconcileError::invalid(resolution, format!("no ratio at fresh row {idx}")))?;
        points.push(AdjustedPoint {
            date: sample.date,
            adjusted_value: value,
        });
    }

    info!(%resolution, added = points.len() - existing.len(), "extended reconciled series");
    Ok(AdjustedSeries { resolution, points })
}

/// Extend `existing` up to `end`, one window at a time.
///
/// Every window starts on the current last reconciled date, so each page is
/// chained on its own scale and never mixed with a neighbouring page.
pub fn extend_from_source<S: RawSeriesSource + ?Sized>(
    source: &S,
    existing: AdjustedSeries,
    end: NaiveDate,
    span: WindowSpan,
) -> Result<AdjustedSeries, ReconcileError> {
    let resolution = existing.resolution;
    let mut series = existing;

    loop {
        let last = series
            .last()
            .map(|p| p.date)
            .ok_or_else(|| ReconcileError::invalid(resolution, "no reconciled rows to extend"))?;
        if last >= end {
            return Ok(series);
        }

        let window = FetchWindow {
            start: last,
            end: span.offset(last, 1).map_or(end, |next| next.min(end)),
        };
        debug!(%resolution, %window, "fetching extension window");
        let mut page = source
            .fetch_page(resolution, window)
            .map_err(|source| ReconcileError::SourceFetch {
                resolution,
                window,
                source,
            })?;
        page.samples.retain(|s| s.date <= window.end);
        if page.len() < 2 {
            debug!(%resolution, %window, "no rows past the last reconciled date");
            return Ok(series);
        }

        series = extend_adjusted(&series, &page)?;
    }
}
