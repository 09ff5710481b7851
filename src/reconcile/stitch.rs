//! Window planning and page stitching.
//!
//! The source only serves a limited time span per request at a given
//! resolution, so long histories arrive as consecutive pages whose windows
//! share one boundary date. Stitching concatenates the pages in fetch order and
//! drops the accumulated copy of that boundary row.

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::data::RawSeriesSource;
use crate::domain::{DateRange, FetchWindow, Resolution, Sample, TimeSeries, WindowSpan};
use crate::error::{FetchError, ReconcileError};

/// Plan the successive windows covering `range`.
///
/// Window `k` starts `k` spans after `range.start` and ends where window
/// `k + 1` starts. Planning stops at the first window starting after
/// `range.end`. [`WindowSpan::Whole`] yields the single window `[start, end]`.
pub fn plan_windows(range: DateRange, span: WindowSpan) -> Vec<FetchWindow> {
    if range.start > range.end {
        return Vec::new();
    }
    if span == WindowSpan::Whole {
        return vec![FetchWindow {
            start: range.start,
            end: range.end,
        }];
    }

    let mut windows = Vec::new();
    let mut k = 0u32;
    while let Some(start) = span.offset(range.start, k) {
        if start > range.end {
            break;
        }
        let Some(end) = span.offset(range.start, k + 1) else {
            break;
        };
        windows.push(FetchWindow { start, end });
        k += 1;
    }
    windows
}

/// Concatenate pages in fetch order into one series.
///
/// Before page `N + 1` is appended, accumulated rows dated on or after its
/// first date are dropped. Rows after `end` are trimmed from the result. An
/// empty page fails the whole resolution.
pub fn stitch_pages(
    resolution: Resolution,
    pages: Vec<TimeSeries>,
    end: NaiveDate,
) -> Result<TimeSeries, ReconcileError> {
    let mut samples: Vec<Sample> = Vec::new();

    for (page_idx, page) in pages.into_iter().enumerate() {
        let Some(first) = page.first_date() else {
            return Err(ReconcileError::invalid(resolution, format!("page {page_idx} has no rows")));
        };
        page.validate()?;

        let before = samples.len();
        while samples.last().is_some_and(|s| s.date >= first) {
            samples.pop();
        }
        if samples.len() != before {
            debug!(
                %resolution,
                page = page_idx,
                dropped = before - samples.len(),
                "dropped overlapping boundary rows"
            );
        }
        samples.extend(page.samples);
    }

    samples.retain(|s| s.date <= end);

    let series = TimeSeries::new(resolution, samples);
    series.validate()?;
    Ok(series)
}

/// Fetch every window of `range` from `source` and stitch the pages.
///
/// The first failing page aborts the whole resolution.
pub fn stitch<S: RawSeriesSource + ?Sized>(
    source: &S,
    resolution: Resolution,
    range: DateRange,
    span: WindowSpan,
) -> Result<TimeSeries, ReconcileError> {
    let windows = plan_windows(range, span);
    info!(%resolution, windows = windows.len(), "fetching pages");

    let mut pages = Vec::with_capacity(windows.len());
    for window in windows {
        debug!(%resolution, %window, "fetching window");
        let page = source
            .fetch_page(resolution, window)
            .and_then(|page| {
                if page.is_empty() {
                    Err(FetchError::Csv("window returned no rows".to_string()))
                } else {
                    Ok(page)
                }
            })
            .map_err(|source| ReconcileError::SourceFetch {
                resolution,
                window,
                source,
            })?;
        pages.push(page);
    }

    let series = stitch_pages(resolution, pages, range.end)?;
    info!(%resolution, rows = series.len(), "stitched series");
    Ok(series)
}
