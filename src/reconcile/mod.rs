//! Coarse-to-fine reconciliation of independently normalized series.
//!
//! The pipeline is a chain of pure passes, each consuming the finished output
//! of the previous one:
//!
//! 1. `stitch`: pages of one resolution -> one raw series
//! 2. `weekly`: monthly + weekly raw -> adjusted weekly
//! 3. `daily`: daily raw + adjusted weekly -> partially resolved daily
//! 4. `gap`: partial daily -> fully resolved daily
//!
//! `extend` grows an existing reconciled series with freshly fetched rows.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::data::RawSeriesSource;
use crate::domain::{AdjustedSeries, CadenceConfig, DateRange, Resolution, TimeSeries};
use crate::error::ReconcileError;

pub mod chain;
pub mod daily;
pub mod extend;
pub mod gap;
pub mod stitch;
pub mod weekly;

pub use daily::IncrementReport;

/// The three stitched raw series of one keyword.
#[derive(Debug, Clone, PartialEq)]
pub struct RawInputs {
    pub monthly: TimeSeries,
    pub weekly: TimeSeries,
    pub daily: TimeSeries,
}

/// Anchoring and gap statistics of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub weekly_anchors: Vec<usize>,
    pub increments: Vec<IncrementReport>,
    pub gaps: usize,
    pub gap_rows_filled: usize,
}

impl Diagnostics {
    pub fn increments_missed(&self) -> usize {
        self.increments.iter().filter(|inc| inc.anchor.is_none()).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub weekly: AdjustedSeries,
    pub daily: AdjustedSeries,
    pub diagnostics: Diagnostics,
}

/// Fetch and stitch all three resolutions, coarsest first.
pub fn fetch_inputs<S: RawSeriesSource + ?Sized>(
    source: &S,
    range: DateRange,
    cadence: &CadenceConfig,
) -> Result<RawInputs, ReconcileError> {
    let fetch = |resolution: Resolution| stitch::stitch(source, resolution, range, cadence.window_span(resolution));
    let monthly = fetch(Resolution::Monthly)?;
    let weekly = fetch(Resolution::Weekly)?;
    let daily = fetch(Resolution::Daily)?;
    Ok(RawInputs { monthly, weekly, daily })
}

/// Reconcile stitched inputs into one continuous daily series.
///
/// Either every daily row is resolved or the run fails; partial output is
/// never returned.
pub fn reconcile(
    inputs: &RawInputs,
    cadence: &CadenceConfig,
    start: NaiveDate,
) -> Result<Reconciliation, ReconcileError> {
    let weekly = weekly::adjust_weekly(&inputs.monthly, &inputs.weekly, cadence)?;
    info!(rows = weekly.series.len(), anchors = weekly.anchors.len(), "weekly pass done");

    let forward = daily::forward_daily(&inputs.daily, &weekly.series, cadence, start)?;
    info!(
        rows = forward.partial.values.len(),
        unresolved = forward.partial.unresolved(),
        increments = forward.increments.len(),
        "daily forward pass done"
    );

    let filled = gap::fill_gaps(forward.partial)?;
    info!(gaps = filled.gaps, rows = filled.filled_rows, "daily gaps filled");

    Ok(Reconciliation {
        weekly: weekly.series,
        daily: filled.series,
        diagnostics: Diagnostics {
            weekly_anchors: weekly.anchors,
            increments: forward.increments,
            gaps: filled.gaps,
            gap_rows_filled: filled.filled_rows,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconcile::chain::PctChain;
    use crate::test_support::{MemorySource, d, synthetic_inputs};
    use proptest::prelude::*;

    #[test]
    fn full_pipeline_resolves_every_day() {
        let inputs = synthetic_inputs(d(2004, 1, 1), 730, |i| 30.0 + ((i * 13) % 47) as f64);

        let out = reconcile(&inputs, &CadenceConfig::default(), d(2004, 1, 1)).unwrap();

        assert_eq!(out.daily.len(), inputs.daily.len());
        assert!(out.daily.points.iter().all(|p| p.adjusted_value.is_finite() && p.adjusted_value > 0.0));
        assert_eq!(out.diagnostics.increments.len(), 4);
        assert_eq!(out.diagnostics.increments_missed(), 0);
        // 2004-01-01 is a Thursday; the first weekly row starts on Sunday the 4th.
        assert_eq!(out.diagnostics.increments[0].anchor, Some(d(2004, 1, 4)));
        assert_eq!(out.daily.points[3].adjusted_value, out.weekly.points[0].adjusted_value);
    }

    #[test]
    fn back_filled_days_chain_into_the_anchor() {
        let inputs = synthetic_inputs(d(2004, 1, 1), 200, |i| if i == 1 { 0.0 } else { 20.0 + (i % 9) as f64 });
        let chain = PctChain::from_series(&inputs.daily);

        let out = reconcile(&inputs, &CadenceConfig::default(), d(2004, 1, 1)).unwrap();

        let values: Vec<_> = out.daily.points.iter().map(|p| p.adjusted_value).collect();
        for i in 0..3 {
            let forward = values[i] * chain.ratio(i + 1).unwrap();
            assert!((forward - values[i + 1]).abs() <= 1e-12 * values[i + 1]);
        }
        // Jan 1-3 and Jul 1-3 precede their increments' first Sunday.
        assert_eq!(out.diagnostics.gap_rows_filled, 6);
        assert_eq!(out.diagnostics.gaps, 2);
    }

    #[test]
    fn increment_boundary_is_back_filled_from_the_next_anchor() {
        let inputs = synthetic_inputs(d(2004, 1, 1), 200, |i| 20.0 + (i % 9) as f64);
        let chain = PctChain::from_series(&inputs.daily);

        let out = reconcile(&inputs, &CadenceConfig::default(), d(2004, 1, 1)).unwrap();

        let at = |date| out.daily.points.iter().position(|p| p.date == date).unwrap();
        let (jun30, jul1, jul4) = (at(d(2004, 6, 30)), at(d(2004, 7, 1)), at(d(2004, 7, 4)));
        let anchor = out.daily.points[jul4].adjusted_value;
        assert_eq!(out.diagnostics.increments[1].anchor, Some(d(2004, 7, 4)));

        // Jul 1 is reached backwards from the Jul 4 anchor...
        let back = (jul1 + 1..=jul4).fold(anchor, |v, k| v / chain.ratio(k).unwrap());
        assert!((back - out.daily.points[jul1].adjusted_value).abs() < 1e-9 * back);

        // ...so it does not continue Jun 30's chain.
        let forward = out.daily.points[jun30].adjusted_value * chain.ratio(jul1).unwrap();
        assert!((forward - out.daily.points[jul1].adjusted_value).abs() > 0.01 * forward);
    }

    #[test]
    fn empty_daily_page_fails_instead_of_leaving_a_hole() {
        let full = synthetic_inputs(d(2004, 1, 1), 540, |i| 5.0 + (i % 20) as f64);
        let range = DateRange {
            start: d(2004, 1, 1),
            end: full.daily.last_date().unwrap(),
        };
        let source = MemorySource::new(vec![full.monthly, full.weekly, full.daily]).empty_at(d(2004, 7, 1));

        let err = fetch_inputs(&source, range, &CadenceConfig::default()).unwrap_err();

        match err {
            ReconcileError::SourceFetch { resolution, window, .. } => {
                assert_eq!(resolution, Resolution::Daily);
                assert_eq!(window.start, d(2004, 7, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reconcile_is_bit_identical_across_runs() {
        let inputs = synthetic_inputs(d(2004, 1, 1), 500, |i| ((i * 31) % 101) as f64);
        let cadence = CadenceConfig::default();

        let a = reconcile(&inputs, &cadence, d(2004, 1, 1)).unwrap();
        let b = reconcile(&inputs, &cadence, d(2004, 1, 1)).unwrap();

        let bits = |s: &AdjustedSeries| s.points.iter().map(|p| p.adjusted_value.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&a.daily), bits(&b.daily));
        assert_eq!(a, b);
    }

    #[test]
    fn missing_trailing_anchor_is_reported_not_truncated() {
        let mut inputs = synthetic_inputs(d(2004, 1, 1), 400, |i| 10.0 + (i % 4) as f64);
        // Weekly data stops before the second increment.
        inputs.weekly.samples.retain(|s| s.date < d(2004, 6, 1));

        let err = reconcile(&inputs, &CadenceConfig::default(), d(2004, 1, 1)).unwrap_err();
        match err {
            ReconcileError::UnfillableGap { resolution, from, .. } => {
                assert_eq!(resolution, Resolution::Daily);
                assert_eq!(from, d(2004, 7, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fetch_inputs_stitches_renormalized_pages() {
        let full = synthetic_inputs(d(2004, 1, 1), 900, |i| 5.0 + (i % 20) as f64);
        let source = MemorySource::new(vec![full.monthly.clone(), full.weekly.clone(), full.daily.clone()]);
        let range = DateRange {
            start: d(2004, 1, 1),
            end: full.daily.last_date().unwrap(),
        };

        let fetched = fetch_inputs(&source, range, &CadenceConfig::default()).unwrap();

        assert_eq!(fetched.daily.len(), full.daily.len());
        assert_eq!(fetched.weekly.first_date(), full.weekly.first_date());
        assert_eq!(fetched.monthly.len(), full.monthly.len());
        assert!(reconcile(&fetched, &CadenceConfig::default(), range.start).is_ok());
    }

    proptest! {
        #[test]
        fn any_covered_history_is_fully_resolved(
            values in prop::collection::vec(0u8..=100, 190..366),
        ) {
            let inputs = synthetic_inputs(d(2004, 1, 1), values.len(), |i| f64::from(values[i]));
            let chain = PctChain::from_series(&inputs.daily);

            let out = reconcile(&inputs, &CadenceConfig::default(), d(2004, 1, 1)).unwrap();

            prop_assert_eq!(out.daily.len(), values.len());
            for (i, pair) in out.daily.points.windows(2).enumerate() {
                prop_assert!(pair[1].adjusted_value.is_finite());
                // An increment's first day and its anchor day restart the chain.
                let restarts = out
                    .diagnostics
                    .increments
                    .iter()
                    .any(|inc| inc.start == pair[1].date || inc.anchor == Some(pair[1].date));
                if !restarts {
                    let forward = pair[0].adjusted_value * chain.ratio(i + 1).unwrap();
                    prop_assert!((forward - pair[1].adjusted_value).abs() <= 1e-9 * pair[1].adjusted_value.abs());
                }
            }
        }
    }
}
