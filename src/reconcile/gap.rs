//! Backward gap filling.
//!
//! A gap is a run of unresolved rows followed by a resolved one. The run is
//! filled right to left by undoing the forward relation:
//! `value[k - 1] = value[k] / ratio(k)`.

use tracing::debug;

use crate::domain::{AdjustedPoint, AdjustedSeries};
use crate::error::ReconcileError;
use crate::reconcile::daily::PartialSeries;

#[derive(Debug, Clone, PartialEq)]
pub struct GapFill {
    pub series: AdjustedSeries,
    pub gaps: usize,
    pub filled_rows: usize,
}

/// Resolve every unresolved row of `partial`.
///
/// Fails with [`ReconcileError::UnfillableGap`] when unresolved rows run to the
/// end of the series, since nothing follows them to propagate back from.
pub fn fill_gaps(partial: PartialSeries) -> Result<GapFill, ReconcileError> {
    let PartialSeries {
        resolution,
        dates,
        mut values,
        chain,
    } = partial;
    let n = values.len();

    let mut gaps = 0;
    let mut filled_rows = 0;
    let mut i = 0;
    while i < n {
        if values[i].is_some() {
            i += 1;
            continue;
        }

        let unfillable = || ReconcileError::UnfillableGap {
            resolution,
            from: dates[i],
            to: dates[n - 1],
        };
        let (next, mut known) = (i + 1..n)
            .find_map(|k| values[k].map(|v| (k, v)))
            .ok_or_else(unfillable)?;

        for k in (i + 1..=next).rev() {
            known = chain.backward(known, k).ok_or_else(unfillable)?;
            values[k - 1] = Some(known);
        }

        debug!(%resolution, from = %dates[i], to = %dates[next - 1], rows = next - i, "filled gap");
        gaps += 1;
        filled_rows += next - i;
        i = next + 1;
    }

    let points = dates
        .into_iter()
        .zip(values)
        .map(|(date, value)| {
            value.map(|adjusted_value| AdjustedPoint { date, adjusted_value })
        })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| ReconcileError::AnchorNotFound {
            resolution,
            detail: "unresolved rows remain after gap filling".to_string(),
        })?;

    Ok(GapFill {
        series: AdjustedSeries { resolution, points },
        gaps,
        filled_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Resolution;
    use crate::reconcile::chain::PctChain;
    use crate::test_support::d;
    use chrono::{Days, NaiveDate};

    fn partial(raw: &[f64], values: Vec<Option<f64>>) -> PartialSeries {
        let start = d(2004, 1, 1);
        PartialSeries {
            resolution: Resolution::Daily,
            dates: (0..raw.len() as u64).map(|i| start + Days::new(i)).collect(),
            values,
            chain: PctChain::from_values(raw.iter().copied()),
        }
    }

    #[test]
    fn fills_leading_gap_backwards() {
        let raw = [10.0, 20.0, 40.0, 20.0];
        let filled = fill_gaps(partial(&raw, vec![None, None, Some(8.0), Some(4.0)])).unwrap();

        let values: Vec<_> = filled.series.points.iter().map(|p| p.adjusted_value).collect();
        assert_eq!(values, vec![2.0, 4.0, 8.0, 4.0]);
        assert_eq!(filled.gaps, 1);
        assert_eq!(filled.filled_rows, 2);
    }

    #[test]
    fn filled_values_reproduce_the_anchor_going_forward() {
        let raw = [37.0, 0.0, 53.0, 61.0, 29.0, 44.0, 47.0];
        let chain = PctChain::from_values(raw);
        let values = vec![None, None, None, None, Some(13.7), None, Some(3.3)];

        let filled = fill_gaps(partial(&raw, values)).unwrap();

        let out: Vec<_> = filled.series.points.iter().map(|p| p.adjusted_value).collect();
        for i in [0, 1, 2, 3, 5] {
            let forward = out[i] * chain.ratio(i + 1).unwrap();
            assert!(
                (forward - out[i + 1]).abs() <= 1e-12 * out[i + 1].abs(),
                "row {i}: {forward} vs {}",
                out[i + 1]
            );
        }
        assert_eq!(out[4], 13.7);
        assert_eq!(out[6], 3.3);
        assert_eq!(filled.gaps, 2);
        assert_eq!(filled.filled_rows, 5);
    }

    #[test]
    fn trailing_gap_is_an_error() {
        let raw = [10.0, 20.0, 30.0, 40.0];
        let err = fill_gaps(partial(&raw, vec![Some(1.0), Some(2.0), None, None])).unwrap_err();

        match err {
            ReconcileError::UnfillableGap { resolution, from, to } => {
                assert_eq!(resolution, Resolution::Daily);
                assert_eq!(from, d(2004, 1, 3));
                assert_eq!(to, d(2004, 1, 4));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fully_unresolved_series_terminates_with_error() {
        let raw = [10.0; 5];
        let err = fill_gaps(partial(&raw, vec![None; 5])).unwrap_err();
        assert!(matches!(err, ReconcileError::UnfillableGap { .. }));

        let empty = PartialSeries {
            resolution: Resolution::Daily,
            dates: Vec::<NaiveDate>::new(),
            values: Vec::new(),
            chain: PctChain::from_values([]),
        };
        assert!(fill_gaps(empty).unwrap().series.is_empty());
    }
}
