//! Weekly-from-monthly pass.
//!
//! Every `weekly_anchor_stride`-th weekly row inherits the monthly value
//! `monthly_anchor_stride` rows further along the monthly series; all other
//! weekly rows extend the most recent anchor through the weekly
//! percentage-change chain. Intermediate rows never look ahead to the next
//! anchor.

use tracing::{debug, warn};

use crate::domain::{AdjustedPoint, AdjustedSeries, CadenceConfig, Resolution, TimeSeries};
use crate::error::ReconcileError;
use crate::reconcile::chain::PctChain;

/// Output of the weekly pass.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyAdjustment {
    pub series: AdjustedSeries,
    /// Weekly indices that inherited a monthly value.
    pub anchors: Vec<usize>,
}

pub fn adjust_weekly(
    monthly: &TimeSeries,
    weekly: &TimeSeries,
    cadence: &CadenceConfig,
) -> Result<WeeklyAdjustment, ReconcileError> {
    monthly.validate()?;
    weekly.validate()?;
    cadence
        .validate()
        .map_err(|e| ReconcileError::invalid(Resolution::Weekly, e))?;

    let monthly_chain = PctChain::from_series(monthly);
    let weekly_chain = PctChain::from_series(weekly);

    let mut anchored: Vec<Option<f64>> = vec![None; weekly.len()];
    let mut anchors = Vec::new();

    let mut i = 0usize;
    loop {
        let weekly_idx = i * cadence.weekly_anchor_stride;
        let monthly_idx = i * cadence.monthly_anchor_stride;
        if weekly_idx >= weekly.len() {
            break;
        }
        let Some(value) = monthly_chain.floored(monthly_idx) else {
            warn!(
                weekly_idx,
                monthly_idx,
                monthly_rows = monthly.len(),
                "monthly series ends before weekly anchor, extending from last anchor"
            );
            break;
        };
        debug!(weekly_idx, monthly_idx, value, date = %weekly.samples[weekly_idx].date, "weekly anchor");
        anchored[weekly_idx] = Some(value);
        anchors.push(weekly_idx);
        i += 1;
    }

    if anchors.is_empty() {
        return Err(ReconcileError::AnchorNotFound {
            resolution: Resolution::Weekly,
            detail: "no monthly row available for the first weekly anchor".to_string(),
        });
    }

    let mut points = Vec::with_capacity(weekly.len());
    let mut prev = 0.0;
    for (idx, (sample, slot)) in weekly.samples.iter().zip(&anchored).enumerate() {
        let value = match slot {
            Some(anchor) => *anchor,
            None => weekly_chain
                .forward(prev, idx)
                .ok_or_else(|| ReconcileError::AnchorNotFound {
                    resolution: Resolution::Weekly,
                    detail: format!("row {idx} ({}) precedes every anchor", sample.date),
                })?,
        };
        points.push(AdjustedPoint {
            date: sample.date,
            adjusted_value: value,
        });
        prev = value;
    }

    Ok(WeeklyAdjustment {
        series: AdjustedSeries {
            resolution: Resolution::Weekly,
            points,
        },
        anchors,
    })
}
