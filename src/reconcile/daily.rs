//! Daily-from-weekly forward pass.
//!
//! The daily history is cut into fixed calendar increments starting at the run
//! start date. Inside an increment the first day that also starts a weekly row
//! imports that week's adjusted value; every later day of the increment chains
//! forward from it. Days before the import stay unresolved for the gap filler.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{AdjustedSeries, CadenceConfig, Resolution, TimeSeries, WindowSpan};
use crate::error::ReconcileError;
use crate::reconcile::chain::PctChain;

/// Daily values after the forward pass; `None` marks an unresolved row.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialSeries {
    pub resolution: Resolution,
    pub dates: Vec<NaiveDate>,
    pub values: Vec<Option<f64>>,
    pub chain: PctChain,
}

impl PartialSeries {
    pub fn unresolved(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// What happened inside one increment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementReport {
    pub start: NaiveDate,
    /// Date of the imported weekly anchor, if any day matched.
    pub anchor: Option<NaiveDate>,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForwardPass {
    pub partial: PartialSeries,
    pub increments: Vec<IncrementReport>,
}

pub fn forward_daily(
    daily: &TimeSeries,
    weekly: &AdjustedSeries,
    cadence: &CadenceConfig,
    start: NaiveDate,
) -> Result<ForwardPass, ReconcileError> {
    daily.validate()?;
    if let Some(first) = daily.first_date() {
        if first < start {
            return Err(ReconcileError::invalid(
                Resolution::Daily,
                format!("first row {first} precedes run start {start}"),
            ));
        }
    }

    let holes: Vec<String> = daily
        .samples
        .windows(2)
        .filter(|pair| (pair[1].date - pair[0].date).num_days() > 1)
        .map(|pair| format!("{}..{}", pair[0].date + Days::new(1), pair[1].date - Days::new(1)))
        .collect();
    if !holes.is_empty() {
        return Err(ReconcileError::invalid(
            Resolution::Daily,
            format!("missing days {}", holes.join(", ")),
        ));
    }

    let span = WindowSpan::Months(cadence.daily_increment_months);
    let boundary = |k: u32| {
        span.offset(start, k)
            .ok_or_else(|| ReconcileError::invalid(Resolution::Daily, "increment boundary overflows the calendar"))
    };

    let weekly_by_date: HashMap<NaiveDate, f64> =
        weekly.points.iter().map(|p| (p.date, p.adjusted_value)).collect();
    let chain = PctChain::from_series(daily);

    let mut values: Vec<Option<f64>> = vec![None; daily.len()];
    let mut increments = Vec::new();

    let mut k = 0u32;
    let mut increment_end = boundary(1)?;
    let mut current = IncrementReport {
        start,
        anchor: None,
        rows: 0,
    };

    for (idx, sample) in daily.samples.iter().enumerate() {
        while sample.date >= increment_end {
            if current.rows > 0 {
                increments.push(current);
            }
            k += 1;
            current = IncrementReport {
                start: increment_end,
                anchor: None,
                rows: 0,
            };
            increment_end = boundary(k + 1)?;
        }
        current.rows += 1;

        values[idx] = if current.anchor.is_none() {
            let hit = weekly_by_date.get(&sample.date).copied();
            if let Some(value) = hit {
                debug!(date = %sample.date, value, increment = %current.start, "daily anchor imported");
                current.anchor = Some(sample.date);
            }
            hit
        } else {
            // The previous row is in this increment at or after its anchor.
            values[idx - 1].and_then(|prev| chain.forward(prev, idx))
        };
    }
    if current.rows > 0 {
        increments.push(current);
    }

    for missed in increments.iter().filter(|inc| inc.anchor.is_none()) {
        warn!(
            increment = %missed.start,
            rows = missed.rows,
            "no weekly row matches any day of increment, leaving it to the gap filler"
        );
    }

    Ok(ForwardPass {
        partial: PartialSeries {
            resolution: Resolution::Daily,
            dates: daily.samples.iter().map(|s| s.date).collect(),
            values,
            chain,
        },
        increments,
    })
}
