//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between reconciliation passes by value
//! - exported to CSV/JSON
//! - reloaded later for incremental updates

use std::path::PathBuf;

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;

/// Sampling resolution of a series as served by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Daily,
    Weekly,
    Monthly,
}

impl Resolution {
    pub const ALL: [Resolution; 3] = [Resolution::Daily, Resolution::Weekly, Resolution::Monthly];

    pub fn as_str(self) -> &'static str {
        match self {
            Resolution::Daily => "daily",
            Resolution::Weekly => "weekly",
            Resolution::Monthly => "monthly",
        }
    }

    /// Resolution code used in widget data requests.
    pub fn request_code(self) -> &'static str {
        match self {
            Resolution::Daily => "DAY",
            Resolution::Weekly => "WEEK",
            Resolution::Monthly => "MONTH",
        }
    }

    /// First header cell of the widget CSV for this resolution.
    pub fn header_label(self) -> &'static str {
        match self {
            Resolution::Daily => "Day",
            Resolution::Weekly => "Week",
            Resolution::Monthly => "Month",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive calendar range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// One page request against the source. Both ends are inclusive, so
/// consecutive windows share their boundary date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl std::fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.start, self.end)
    }
}

/// Length of one fetch window for a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSpan {
    Months(u32),
    Years(u32),
    /// The whole requested range in a single page.
    Whole,
}

impl WindowSpan {
    /// Date `k` spans after `base`, computed from `base` directly so month-end
    /// clamping never accumulates across steps. `None` for [`WindowSpan::Whole`]
    /// or on calendar overflow.
    pub fn offset(self, base: NaiveDate, k: u32) -> Option<NaiveDate> {
        let months = match self {
            WindowSpan::Months(m) => m.checked_mul(k)?,
            WindowSpan::Years(y) => y.checked_mul(12)?.checked_mul(k)?,
            WindowSpan::Whole => return None,
        };
        base.checked_add_months(Months::new(months))
    }
}

/// One raw observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub date: NaiveDate,
    pub raw_value: f64,
}

/// Ordered raw series of one resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub resolution: Resolution,
    pub samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn new(resolution: Resolution, samples: Vec<Sample>) -> Self {
        Self { resolution, samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.samples.first().map(|s| s.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.samples.last().map(|s| s.date)
    }

    /// Check the series is non-empty, strictly increasing by date and carries
    /// finite non-negative values.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.samples.is_empty() {
            return Err(ReconcileError::invalid(self.resolution, "series is empty"));
        }
        for (idx, sample) in self.samples.iter().enumerate() {
            if !(sample.raw_value.is_finite() && sample.raw_value >= 0.0) {
                return Err(ReconcileError::invalid(
                    self.resolution,
                    format!("row {idx} ({}) has invalid value {}", sample.date, sample.raw_value),
                ));
            }
        }
        for pair in self.samples.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ReconcileError::invalid(
                    self.resolution,
                    format!("dates not strictly increasing at {} -> {}", pair[0].date, pair[1].date),
                ));
            }
        }
        Ok(())
    }
}

/// One reconciled observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdjustedPoint {
    pub date: NaiveDate,
    pub adjusted_value: f64,
}

/// Reconciled series, comparable across its whole history.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustedSeries {
    pub resolution: Resolution,
    pub points: Vec<AdjustedPoint>,
}

impl AdjustedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&AdjustedPoint> {
        self.points.last()
    }

    /// `(min, max)` of the adjusted values, `None` when empty.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut iter = self.points.iter().map(|p| p.adjusted_value);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// Cadence constants tying the resolutions together.
///
/// The defaults follow the source's native page limits: one weekly page spans
/// five years (261 weeks, 60 months) and one daily page spans six months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadenceConfig {
    /// Weekly rows between consecutive weekly anchors.
    pub weekly_anchor_stride: usize,
    /// Monthly rows between the monthly values those anchors inherit.
    pub monthly_anchor_stride: usize,
    /// Calendar months per daily anchoring increment.
    pub daily_increment_months: u32,
    /// Calendar months per daily fetch window.
    pub daily_window_months: u32,
    /// Calendar years per weekly fetch window.
    pub weekly_window_years: u32,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            weekly_anchor_stride: 261,
            monthly_anchor_stride: 60,
            daily_increment_months: 6,
            daily_window_months: 6,
            weekly_window_years: 5,
        }
    }
}

impl CadenceConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.weekly_anchor_stride == 0 || self.monthly_anchor_stride == 0 {
            return Err("anchor strides must be at least 1".to_string());
        }
        if self.daily_increment_months == 0 || self.daily_window_months == 0 || self.weekly_window_years == 0 {
            return Err("increment and window lengths must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn window_span(&self, resolution: Resolution) -> WindowSpan {
        match resolution {
            Resolution::Daily => WindowSpan::Months(self.daily_window_months),
            Resolution::Weekly => WindowSpan::Years(self.weekly_window_years),
            Resolution::Monthly => WindowSpan::Whole,
        }
    }
}

/// Resolved settings for one keyword run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub keyword: String,
    pub range: DateRange,
    pub cadence: CadenceConfig,
    pub data_dir: PathBuf,
    /// Decimals written for adjusted values.
    pub decimals: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn window_span_offsets_from_base() {
        let base = d(2004, 8, 31);
        assert_eq!(WindowSpan::Months(6).offset(base, 1), Some(d(2005, 2, 28)));
        // Computed from base, not from the clamped previous step.
        assert_eq!(WindowSpan::Months(6).offset(base, 2), Some(d(2005, 8, 31)));
        assert_eq!(WindowSpan::Years(5).offset(d(2004, 1, 1), 1), Some(d(2009, 1, 1)));
        assert_eq!(WindowSpan::Whole.offset(base, 1), None);
    }

    #[test]
    fn validate_rejects_unordered_and_negative() {
        let unordered = TimeSeries::new(
            Resolution::Daily,
            vec![
                Sample { date: d(2004, 1, 2), raw_value: 1.0 },
                Sample { date: d(2004, 1, 2), raw_value: 2.0 },
            ],
        );
        assert!(unordered.validate().is_err());

        let negative = TimeSeries::new(Resolution::Monthly, vec![Sample { date: d(2004, 1, 1), raw_value: -1.0 }]);
        assert!(negative.validate().is_err());

        assert!(TimeSeries::new(Resolution::Weekly, vec![]).validate().is_err());
    }

    #[test]
    fn cadence_defaults_and_validation() {
        let cadence = CadenceConfig::default();
        assert!(cadence.validate().is_ok());
        assert_eq!(cadence.window_span(Resolution::Weekly), WindowSpan::Years(5));
        assert_eq!(cadence.window_span(Resolution::Monthly), WindowSpan::Whole);

        let broken = CadenceConfig {
            weekly_anchor_stride: 0,
            ..cadence
        };
        assert!(broken.validate().is_err());
    }
}
