//! Builders and an in-memory source shared by unit tests.

use chrono::{Datelike, Days, Months, NaiveDate};

use crate::data::RawSeriesSource;
use crate::domain::{FetchWindow, Resolution, Sample, TimeSeries};
use crate::error::FetchError;
use crate::reconcile::RawInputs;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn series(resolution: Resolution, dates: impl Iterator<Item = NaiveDate>, values: &[f64]) -> TimeSeries {
    let samples = dates
        .zip(values)
        .map(|(date, &raw_value)| Sample { date, raw_value })
        .collect();
    TimeSeries::new(resolution, samples)
}

pub fn daily_series(start: NaiveDate, values: &[f64]) -> TimeSeries {
    series(Resolution::Daily, (0..).map(|i| start + Days::new(i)), values)
}

pub fn weekly_series(start: NaiveDate, values: &[f64]) -> TimeSeries {
    series(Resolution::Weekly, (0..).map(|i| start + Days::new(7 * i)), values)
}

pub fn monthly_series(start: NaiveDate, values: &[f64]) -> TimeSeries {
    series(Resolution::Monthly, (0..).map(|i| start + Months::new(i)), values)
}

/// Consistent monthly/weekly/daily inputs for `days` days from `start` (a
/// first of month). Weeks start on Sundays, as the source reports them.
pub fn synthetic_inputs(start: NaiveDate, days: usize, daily_value: impl Fn(usize) -> f64) -> RawInputs {
    let daily_values: Vec<f64> = (0..days).map(&daily_value).collect();
    let daily = daily_series(start, &daily_values);
    let last = daily.last_date().unwrap();

    let to_sunday = u64::from((7 - start.weekday().num_days_from_sunday()) % 7);
    let first_week = start + Days::new(to_sunday);
    let weekly_values: Vec<f64> = (0..)
        .map(|k| to_sunday as usize + 7 * k)
        .take_while(|&offset| offset < days)
        .map(|offset| 10.0 + daily_value(offset) / 2.0)
        .collect();
    let weekly = weekly_series(first_week, &weekly_values);

    let monthly_values: Vec<f64> = (0..)
        .take_while(|&k| start + Months::new(k) <= last)
        .map(|k| 40.0 + f64::from(k % 30))
        .collect();
    let monthly = monthly_series(start, &monthly_values);

    RawInputs { monthly, weekly, daily }
}

/// Serves windows of fixed full-history series, rescaling every page to a
/// peak of 100 the way the real source does.
pub struct MemorySource {
    series: Vec<TimeSeries>,
    fail_from: Option<NaiveDate>,
    empty_at: Option<NaiveDate>,
}

impl MemorySource {
    pub fn new(series: Vec<TimeSeries>) -> Self {
        Self {
            series,
            fail_from: None,
            empty_at: None,
        }
    }

    /// Fail every window starting on or after `date`.
    pub fn failing_from(mut self, date: NaiveDate) -> Self {
        self.fail_from = Some(date);
        self
    }

    /// Serve a page with no rows for the window starting on `date`.
    pub fn empty_at(mut self, date: NaiveDate) -> Self {
        self.empty_at = Some(date);
        self
    }
}

impl RawSeriesSource for MemorySource {
    fn fetch_page(&self, resolution: Resolution, window: FetchWindow) -> Result<TimeSeries, FetchError> {
        if self.fail_from.is_some_and(|date| window.start >= date) {
            return Err(FetchError::Token("simulated outage".to_string()));
        }
        if self.empty_at == Some(window.start) {
            return Ok(TimeSeries::new(resolution, Vec::new()));
        }
        let full = self
            .series
            .iter()
            .find(|s| s.resolution == resolution)
            .ok_or_else(|| FetchError::Csv(format!("no {resolution} series configured")))?;

        let mut samples: Vec<Sample> = full
            .samples
            .iter()
            .filter(|s| s.date >= window.start && s.date <= window.end)
            .copied()
            .collect();
        let peak = samples.iter().map(|s| s.raw_value).fold(0.0, f64::max);
        if peak > 0.0 {
            for s in &mut samples {
                s.raw_value = (s.raw_value * 100.0 / peak).round();
            }
        }
        Ok(TimeSeries::new(resolution, samples))
    }
}
