//! Raw series sources.

use crate::domain::{FetchWindow, Resolution, TimeSeries};
use crate::error::FetchError;

pub mod trends;

pub use trends::{TrendsClient, TrendsConfig};

/// Anything that can serve one page of raw values for a window.
///
/// Each page is normalized by the source on its own scale; pages are only made
/// comparable by the reconciliation passes.
pub trait RawSeriesSource {
    fn fetch_page(&self, resolution: Resolution, window: FetchWindow) -> Result<TimeSeries, FetchError>;
}
