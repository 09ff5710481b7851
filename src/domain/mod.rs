//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - resolutions and fetch windows (`Resolution`, `FetchWindow`, `WindowSpan`)
//! - raw and reconciled series (`TimeSeries`, `AdjustedSeries`)
//! - run configuration (`CadenceConfig`, `RunConfig`)

pub mod types;

pub use types::*;
