//! `trends-adjust` library crate.
//!
//! The binary (`trends`) is a thin wrapper around this library so that:
//!
//! - the reconciliation passes are testable without network or processes
//! - other front-ends can drive the same per-keyword pipeline

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod reconcile;
pub mod report;

#[cfg(test)]
mod test_support;
