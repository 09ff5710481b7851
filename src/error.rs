use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{FetchWindow, Resolution};

/// Top-level error carried to the binary, with the process exit code to use.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

/// Failure to retrieve one page of raw data from a source.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("could not read widget token: {0}")]
    Token(String),

    #[error("malformed widget CSV: {0}")]
    Csv(String),
}

/// Failures of the stitch/reconcile pipeline.
///
/// Every variant names the resolution whose pass could not be completed so the
/// caller can attribute the failure without inspecting partial output.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("failed to fetch {resolution} window {window}: {source}")]
    SourceFetch {
        resolution: Resolution,
        window: FetchWindow,
        #[source]
        source: FetchError,
    },

    #[error("{resolution} pass: anchor not found ({detail})")]
    AnchorNotFound { resolution: Resolution, detail: String },

    #[error("{resolution} pass: unfillable gap from {from} to {to}, no resolved row follows it")]
    UnfillableGap {
        resolution: Resolution,
        from: NaiveDate,
        to: NaiveDate,
    },

    #[error("invalid {resolution} series: {detail}")]
    InvalidSeries { resolution: Resolution, detail: String },
}

impl ReconcileError {
    pub fn invalid(resolution: Resolution, detail: impl Into<String>) -> Self {
        Self::InvalidSeries {
            resolution,
            detail: detail.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            ReconcileError::InvalidSeries { .. } => 2,
            ReconcileError::SourceFetch { .. } => 4,
            ReconcileError::AnchorNotFound { .. } | ReconcileError::UnfillableGap { .. } => 5,
        }
    }
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}
