//! Input/output helpers.
//!
//! - per-keyword directory layout (`KeywordPaths`)
//! - raw and adjusted series CSV read/write (`series`)
//! - run manifest JSON read/write (`manifest`)

use std::path::{Path, PathBuf};

use crate::domain::Resolution;

pub mod manifest;
pub mod series;

pub use manifest::*;
pub use series::*;

/// File locations of one keyword under the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordPaths {
    root: PathBuf,
}

impl KeywordPaths {
    pub fn new(data_dir: &Path, keyword: &str) -> Self {
        Self {
            root: data_dir.join(keyword_slug(keyword)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn unadjusted(&self, resolution: Resolution) -> PathBuf {
        self.root.join("unadjusted").join(format!("{resolution}.csv"))
    }

    pub fn adjusted(&self, resolution: Resolution) -> PathBuf {
        self.root.join("adjusted").join(format!("{resolution}.csv"))
    }

    pub fn manifest(&self) -> PathBuf {
        self.root.join("adjusted").join("manifest.json")
    }
}

/// Directory name for a keyword: trimmed, whitespace runs replaced by `_`.
pub fn keyword_slug(keyword: &str) -> String {
    keyword.split_whitespace().collect::<Vec<_>>().join("_")
}
