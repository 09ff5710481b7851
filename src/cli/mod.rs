//! Command-line parsing for the search-interest reconciler.
//!
//! Argument parsing and command dispatch stay separate from the
//! reconciliation code; `app` turns these structs into configs.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "trends",
    version,
    about = "Reconcile daily, weekly and monthly search-interest series onto one scale"
)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch and stitch all three resolutions, writing the unadjusted CSVs.
    Fetch(FetchArgs),
    /// Reconcile previously fetched CSVs into adjusted weekly and daily series.
    Adjust(AdjustArgs),
    /// Fetch and adjust a batch of keywords.
    Run(BatchArgs),
    /// Extend an existing adjusted series up to the end date.
    Update(UpdateArgs),
}

#[derive(Debug, Args, Clone)]
pub struct FetchArgs {
    /// Search term.
    pub keyword: String,

    #[command(flatten)]
    pub range: RangeArgs,

    #[command(flatten)]
    pub cadence: CadenceArgs,

    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct AdjustArgs {
    /// Search term.
    pub keyword: String,

    #[command(flatten)]
    pub range: RangeArgs,

    #[command(flatten)]
    pub cadence: CadenceArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct BatchArgs {
    /// Search terms.
    pub keywords: Vec<String>,

    /// File with one keyword per line (blank lines and `#` comments ignored).
    #[arg(long, value_name = "FILE")]
    pub keywords_file: Option<PathBuf>,

    /// Re-run keywords whose adjusted output already exists.
    #[arg(long)]
    pub force: bool,

    #[command(flatten)]
    pub range: RangeArgs,

    #[command(flatten)]
    pub cadence: CadenceArgs,

    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct UpdateArgs {
    /// Search term.
    pub keyword: String,

    /// Last date to fetch (defaults to today).
    #[arg(long)]
    pub end: Option<NaiveDate>,

    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args, Clone)]
pub struct RangeArgs {
    /// First date of the history.
    #[arg(long, default_value = "2004-01-01")]
    pub start: NaiveDate,

    /// Last date of the history (defaults to today).
    #[arg(long)]
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Args, Clone)]
pub struct CadenceArgs {
    /// Weekly rows between weekly anchors.
    #[arg(long, default_value_t = 261)]
    pub weekly_anchor_stride: usize,

    /// Monthly rows between the monthly values weekly anchors inherit.
    #[arg(long, default_value_t = 60)]
    pub monthly_anchor_stride: usize,

    /// Months per daily anchoring increment.
    #[arg(long, default_value_t = 6)]
    pub daily_increment_months: u32,

    /// Months per daily fetch window.
    #[arg(long, default_value_t = 6)]
    pub daily_window_months: u32,

    /// Years per weekly fetch window.
    #[arg(long, default_value_t = 5)]
    pub weekly_window_years: u32,
}

#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Country code the series is restricted to.
    #[arg(long, env = "TRENDS_GEO", default_value = "US")]
    pub geo: String,

    /// Interface locale sent with requests.
    #[arg(long, env = "TRENDS_LOCALE", default_value = "en-US")]
    pub locale: String,

    /// Timezone offset in minutes.
    #[arg(long, env = "TRENDS_TZ", default_value_t = -120, allow_negative_numbers = true)]
    pub tz: i32,

    /// Per-request timeout in seconds.
    #[arg(long, env = "TRENDS_TIMEOUT_SECS", default_value_t = 5)]
    pub timeout_secs: u64,

    /// Attempts per window before giving up.
    #[arg(long, env = "TRENDS_MAX_ATTEMPTS", default_value_t = 3)]
    pub max_attempts: u32,

    /// Seconds to wait between attempts.
    #[arg(long, env = "TRENDS_RETRY_BACKOFF_SECS", default_value_t = 60)]
    pub retry_backoff_secs: u64,

    /// Upper bound of the random pause before each request, in seconds.
    #[arg(long, env = "TRENDS_JITTER_SECS", default_value_t = 2)]
    pub jitter_secs: u64,
}

#[derive(Debug, Args, Clone)]
pub struct OutputArgs {
    /// Root directory for per-keyword data.
    #[arg(long, env = "TRENDS_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Decimals written for adjusted values.
    #[arg(long, default_value_t = 4)]
    pub decimals: usize,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}
