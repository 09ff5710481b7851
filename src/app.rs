//! Top-level application orchestration.
//!
//! `src/main.rs` only maps the result to an exit code; this module:
//! - loads `.env` and parses CLI arguments
//! - initializes logging
//! - builds run configs and the source client
//! - prints summaries and plots

use std::time::Duration;

use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing::info;

use crate::cli::{AdjustArgs, BatchArgs, CadenceArgs, Cli, Command, FetchArgs, OutputArgs, RangeArgs, SourceArgs, UpdateArgs};
use crate::data::{TrendsClient, TrendsConfig};
use crate::domain::{CadenceConfig, DateRange, RunConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `trends` binary.
pub fn run() -> Result<(), AppError> {
    // Env fallbacks of the CLI flags may come from `.env`.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    crate::logging::init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Fetch(args) => handle_fetch(args),
        Command::Adjust(args) => handle_adjust(args),
        Command::Run(args) => handle_batch(args),
        Command::Update(args) => handle_update(args),
    }
}

fn handle_fetch(args: FetchArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.keyword, &args.range, &args.cadence, &args.output, today())?;
    let client = client_for(&config.keyword, &args.source)?;
    let inputs = pipeline::fetch_keyword(&client, &config)?;

    println!(
        "Fetched '{}': monthly={} weekly={} daily={}",
        config.keyword,
        inputs.monthly.len(),
        inputs.weekly.len(),
        inputs.daily.len()
    );
    Ok(())
}

fn handle_adjust(args: AdjustArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args.keyword, &args.range, &args.cadence, &args.output, today())?;
    let inputs = pipeline::load_inputs(&config)?;
    let run = pipeline::adjust_inputs(&config, inputs)?;
    print_run(&config, &run);
    Ok(())
}

fn handle_batch(args: BatchArgs) -> Result<(), AppError> {
    let mut keywords = args.keywords.clone();
    if let Some(path) = &args.keywords_file {
        keywords.extend(pipeline::read_keywords_file(path)?);
    }
    if keywords.is_empty() {
        return Err(AppError::new(2, "No keywords given (pass them as arguments or via --keywords-file)."));
    }

    let end = today();
    for (idx, keyword) in keywords.iter().enumerate() {
        info!(keyword = %keyword, n = idx + 1, of = keywords.len(), "batch keyword");
        let config = run_config_from_args(keyword, &args.range, &args.cadence, &args.output, end)?;
        let client = client_for(keyword, &args.source)?;
        match pipeline::run_keyword(&client, &config, args.force)? {
            Some(run) => print_run(&config, &run),
            None => println!("Skipping '{keyword}': adjusted output exists (use --force to rebuild)."),
        }
    }
    Ok(())
}

fn handle_update(args: UpdateArgs) -> Result<(), AppError> {
    let end = args.end.unwrap_or_else(today);
    let client = client_for(&args.keyword, &args.source)?;
    let run = pipeline::update_keyword(&client, &args.output.data_dir, &args.keyword, end, args.output.decimals)?;

    println!(
        "Updated '{}' through {}: +{} daily, +{} weekly rows",
        args.keyword, run.manifest.range.end, run.daily_added, run.weekly_added
    );
    Ok(())
}

fn print_run(config: &RunConfig, run: &pipeline::KeywordRun) {
    println!(
        "{}",
        crate::report::format_run_summary(config, &run.inputs, &run.reconciliation)
    );
    if config.plot {
        let plot = crate::plot::render_ascii_plot(&run.reconciliation.daily, config.plot_width, config.plot_height);
        println!("{plot}");
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn run_config_from_args(
    keyword: &str,
    range: &RangeArgs,
    cadence: &CadenceArgs,
    output: &OutputArgs,
    today: NaiveDate,
) -> Result<RunConfig, AppError> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return Err(AppError::new(2, "Keyword must not be empty."));
    }

    let end = range.end.unwrap_or(today);
    if end < range.start {
        return Err(AppError::new(2, format!("--end {end} is before --start {}.", range.start)));
    }

    let cadence = CadenceConfig {
        weekly_anchor_stride: cadence.weekly_anchor_stride,
        monthly_anchor_stride: cadence.monthly_anchor_stride,
        daily_increment_months: cadence.daily_increment_months,
        daily_window_months: cadence.daily_window_months,
        weekly_window_years: cadence.weekly_window_years,
    };
    cadence
        .validate()
        .map_err(|e| AppError::new(2, format!("Invalid cadence: {e}")))?;

    Ok(RunConfig {
        keyword: keyword.to_string(),
        range: DateRange { start: range.start, end },
        cadence,
        data_dir: output.data_dir.clone(),
        decimals: output.decimals,
        plot: !output.no_plot,
        plot_width: output.width,
        plot_height: output.height,
    })
}

pub fn trends_config_from_args(keyword: &str, source: &SourceArgs) -> TrendsConfig {
    TrendsConfig {
        keyword: keyword.trim().to_string(),
        geo: source.geo.clone(),
        locale: source.locale.clone(),
        tz: source.tz,
        request_timeout: Duration::from_secs(source.timeout_secs),
        max_attempts: source.max_attempts,
        retry_backoff: Duration::from_secs(source.retry_backoff_secs),
        jitter: Duration::from_secs(source.jitter_secs),
    }
}

fn client_for(keyword: &str, source: &SourceArgs) -> Result<TrendsClient, AppError> {
    TrendsClient::new(trends_config_from_args(keyword, source))
        .map_err(|e| AppError::new(4, format!("Failed to build HTTP client: {e}")))
}
