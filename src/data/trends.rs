//! Google Trends integration for keyword search-interest series.

use std::thread::sleep;
use std::time::Duration;

use chrono::NaiveDate;
use rand::Rng;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::data::RawSeriesSource;
use crate::domain::{FetchWindow, Resolution, Sample, TimeSeries};
use crate::error::FetchError;

const HOME_URL: &str = "https://trends.google.com/";
const EXPLORE_URL: &str = "https://trends.google.com/trends/api/explore";
const MULTILINE_CSV_URL: &str = "https://trends.google.com/trends/api/widgetdata/multiline/csv";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
/// Length of the anti-JSON-hijacking prefix on explore responses.
const EXPLORE_PREFIX_LEN: usize = 4;

/// Connection and query settings for [`TrendsClient`].
#[derive(Debug, Clone)]
pub struct TrendsConfig {
    pub keyword: String,
    pub geo: String,
    pub locale: String,
    /// Timezone offset in minutes, as the web UI sends it.
    pub tz: i32,
    pub request_timeout: Duration,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    /// Upper bound of the random pause before every page request.
    pub jitter: Duration,
}

pub struct TrendsClient {
    client: Client,
    config: TrendsConfig,
}

impl TrendsClient {
    pub fn new(config: TrendsConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .cookie_store(true)
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { client, config })
    }

    fn fetch_once(&self, resolution: Resolution, window: FetchWindow) -> Result<TimeSeries, FetchError> {
        // The explore endpoint rejects requests without the session cookie
        // set by the landing page.
        self.client
            .get(HOME_URL)
            .query(&[("geo", self.config.geo.as_str())])
            .send()?;

        let token = self.widget_token(window)?;
        let body = self.widget_csv(resolution, window, &token)?;
        parse_widget_csv(resolution, &body)
    }

    fn widget_token(&self, window: FetchWindow) -> Result<String, FetchError> {
        let req = json!({
            "comparisonItem": [{
                "keyword": self.config.keyword,
                "time": window.to_string(),
                "geo": self.config.geo,
            }],
            "category": 0,
            "property": "",
        });

        let resp = self
            .client
            .get(EXPLORE_URL)
            .query(&[
                ("hl", self.config.locale.clone()),
                ("tz", self.config.tz.to_string()),
                ("req", req.to_string()),
            ])
            .send()?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }

        parse_explore_token(&resp.text()?)
    }

    fn widget_csv(&self, resolution: Resolution, window: FetchWindow, token: &str) -> Result<String, FetchError> {
        let req = json!({
            "time": window.to_string(),
            "resolution": resolution.request_code(),
            "locale": self.config.locale,
            "comparisonItem": [{
                "geo": { "country": self.config.geo },
                "complexKeywordsRestriction": {
                    "keyword": [{ "type": "BROAD", "value": self.config.keyword }],
                },
            }],
            "requestOptions": { "property": "", "backend": "IZG", "category": 0 },
        });

        let resp = self
            .client
            .get(MULTILINE_CSV_URL)
            .query(&[
                ("req", req.to_string()),
                ("token", token.to_string()),
                ("tz", self.config.tz.to_string()),
            ])
            .send()?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status()));
        }

        Ok(resp.text()?)
    }

    fn pause(&self) {
        let max_ms = u64::try_from(self.config.jitter.as_millis()).unwrap_or(u64::MAX);
        if max_ms > 0 {
            sleep(Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms)));
        }
    }
}

impl RawSeriesSource for TrendsClient {
    fn fetch_page(&self, resolution: Resolution, window: FetchWindow) -> Result<TimeSeries, FetchError> {
        let attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            self.pause();
            match self.fetch_once(resolution, window) {
                Ok(page) => {
                    debug!(%resolution, %window, rows = page.len(), attempt, "page fetched");
                    return Ok(page);
                }
                Err(err) if attempt < attempts => {
                    warn!(%resolution, %window, attempt, error = %err, "page fetch failed, retrying");
                    sleep(self.config.retry_backoff);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExploreResponse {
    widgets: Vec<Widget>,
}

#[derive(Debug, Deserialize)]
struct Widget {
    #[serde(default)]
    token: Option<String>,
}

fn parse_explore_token(body: &str) -> Result<String, FetchError> {
    let json = body
        .get(EXPLORE_PREFIX_LEN..)
        .ok_or_else(|| FetchError::Token("explore response too short".to_string()))?;
    let parsed: ExploreResponse =
        serde_json::from_str(json.trim_start()).map_err(|e| FetchError::Token(format!("invalid explore JSON: {e}")))?;
    parsed
        .widgets
        .into_iter()
        .next()
        .and_then(|w| w.token)
        .ok_or_else(|| FetchError::Token("first widget carries no token".to_string()))
}

/// Parse the multiline widget CSV.
///
/// The body starts with a category preamble, then a header whose first cell is
/// the resolution label (`Day`, `Week`, `Month`), then one row per unit.
fn parse_widget_csv(resolution: Resolution, body: &str) -> Result<TimeSeries, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let label = resolution.header_label();
    let mut header_seen = false;
    let mut samples = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| FetchError::Csv(format!("record {idx}: {e}")))?;
        if !header_seen {
            header_seen = record.get(0) == Some(label);
            continue;
        }

        let (Some(date), Some(value)) = (record.get(0), record.get(1)) else {
            return Err(FetchError::Csv(format!("record {idx} has fewer than two fields")));
        };
        samples.push(Sample {
            date: parse_date(date).ok_or_else(|| FetchError::Csv(format!("invalid date '{date}'")))?,
            raw_value: parse_value(value).ok_or_else(|| FetchError::Csv(format!("invalid value '{value}'")))?,
        });
    }

    if !header_seen {
        return Err(FetchError::Csv(format!("no '{label}' header found")));
    }
    Ok(TimeSeries::new(resolution, samples))
}

/// Monthly rows are reported as `YYYY-MM`; other resolutions as full dates.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d"))
        .ok()
}

/// `<1` marks a value that rounds below one and reads as zero.
fn parse_value(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed == "<1" {
        return Some(0.0);
    }
    let v = trimmed.parse::<f64>().ok()?;
    if v.is_finite() && v >= 0.0 { Some(v) } else { None }
}
