//! Configuration for the monday.com sync service.

use chrono::{Datelike, NaiveDate};
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Public monday.com GraphQL endpoint.
pub const MONDAY_API_URL: &str = "https://api.monday.com/v2";

/// Service configuration, read from the environment.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// monday.com API key. Remote calls fail while this is unset.
    pub api_key: Option<String>,
    /// GraphQL endpoint.
    pub api_url: String,
    /// Date written to a new subitem when its parent has none.
    pub fallback_date: Option<FallbackDate>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            api_key: env::var("MONDAY_API_KEY").ok().filter(|s| !s.is_empty()),
            api_url: env::var("MONDAY_API_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| MONDAY_API_URL.to_string()),
            fallback_date: env::var("MONDAY_FALLBACK_DATE")
                .ok()
                .and_then(|s| parse_fallback_date(&s)),
        }
    }
}

/// An unparsable value is logged and treated as unset.
fn parse_fallback_date(raw: &str) -> Option<FallbackDate> {
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(date) => Some(date),
        Err(e) => {
            warn!(value = %raw, error = %e, "Ignoring invalid MONDAY_FALLBACK_DATE");
            None
        }
    }
}

impl Config {
    /// Whether an API key is available.
    #[must_use]
    pub fn api_key_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

// Keep the key out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("fallback_date", &self.fallback_date)
            .finish()
    }
}

/// A month/day pair resolved against the current year when used.
///
/// Parsed from `MM-DD` (e.g. `03-11`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackDate {
    month: u32,
    day: u32,
}

impl FallbackDate {
    /// Build from a month and day, rejecting impossible combinations.
    #[must_use]
    pub fn new(month: u32, day: u32) -> Option<Self> {
        // 2000 is a leap year, so 02-29 is accepted here and may still fail to resolve.
        NaiveDate::from_ymd_opt(2000, month, day).map(|_| Self { month, day })
    }

    /// The date in the given year, if it exists in that year.
    #[must_use]
    pub fn in_year(self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }

    /// The date in the current (UTC) year.
    #[must_use]
    pub fn this_year(self) -> Option<NaiveDate> {
        self.in_year(chrono::Utc::now().year())
    }
}

impl FromStr for FallbackDate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (month, day) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("expected MM-DD, got {s:?}"))?;
        let month = month
            .parse()
            .map_err(|_| format!("invalid month in {s:?}"))?;
        let day = day.parse().map_err(|_| format!("invalid day in {s:?}"))?;
        Self::new(month, day).ok_or_else(|| format!("no such date: {s:?}"))
    }
}
