use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ScanConfig;
use crate::errors::{ScanError, ScanResult};

/// Layout of timestamps recognized inside log lines
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}").expect("timestamp regex is valid")
});

/// Inclusive time window a line's embedded timestamp must fall into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Compiled filter criteria, built once at startup and shared read-only.
///
/// `keep` is pure and free of interior mutability, so the criteria may be
/// consulted from any number of threads. The stream engine calls it from
/// its single consumption loop; calling it concurrently from the readers
/// instead would not change semantics.
#[derive(Debug)]
pub struct FilterCriteria {
    include_keywords: Vec<String>,
    exclude_keywords: Vec<String>,
    levels: Vec<String>,
    window: Option<TimeWindow>,
    pattern: Option<Regex>,
}

impl FilterCriteria {
    /// Compiles criteria from a configuration.
    ///
    /// Fails fast on an invalid regex, a malformed timestamp, or a time
    /// window with only one bound; no I/O happens before these checks.
    pub fn build(config: &ScanConfig) -> ScanResult<Self> {
        let pattern = match &config.pattern {
            Some(p) => Some(
                Regex::new(p).map_err(|e| ScanError::invalid_pattern(format!("{p}: {e}")))?,
            ),
            None => None,
        };

        let window = match (&config.start_time, &config.end_time) {
            (Some(start), Some(end)) => Some(TimeWindow {
                start: parse_timestamp(start)?,
                end: parse_timestamp(end)?,
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ScanError::config_error(
                    "start time given without end time",
                ))
            }
            (None, Some(_)) => {
                return Err(ScanError::config_error(
                    "end time given without start time",
                ))
            }
        };

        Ok(Self {
            include_keywords: config.include_keywords.clone(),
            exclude_keywords: config.exclude_keywords.clone(),
            levels: config.levels.clone(),
            window,
            pattern,
        })
    }

    /// Decides whether a line survives filtering.
    ///
    /// Stages short-circuit in order: time window, exclude keywords,
    /// include keywords, levels, regex. A line with no parseable
    /// timestamp is never dropped by the time-window stage.
    pub fn keep(&self, line: &str) -> bool {
        if let Some(window) = &self.window {
            if let Some(ts) = extract_timestamp(line) {
                // Bounds are inclusive: equality with either end survives
                if ts < window.start || ts > window.end {
                    return false;
                }
            }
        }

        if contains_any(line, &self.exclude_keywords) {
            return false;
        }

        if !self.include_keywords.is_empty() && !contains_any(line, &self.include_keywords) {
            return false;
        }

        if !self.levels.is_empty() && !contains_any(line, &self.levels) {
            return false;
        }

        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(line) {
                return false;
            }
        }

        true
    }
}

fn contains_any(line: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|keyword| line.contains(keyword.as_str()))
}

/// Parses a configured window bound, e.g. `2024-01-01 00:00:00`
fn parse_timestamp(value: &str) -> ScanResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map_err(|_| ScanError::invalid_timestamp(value, TIMESTAMP_FORMAT))
}

/// Locates and parses the first timestamp substring in a line, if any
fn extract_timestamp(line: &str) -> Option<NaiveDateTime> {
    let found = TIMESTAMP_RE.find(line)?;
    NaiveDateTime::parse_from_str(found.as_str(), TIMESTAMP_FORMAT).ok()
}
