use std::env;
use std::fmt;
use std::sync::OnceLock;

use chrono::{Local, TimeZone};
use chrono_tz::Tz;

use super::checker::CheckError;

/// A monitored endpoint as loaded from the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// URL requested with a plain GET
    pub url: String,

    /// Status codes that count as healthy, in the order they are displayed
    pub accepted_statuses: Vec<u16>,

    /// Seconds between two dispatches of this target
    pub interval_seconds: u64,
}

impl Target {
    pub fn new(url: impl Into<String>, accepted_statuses: Vec<u16>, interval_seconds: u64) -> Self {
        Self { url: url.into(), accepted_statuses, interval_seconds }
    }

    /// Whether `status` is one of the accepted codes
    pub fn accepts(&self, status: u16) -> bool {
        self.accepted_statuses.contains(&status)
    }
}

/// A status mismatch observed during one check cycle.
///
/// Rendered to a line as soon as it reaches the reporter; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    /// Unix time of the tick that dispatched the check
    pub checked_at: i64,
    pub url: String,
    pub status: u16,
    pub expected: Vec<u16>,
}

impl Warning {
    pub fn new(target: &Target, checked_at: i64, status: u16) -> Self {
        Self {
            checked_at,
            url: target.url.clone(),
            status,
            expected: target.accepted_statuses.clone(),
        }
    }

    /// The warning as it is written to the sink, trailing newline included
    pub fn render(&self) -> String {
        self.render_in(local_zone())
    }

    /// Render with the timestamp shown in `zone`
    pub fn render_in(&self, zone: Option<Tz>) -> String {
        let expected = self
            .expected
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join("_or_");

        format!(
            "Warning: {} {} return status {} but expected {}\n",
            format_time_in(zone, self.checked_at),
            self.url,
            self.status,
            expected
        )
    }
}

/// Format a Unix timestamp in the local timezone, e.g. `2024-05-01 09:30:00 +0900 JST`
pub fn format_local_time(unix_seconds: i64) -> String {
    format_time_in(local_zone(), unix_seconds)
}

/// Format `unix_seconds` as `date time offset abbreviation`.
///
/// Without a known zone the local offset stands in for the abbreviation.
pub fn format_time_in(zone: Option<Tz>, unix_seconds: i64) -> String {
    let rendered = match zone {
        Some(zone) => zone
            .timestamp_opt(unix_seconds, 0)
            .single()
            .map(|time| time.format("%Y-%m-%d %H:%M:%S %z %Z").to_string()),
        None => Local
            .timestamp_opt(unix_seconds, 0)
            .single()
            .map(|time| time.format("%Y-%m-%d %H:%M:%S %z %z").to_string()),
    };

    rendered.unwrap_or_else(|| unix_seconds.to_string())
}

/// The process timezone: `TZ` when set (empty means UTC), else the system zone
fn local_zone() -> Option<Tz> {
    static ZONE: OnceLock<Option<Tz>> = OnceLock::new();

    *ZONE.get_or_init(|| match env::var("TZ") {
        Ok(name) if name.is_empty() => Some(Tz::UTC),
        Ok(name) => name.trim_start_matches(':').parse().ok(),
        Err(_) => iana_time_zone::get_timezone().ok().and_then(|name| name.parse().ok()),
    })
}

/// What a checker task reports back once its request has finished
#[derive(Debug)]
pub enum CheckOutcome {
    /// The status code was in the accepted set
    Accepted { url: String, status: u16 },

    /// The status code was not in the accepted set
    Mismatch(Warning),

    /// The request itself failed before a status code was received
    Failed { url: String, error: CheckError },
}

/// Counters for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub ticks: u64,
    pub dispatched: u64,
    pub deferred: u64,
    pub accepted: u64,
    pub warnings: u64,
    pub failures: u64,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ticks={} dispatched={} deferred={} accepted={} warnings={} failures={}",
            self.ticks, self.dispatched, self.deferred, self.accepted, self.warnings, self.failures
        )
    }
}
