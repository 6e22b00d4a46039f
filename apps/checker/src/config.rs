//! Target registry loader.
//!
//! Reads comma-separated records of the form
//! `<url>,<status>|<status>|...,<number><unit>` where unit is one of `d`, `h`,
//! `m` or `s`. Any bad record rejects the whole file.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use url::Url;

use crate::monitoring::Target;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{} does not exist", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[error("failed to read config: {0}")]
    Read(#[from] csv::Error),
    #[error("line {line}: expected 3 fields (url, statuses, interval), found {found}")]
    FieldCount { line: u64, found: usize },
    #[error("line {line}: status code {token:?} is not an integer")]
    InvalidStatus { line: u64, token: String },
    #[error("line {line}: the format of the access time interval {value:?} is incorrect, expected a d/h/m/s suffix")]
    InvalidIntervalUnit { line: u64, value: String },
    #[error("line {line}: interval {value:?} does not start with a non-negative integer")]
    InvalidIntervalNumber { line: u64, value: String },
    #[error("line {line}: {url:?} is not a valid http(s) URL: {reason}")]
    InvalidUrl { line: u64, url: String, reason: String },
}

/// Why an interval string was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalError {
    Unit,
    Number,
}

/// Load the target list from `path`
pub fn load_targets(path: &Path) -> Result<Vec<Target>, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let file = File::open(path)
        .map_err(|source| ConfigError::Open { path: path.to_path_buf(), source })?;
    let targets = parse_targets(file)?;

    tracing::info!("Loaded {} targets from {}", targets.len(), path.display());
    Ok(targets)
}

/// Parse target records from any reader
pub fn parse_targets<R: io::Read>(reader: R) -> Result<Vec<Target>, ConfigError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut targets = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |position| position.line());

        if record.len() < 3 {
            return Err(ConfigError::FieldCount { line, found: record.len() });
        }
        if record.len() > 3 {
            tracing::debug!("line {}: ignoring {} extra fields", line, record.len() - 3);
        }

        let url = &record[0];
        validate_url(url).map_err(|reason| ConfigError::InvalidUrl {
            line,
            url: url.to_string(),
            reason,
        })?;

        let accepted_statuses = parse_statuses(&record[1])
            .map_err(|token| ConfigError::InvalidStatus { line, token })?;

        let value = &record[2];
        let interval_seconds = parse_interval(value).map_err(|error| match error {
            IntervalError::Unit => ConfigError::InvalidIntervalUnit { line, value: value.to_string() },
            IntervalError::Number => {
                ConfigError::InvalidIntervalNumber { line, value: value.to_string() }
            }
        })?;

        targets.push(Target::new(url, accepted_statuses, interval_seconds));
    }

    Ok(targets)
}

/// Parse a `|`-separated status list, keeping order and duplicates.
///
/// On failure the offending token is returned.
pub fn parse_statuses(field: &str) -> Result<Vec<u16>, String> {
    field
        .split('|')
        .map(|token| token.parse::<u16>().map_err(|_| token.to_string()))
        .collect()
}

/// Parse an interval such as `30s`, `5m`, `2h` or `1d` into seconds
pub fn parse_interval(value: &str) -> Result<u64, IntervalError> {
    let Some(unit) = value.chars().last() else {
        return Err(IntervalError::Unit);
    };

    let multiplier = match unit {
        'd' => 60 * 60 * 24,
        'h' => 60 * 60,
        'm' => 60,
        's' => 1,
        _ => return Err(IntervalError::Unit),
    };

    let number = value[..value.len() - 1].parse::<u64>().map_err(|_| IntervalError::Number)?;
    number.checked_mul(multiplier).ok_or(IntervalError::Number)
}

fn validate_url(target: &str) -> Result<(), String> {
    let url = Url::parse(target).map_err(|e| e.to_string())?;

    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported scheme {other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_interval_units() {
        for (unit, multiplier) in [('d', 86_400), ('h', 3_600), ('m', 60), ('s', 1)] {
            for n in [0u64, 1, 7, 90] {
                assert_eq!(parse_interval(&format!("{n}{unit}")), Ok(n * multiplier));
            }
        }
    }

    #[test]
    fn test_parse_interval_rejects_bad_unit() {
        assert_eq!(parse_interval("10"), Err(IntervalError::Unit));
        assert_eq!(parse_interval("10S"), Err(IntervalError::Unit));
        assert_eq!(parse_interval("10w"), Err(IntervalError::Unit));
        assert_eq!(parse_interval(""), Err(IntervalError::Unit));
    }

    #[test]
    fn test_parse_interval_rejects_bad_number() {
        assert_eq!(parse_interval("s"), Err(IntervalError::Number));
        assert_eq!(parse_interval("-5s"), Err(IntervalError::Number));
        assert_eq!(parse_interval("1.5m"), Err(IntervalError::Number));
        assert_eq!(parse_interval(&format!("{}d", u64::MAX)), Err(IntervalError::Number));
    }

    #[test]
    fn test_parse_statuses_keeps_order() {
        assert_eq!(parse_statuses("200|301|404"), Ok(vec![200, 301, 404]));
        assert_eq!(parse_statuses("404|200|404"), Ok(vec![404, 200, 404]));
        assert_eq!(parse_statuses("200|abc"), Err("abc".to_string()));
        assert_eq!(parse_statuses(""), Err(String::new()));
    }

    #[test]
    fn test_parse_targets() {
        let input = "https://example.com,200|301,5m\nhttp://example.org/health,204,30s\n";

        let targets = parse_targets(input.as_bytes()).unwrap();

        assert_eq!(
            targets,
            vec![
                Target::new("https://example.com", vec![200, 301], 300),
                Target::new("http://example.org/health", vec![204], 30),
            ]
        );
    }

    #[test]
    fn test_bad_unit_admits_nothing() {
        let input = "https://example.com,200,5m\nhttps://example.org,200,5x\n";

        let error = parse_targets(input.as_bytes()).unwrap_err();

        assert!(matches!(error, ConfigError::InvalidIntervalUnit { line: 2, .. }));
    }

    #[test]
    fn test_too_few_fields() {
        let error = parse_targets("https://example.com,200\n".as_bytes()).unwrap_err();
        assert!(matches!(error, ConfigError::FieldCount { line: 1, found: 2 }));
    }

    #[test]
    fn test_bad_status_token() {
        let error = parse_targets("https://example.com,200|OK,1m\n".as_bytes()).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidStatus { ref token, .. } if token == "OK"));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let error = parse_targets("ftp://example.com,200,1m\n".as_bytes()).unwrap_err();
        assert!(matches!(error, ConfigError::InvalidUrl { line: 1, .. }));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let targets = parse_targets("https://example.com,200,1h,note\n".as_bytes()).unwrap();
        assert_eq!(targets, vec![Target::new("https://example.com", vec![200], 3_600)]);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let input = "\nhttps://example.com,200,1m\n\n\nhttps://example.org,204,2s\n\n";

        let targets = parse_targets(input.as_bytes()).unwrap();

        assert_eq!(
            targets,
            vec![
                Target::new("https://example.com", vec![200], 60),
                Target::new("https://example.org", vec![204], 2),
            ]
        );
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let error = load_targets(&dir.path().join("config.csv")).unwrap_err();
        assert!(matches!(error, ConfigError::NotFound(_)));
    }
}
