//! Line validation for Claude Code JSONL logs
//!
//! The log format has drifted across Claude Code releases, so a single
//! all-optional shape accepts every variant and the checks below decide
//! what counts as a usage event: a line needs a parseable top-level
//! `timestamp` and a `message.usage` object. Everything else is optional.

use ccroll_core::types::{ISOTimestamp, ModelName, TokenCounts, UsageRecord};
use serde::Deserialize;
use tracing::trace;

/// One raw log line, as permissive as the format requires
#[derive(Debug, Deserialize)]
struct RawJsonlEntry {
    timestamp: Option<String>,
    version: Option<String>,
    message: Option<RawMessage>,
    #[serde(rename = "costUSD")]
    cost_usd_camel: Option<f64>,
    cost_usd: Option<f64>,
    #[serde(rename = "requestId")]
    request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    usage: Option<RawUsage>,
    model: Option<String>,
    id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawUsage {
    input_tokens: Option<u64>,
    output_tokens: Option<u64>,
    cache_creation_input_tokens: Option<u64>,
    cache_read_input_tokens: Option<u64>,
}

impl From<RawUsage> for TokenCounts {
    fn from(usage: RawUsage) -> Self {
        TokenCounts::new(
            usage.input_tokens.unwrap_or(0),
            usage.output_tokens.unwrap_or(0),
            usage.cache_creation_input_tokens.unwrap_or(0),
            usage.cache_read_input_tokens.unwrap_or(0),
        )
    }
}

/// Only the field file ordering needs
#[derive(Debug, Deserialize)]
struct TimestampProbe {
    timestamp: Option<String>,
}

/// Validate one log line into a usage record
///
/// Returns `None` for blank lines, malformed JSON, and lines without a
/// usable timestamp or usage block.
///
/// # Examples
/// ```
/// use ccroll_provider_claude::parse_usage_line;
///
/// let line = r#"{"timestamp":"2024-01-01T00:00:00Z","message":{"usage":{"input_tokens":10}}}"#;
/// let record = parse_usage_line(line).unwrap();
/// assert_eq!(record.tokens.input_tokens, 10);
/// assert_eq!(record.tokens.output_tokens, 0);
///
/// assert!(parse_usage_line(r#"{"timestamp":"2024-01-01T00:00:00Z"}"#).is_none());
/// ```
pub fn parse_usage_line(line: &str) -> Option<UsageRecord> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let raw: RawJsonlEntry = match serde_json::from_str(line) {
        Ok(raw) => raw,
        Err(e) => {
            trace!("Skipping unparseable line: {}", e);
            return None;
        }
    };

    let Some(raw_timestamp) = raw.timestamp else {
        trace!("Skipping line without timestamp");
        return None;
    };
    let Some(timestamp) = ISOTimestamp::parse(&raw_timestamp) else {
        trace!("Skipping line with invalid timestamp {}", raw_timestamp);
        return None;
    };
    let Some(message) = raw.message else {
        trace!("Skipping line without message");
        return None;
    };
    let Some(usage) = message.usage else {
        trace!("Skipping line without usage");
        return None;
    };

    Some(UsageRecord {
        raw_timestamp,
        timestamp,
        version: raw.version,
        tokens: usage.into(),
        model: message.model.map(ModelName::new),
        message_id: message.id,
        request_id: raw.request_id,
        cost_usd: raw.cost_usd_camel.or(raw.cost_usd),
    })
}

/// Read just the timestamp of a line, for file ordering
pub fn parse_timestamp_only(line: &str) -> Option<ISOTimestamp> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    serde_json::from_str::<TimestampProbe>(line)
        .ok()?
        .timestamp
        .as_deref()
        .and_then(ISOTimestamp::parse)
}
