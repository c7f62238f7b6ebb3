//! Core domain types for ccroll
//!
//! This module contains the fundamental types used throughout the ccroll library.
//! These types provide strong typing for model names, session identities,
//! timestamps, and token counts, plus the validated usage record that every
//! aggregation folds over.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Model name emitted for locally generated messages that were never billed
pub const SYNTHETIC_MODEL: &str = "<synthetic>";

/// Project placeholder used when a log file sits directly below `projects/`
pub const UNKNOWN_PROJECT: &str = "Unknown Project";

/// Strongly-typed model name wrapper
///
/// # Examples
/// ```
/// use ccroll_core::types::ModelName;
///
/// let model = ModelName::new("claude-sonnet-4-20250514");
/// assert_eq!(model.as_str(), "claude-sonnet-4-20250514");
/// assert!(!model.is_synthetic());
/// assert!(ModelName::new("<synthetic>").is_synthetic());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelName(String);

impl ModelName {
    /// Create a new ModelName from any string-like type
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the synthetic sentinel rather than a billable model
    pub fn is_synthetic(&self) -> bool {
        self.0 == SYNTHETIC_MODEL
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly-typed session ID wrapper
///
/// A session ID is the name of the directory holding a conversation's log files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new SessionId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Grouping key for session aggregation: project path plus session ID
///
/// Both parts are derived from a log file's location, never from its content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    /// Project path segments joined with the platform separator
    pub project_path: String,
    /// Session identifier (the file's parent directory name)
    pub session_id: SessionId,
}

impl SessionKey {
    /// Create a new key, substituting the placeholder for an empty project path
    ///
    /// # Examples
    /// ```
    /// use ccroll_core::types::{SessionKey, UNKNOWN_PROJECT};
    ///
    /// let key = SessionKey::new("", "abc");
    /// assert_eq!(key.project_path, UNKNOWN_PROJECT);
    /// assert_eq!(key.session_id.as_str(), "abc");
    /// ```
    pub fn new(project_path: impl Into<String>, session_id: impl Into<String>) -> Self {
        let project_path = project_path.into();
        Self {
            project_path: if project_path.is_empty() {
                UNKNOWN_PROJECT.to_string()
            } else {
                project_path
            },
            session_id: SessionId::new(session_id),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.project_path, self.session_id)
    }
}

/// ISO timestamp wrapper for UTC timestamps
///
/// # Examples
/// ```
/// use ccroll_core::types::ISOTimestamp;
///
/// let ts = ISOTimestamp::parse("2024-01-15T10:30:00Z").unwrap();
/// assert_eq!(ts.to_daily_date().format("%Y-%m-%d"), "2024-01-15");
///
/// // Timestamps without an offset are read as UTC
/// let naive = ISOTimestamp::parse("2024-01-15T10:30:00.123").unwrap();
/// assert_eq!(naive.inner().timestamp_subsec_millis(), 123);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ISOTimestamp(DateTime<Utc>);

impl ISOTimestamp {
    /// Create a new ISOTimestamp
    pub fn new(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parse an ISO-8601 timestamp, with or without a UTC offset
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(Self(dt.with_timezone(&Utc)));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Self(naive.and_utc()))
    }

    /// Get the inner DateTime
    pub fn inner(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Convert to DailyDate using UTC
    pub fn to_daily_date(&self) -> DailyDate {
        DailyDate::new(self.0.date_naive())
    }

    /// Convert to DailyDate using specified timezone
    pub fn to_daily_date_with_tz(&self, tz: &Tz) -> DailyDate {
        let local_dt = self.0.with_timezone(tz);
        DailyDate::new(local_dt.date_naive())
    }
}

impl AsRef<DateTime<Utc>> for ISOTimestamp {
    fn as_ref(&self) -> &DateTime<Utc> {
        &self.0
    }
}

/// Calendar date used as the daily grouping key
///
/// Serializes as `YYYY-MM-DD`.
///
/// # Examples
/// ```
/// use ccroll_core::types::DailyDate;
/// use chrono::NaiveDate;
///
/// let daily = DailyDate::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
/// assert_eq!(daily.format("%Y-%m-%d"), "2024-01-15");
/// assert_eq!(daily.month_key(), "2024-01");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DailyDate(NaiveDate);

impl DailyDate {
    /// Create a new DailyDate
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Get the inner NaiveDate
    pub fn inner(&self) -> &NaiveDate {
        &self.0
    }

    /// Create from a timestamp using specified timezone
    pub fn from_timestamp_with_tz(ts: &ISOTimestamp, tz: &Tz) -> Self {
        ts.to_daily_date_with_tz(tz)
    }

    /// Format with a chrono format string
    pub fn format(&self, fmt: &str) -> String {
        self.0.format(fmt).to_string()
    }

    /// The `YYYY-MM` month this date belongs to
    pub fn month_key(&self) -> String {
        self.format("%Y-%m")
    }
}

impl fmt::Display for DailyDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Token counts for usage tracking
///
/// Counts come from untrusted logs, so sums saturate at `u64::MAX`.
///
/// # Examples
/// ```
/// use ccroll_core::types::TokenCounts;
///
/// let tokens = TokenCounts::new(100, 50, 10, 5);
/// assert_eq!(tokens.total(), 165);
///
/// let combined = tokens + TokenCounts::new(50, 25, 5, 2);
/// assert_eq!(combined.input_tokens, 150);
/// ```
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenCounts {
    /// Input tokens used
    pub input_tokens: u64,
    /// Output tokens generated
    pub output_tokens: u64,
    /// Cache creation (write) tokens
    pub cache_creation_tokens: u64,
    /// Cache read tokens
    pub cache_read_tokens: u64,
}

impl TokenCounts {
    /// Create new TokenCounts
    pub fn new(
        input_tokens: u64,
        output_tokens: u64,
        cache_creation_tokens: u64,
        cache_read_tokens: u64,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            cache_creation_tokens,
            cache_read_tokens,
        }
    }

    /// Sum of all four token categories
    pub fn total(&self) -> u64 {
        self.input_tokens
            .saturating_add(self.output_tokens)
            .saturating_add(self.cache_creation_tokens)
            .saturating_add(self.cache_read_tokens)
    }
}

impl Add for TokenCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            input_tokens: self.input_tokens.saturating_add(other.input_tokens),
            output_tokens: self.output_tokens.saturating_add(other.output_tokens),
            cache_creation_tokens: self
                .cache_creation_tokens
                .saturating_add(other.cache_creation_tokens),
            cache_read_tokens: self.cache_read_tokens.saturating_add(other.cache_read_tokens),
        }
    }
}

impl AddAssign for TokenCounts {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

/// Cost calculation mode
///
/// # Examples
/// ```
/// use ccroll_core::types::CostMode;
/// use std::str::FromStr;
///
/// assert_eq!(CostMode::from_str("auto").unwrap(), CostMode::Auto);
/// assert_eq!(CostMode::Calculate.to_string(), "calculate");
/// assert_eq!(CostMode::default(), CostMode::Auto);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostMode {
    /// Use the pre-supplied cost when present, otherwise calculate
    #[default]
    Auto,
    /// Always calculate from tokens, ignoring any pre-supplied cost
    Calculate,
    /// Only use pre-supplied costs; records without one cost 0.
    ///
    /// Never touches pricing data, so it works fully offline.
    Display,
}

impl CostMode {
    /// Whether this mode can need pricing data at all
    pub fn needs_pricing(&self) -> bool {
        !matches!(self, Self::Display)
    }
}

impl fmt::Display for CostMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Calculate => write!(f, "calculate"),
            Self::Display => write!(f, "display"),
        }
    }
}

impl std::str::FromStr for CostMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "calculate" => Ok(Self::Calculate),
            "display" => Ok(Self::Display),
            _ => Err(format!("Invalid cost mode: {s}")),
        }
    }
}

/// Sort direction for report rows, keyed on each row's representative date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first
    Asc,
    /// Newest first
    #[default]
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("Invalid sort order: {s}")),
        }
    }
}

/// Per-model rates in USD per million tokens
///
/// A missing rate contributes nothing to the computed cost.
///
/// # Examples
/// ```
/// use ccroll_core::types::ModelPricing;
///
/// let sonnet = ModelPricing {
///     input_cost_per_mtok: Some(3.0),
///     output_cost_per_mtok: Some(15.0),
///     cache_write_cost_per_mtok: Some(3.75),
///     cache_read_cost_per_mtok: Some(0.3),
/// };
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModelPricing {
    /// Input token rate
    pub input_cost_per_mtok: Option<f64>,
    /// Output token rate
    pub output_cost_per_mtok: Option<f64>,
    /// Cache creation token rate
    pub cache_write_cost_per_mtok: Option<f64>,
    /// Cache read token rate
    pub cache_read_cost_per_mtok: Option<f64>,
}

/// One validated usage event
///
/// Old and new log schemas both land here: every field except the timestamp
/// and the token counts is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Timestamp exactly as written in the log line
    pub raw_timestamp: String,
    /// Parsed timestamp
    pub timestamp: ISOTimestamp,
    /// Tool version that wrote the line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Token counts; absent categories are zero
    #[serde(flatten)]
    pub tokens: TokenCounts,
    /// Model that served the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelName>,
    /// API message ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    /// API request ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Cost written by the producer, in USD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
}

impl UsageRecord {
    /// Deduplication key: the (message ID, request ID) pair
    ///
    /// Records missing either ID have no key and are never deduplicated.
    pub fn identity_key(&self) -> Option<(&str, &str)> {
        match (&self.message_id, &self.request_id) {
            (Some(msg_id), Some(req_id)) => Some((msg_id.as_str(), req_id.as_str())),
            _ => None,
        }
    }

    /// Model name, unless absent or synthetic
    pub fn billable_model(&self) -> Option<&ModelName> {
        self.model.as_ref().filter(|m| !m.is_synthetic())
    }
}

/// A deduplicated usage record with its session and resolved cost
///
/// This is the tuple every aggregation pass consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEntry {
    /// Session the record's file belongs to
    pub session: SessionKey,
    /// The validated record
    pub record: UsageRecord,
    /// Cost in USD under the selected cost mode
    pub cost: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(message_id: Option<&str>, request_id: Option<&str>) -> UsageRecord {
        UsageRecord {
            raw_timestamp: "2024-01-01T00:00:00Z".to_string(),
            timestamp: ISOTimestamp::parse("2024-01-01T00:00:00Z").unwrap(),
            version: None,
            tokens: TokenCounts::new(100, 50, 0, 0),
            model: Some(ModelName::new("claude-3-opus")),
            message_id: message_id.map(str::to_string),
            request_id: request_id.map(str::to_string),
            cost_usd: None,
        }
    }

    #[test]
    fn test_model_name() {
        let model = ModelName::new("claude-3-opus");
        assert_eq!(model.as_str(), "claude-3-opus");
        assert_eq!(model.to_string(), "claude-3-opus");
        assert!(ModelName::new(SYNTHETIC_MODEL).is_synthetic());
    }

    #[test]
    fn test_session_key_placeholder() {
        assert_eq!(SessionKey::new("", "s1").project_path, UNKNOWN_PROJECT);
        let key = SessionKey::new("home/me/app", "s1");
        assert_eq!(key.project_path, "home/me/app");
        assert_eq!(key.to_string(), "home/me/app/s1");
    }

    #[test]
    fn test_token_counts_arithmetic() {
        let sum = TokenCounts::new(100, 50, 10, 5) + TokenCounts::new(200, 100, 20, 10);
        assert_eq!(sum.input_tokens, 300);
        assert_eq!(sum.output_tokens, 150);
        assert_eq!(sum.cache_creation_tokens, 30);
        assert_eq!(sum.cache_read_tokens, 15);
        assert_eq!(sum.total(), 495);
    }

    #[test]
    fn test_token_counts_saturate() {
        let huge = TokenCounts::new(u64::MAX - 1, 10, 0, 0);
        assert_eq!(huge.total(), u64::MAX);

        let mut acc = huge;
        acc += TokenCounts::new(5, 5, 1, 1);
        assert_eq!(acc.input_tokens, u64::MAX);
        assert_eq!(acc.output_tokens, 15);
        assert_eq!(acc.cache_read_tokens, 1);
        assert_eq!((huge + huge).input_tokens, u64::MAX);
    }

    #[test]
    fn test_cost_mode_parsing() {
        assert_eq!("auto".parse::<CostMode>().unwrap(), CostMode::Auto);
        assert_eq!(
            "CALCULATE".parse::<CostMode>().unwrap(),
            CostMode::Calculate
        );
        assert_eq!("display".parse::<CostMode>().unwrap(), CostMode::Display);
        assert!("invalid".parse::<CostMode>().is_err());
        assert!(!CostMode::Display.needs_pricing());
        assert!(CostMode::Auto.needs_pricing());
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!(SortOrder::default(), SortOrder::Desc);
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("Desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_timestamp_parsing() {
        let with_offset = ISOTimestamp::parse("2024-01-01T09:00:00+09:00").unwrap();
        assert_eq!(
            *with_offset.inner(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );

        let naive = ISOTimestamp::parse("2024-01-01T00:00:00").unwrap();
        assert_eq!(naive, with_offset);

        assert!(ISOTimestamp::parse("not-a-timestamp").is_none());
        assert!(ISOTimestamp::parse("").is_none());
    }

    #[test]
    fn test_daily_date_with_timezone() {
        let ts = ISOTimestamp::parse("2024-01-01T23:30:00Z").unwrap();
        assert_eq!(ts.to_daily_date().to_string(), "2024-01-01");
        assert_eq!(
            ts.to_daily_date_with_tz(&chrono_tz::Asia::Tokyo).to_string(),
            "2024-01-02"
        );
        assert_eq!(ts.to_daily_date().month_key(), "2024-01");
    }

    #[test]
    fn test_identity_key_requires_both_ids() {
        assert_eq!(
            record(Some("msg_1"), Some("req_1")).identity_key(),
            Some(("msg_1", "req_1"))
        );
        assert_eq!(record(Some("msg_1"), None).identity_key(), None);
        assert_eq!(record(None, Some("req_1")).identity_key(), None);
        assert_eq!(record(None, None).identity_key(), None);
    }

    #[test]
    fn test_identity_key_keeps_ids_apart() {
        let left = record(Some("a:b"), Some("c"));
        let right = record(Some("a"), Some("b:c"));
        assert_ne!(left.identity_key(), right.identity_key());
    }

    #[test]
    fn test_billable_model_skips_synthetic() {
        let mut r = record(None, None);
        assert!(r.billable_model().is_some());
        r.model = Some(ModelName::new(SYNTHETIC_MODEL));
        assert!(r.billable_model().is_none());
        r.model = None;
        assert!(r.billable_model().is_none());
    }
}
