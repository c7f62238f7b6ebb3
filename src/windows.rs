//! Fixed 5-hour usage windows
//!
//! Each UTC day splits into five windows starting at 00, 05, 10, 15 and
//! 20 o'clock. A record belongs to the window whose start hour is the
//! largest boundary at or before its UTC hour, so `05:00:00` opens a new
//! window and `04:59:59` still belongs to the one before.
//!
//! Window IDs look like `2024-01-15-10`. Windows roll up into
//! [`MonthlyWindowSummary`] values that can be checked against a monthly
//! session limit.

use ccroll_core::aggregation_types::{MonthlyWindowSummary, WindowUsage};
use ccroll_core::types::{ISOTimestamp, SessionKey, TokenCounts, UsageEntry};
use chrono::Timelike;
use std::collections::{BTreeMap, HashSet};

/// Length of a usage window in hours
pub const WINDOW_HOURS: u32 = 5;

/// Window identifier for a timestamp
///
/// # Examples
/// ```
/// use ccroll::windows::window_id;
/// use ccroll_core::types::ISOTimestamp;
///
/// let ts = ISOTimestamp::parse("2024-01-15T14:59:59Z").unwrap();
/// assert_eq!(window_id(&ts), "2024-01-15-10");
///
/// let ts = ISOTimestamp::parse("2024-01-15T15:00:00Z").unwrap();
/// assert_eq!(window_id(&ts), "2024-01-15-15");
/// ```
pub fn window_id(timestamp: &ISOTimestamp) -> String {
    let utc = timestamp.inner();
    let start_hour = utc.hour() / WINDOW_HOURS * WINDOW_HOURS;
    format!("{}-{:02}", utc.format("%Y-%m-%d"), start_hour)
}

struct WindowAccumulator {
    start: (String, ISOTimestamp),
    end: (String, ISOTimestamp),
    message_count: u64,
    sessions: HashSet<SessionKey>,
    tokens: TokenCounts,
    cost: f64,
    models: Vec<String>,
}

impl WindowAccumulator {
    fn new(entry: &UsageEntry) -> Self {
        let first = (entry.record.raw_timestamp.clone(), entry.record.timestamp);
        Self {
            start: first.clone(),
            end: first,
            message_count: 0,
            sessions: HashSet::new(),
            tokens: TokenCounts::default(),
            cost: 0.0,
            models: Vec::new(),
        }
    }

    fn add_entry(&mut self, entry: &UsageEntry) {
        let record = &entry.record;

        if record.raw_timestamp < self.start.0 {
            self.start = (record.raw_timestamp.clone(), record.timestamp);
        }
        if record.raw_timestamp > self.end.0 {
            self.end = (record.raw_timestamp.clone(), record.timestamp);
        }

        self.message_count += 1;
        self.tokens += record.tokens;
        self.cost += entry.cost;

        if !self.sessions.contains(&entry.session) {
            self.sessions.insert(entry.session.clone());
        }

        if let Some(model) = record.billable_model()
            && !self.models.iter().any(|m| m == model.as_str())
        {
            self.models.push(model.as_str().to_string());
        }
    }

    fn into_window_usage(self, window_id: String) -> WindowUsage {
        let duration_ms = (*self.end.1.inner() - *self.start.1.inner()).num_milliseconds();
        WindowUsage {
            window_id,
            start_timestamp: self.start.0,
            end_timestamp: self.end.0,
            message_count: self.message_count,
            session_count: self.sessions.len(),
            tokens: self.tokens,
            total_cost: self.cost,
            duration_ms,
            models: self.models,
        }
    }
}

/// Bucket entries into 5-hour UTC windows, keyed by window ID
pub fn compute_windows(entries: &[UsageEntry]) -> BTreeMap<String, WindowUsage> {
    let mut accumulators: BTreeMap<String, WindowAccumulator> = BTreeMap::new();

    for entry in entries {
        accumulators
            .entry(window_id(&entry.record.timestamp))
            .or_insert_with(|| WindowAccumulator::new(entry))
            .add_entry(entry);
    }

    accumulators
        .into_iter()
        .map(|(id, acc)| {
            let usage = acc.into_window_usage(id.clone());
            (id, usage)
        })
        .collect()
}

/// Roll windows up by calendar month, most recent month first
///
/// With a session limit, each month reports the sessions left (never below
/// zero) and its utilization, which may exceed 100%. A limit of zero is
/// treated as no limit.
///
/// # Examples
/// ```
/// use ccroll::windows::summarize_windows_by_month;
///
/// let summaries = summarize_windows_by_month(Vec::new(), Some(50));
/// assert!(summaries.is_empty());
/// ```
pub fn summarize_windows_by_month(
    windows: impl IntoIterator<Item = WindowUsage>,
    session_limit: Option<u32>,
) -> Vec<MonthlyWindowSummary> {
    let session_limit = session_limit.filter(|limit| *limit > 0);
    let mut by_month: BTreeMap<String, Vec<WindowUsage>> = BTreeMap::new();

    for window in windows {
        let month = window.window_id.get(..7).unwrap_or_default().to_string();
        by_month.entry(month).or_default().push(window);
    }

    by_month
        .into_iter()
        .rev()
        .map(|(month, mut windows)| {
            windows.sort_by(|a, b| b.window_id.cmp(&a.window_id));

            let window_count = windows.len();
            let total_cost: f64 = windows.iter().map(|w| w.total_cost).sum();
            let total_tokens = windows
                .iter()
                .fold(0u64, |acc, w| acc.saturating_add(w.tokens.total()));

            let count = u32::try_from(window_count).unwrap_or(u32::MAX);
            let remaining_sessions = session_limit.map(|limit| limit.saturating_sub(count));
            let utilization_percent =
                session_limit.map(|limit| window_count as f64 / f64::from(limit) * 100.0);

            MonthlyWindowSummary {
                month,
                window_count,
                total_cost,
                total_tokens,
                session_limit,
                remaining_sessions,
                utilization_percent,
                windows,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccroll_core::types::{ModelName, SYNTHETIC_MODEL, UsageRecord};

    fn entry(timestamp: &str, session: &str, model: Option<&str>, cost: f64) -> UsageEntry {
        UsageEntry {
            session: SessionKey::new("proj", session),
            record: UsageRecord {
                raw_timestamp: timestamp.to_string(),
                timestamp: ISOTimestamp::parse(timestamp).unwrap(),
                version: None,
                tokens: TokenCounts::new(10, 5, 0, 0),
                model: model.map(ModelName::new),
                message_id: None,
                request_id: None,
                cost_usd: None,
            },
            cost,
        }
    }

    #[test]
    fn test_window_boundaries() {
        let id = |s: &str| window_id(&ISOTimestamp::parse(s).unwrap());

        assert_eq!(id("2024-01-01T00:00:00Z"), "2024-01-01-00");
        assert_eq!(id("2024-01-01T04:59:59Z"), "2024-01-01-00");
        assert_eq!(id("2024-01-01T05:00:00Z"), "2024-01-01-05");
        assert_eq!(id("2024-01-01T19:59:59Z"), "2024-01-01-15");
        assert_eq!(id("2024-01-01T23:59:59Z"), "2024-01-01-20");
        // offsets are normalized to UTC first
        assert_eq!(id("2024-01-02T01:00:00+02:00"), "2024-01-01-20");
    }

    #[test]
    fn test_window_duration_and_cost() {
        let windows = compute_windows(&[
            entry("2024-01-01T10:00:00Z", "s1", Some("claude-3-opus"), 0.01),
            entry("2024-01-01T14:59:59Z", "s1", Some("claude-3-opus"), 0.02),
        ]);

        assert_eq!(windows.len(), 1);
        let window = &windows["2024-01-01-10"];
        assert_eq!(window.duration_ms, 17_999_000);
        assert!((window.total_cost - 0.03).abs() < 1e-9);
        assert_eq!(window.message_count, 2);
        assert_eq!(window.start_timestamp, "2024-01-01T10:00:00Z");
        assert_eq!(window.end_timestamp, "2024-01-01T14:59:59Z");
    }

    #[test]
    fn test_window_sessions_and_models() {
        let windows = compute_windows(&[
            entry("2024-01-01T10:30:00Z", "s2", Some("model-b"), 0.0),
            entry("2024-01-01T10:00:00Z", "s1", Some("model-a"), 0.0),
            entry("2024-01-01T11:00:00Z", "s2", Some(SYNTHETIC_MODEL), 0.0),
            entry("2024-01-01T12:00:00Z", "s1", Some("model-b"), 0.0),
            entry("2024-01-01T12:30:00Z", "s3", None, 0.0),
            entry("2024-01-01T15:00:00Z", "s1", Some("model-c"), 0.0),
        ]);

        assert_eq!(windows.len(), 2);

        let morning = &windows["2024-01-01-10"];
        assert_eq!(morning.session_count, 3);
        assert_eq!(morning.message_count, 5);
        assert_eq!(morning.models, vec!["model-b", "model-a"]);
        assert_eq!(morning.start_timestamp, "2024-01-01T10:00:00Z");
        assert_eq!(morning.duration_ms, 2 * 60 * 60 * 1000 + 30 * 60 * 1000);

        let afternoon = &windows["2024-01-01-15"];
        assert_eq!(afternoon.session_count, 1);
        assert_eq!(afternoon.duration_ms, 0);
    }

    #[test]
    fn test_monthly_summary_with_limit() {
        let entries: Vec<_> = (0..55)
            .map(|i| {
                let day = i / 5 + 1;
                let hour = (i % 5) * 5;
                entry(
                    &format!("2024-01-{day:02}T{hour:02}:00:00Z"),
                    "s",
                    None,
                    0.01,
                )
            })
            .collect();

        let windows = compute_windows(&entries);
        assert_eq!(windows.len(), 55);

        let summaries = summarize_windows_by_month(windows.into_values(), Some(50));
        assert_eq!(summaries.len(), 1);

        let january = &summaries[0];
        assert_eq!(january.window_count, 55);
        assert_eq!(january.remaining_sessions, Some(0));
        assert!((january.utilization_percent.unwrap() - 110.0).abs() < 1e-9);
        assert_eq!(january.total_tokens, 55 * 15);
        assert_eq!(january.windows[0].window_id, "2024-01-11-20");
        assert_eq!(january.windows[54].window_id, "2024-01-01-00");
    }

    #[test]
    fn test_monthly_summary_ordering_and_no_limit() {
        let windows = compute_windows(&[
            entry("2024-01-31T22:00:00Z", "s", None, 1.0),
            entry("2024-03-01T00:00:00Z", "s", None, 2.0),
            entry("2024-02-15T05:00:00Z", "s", None, 3.0),
        ]);

        let summaries = summarize_windows_by_month(windows.into_values(), None);
        let months: Vec<_> = summaries.iter().map(|s| s.month.as_str()).collect();
        assert_eq!(months, vec!["2024-03", "2024-02", "2024-01"]);
        assert!(summaries.iter().all(|s| s.session_limit.is_none()));
        assert!(summaries.iter().all(|s| s.remaining_sessions.is_none()));
        assert!(summaries.iter().all(|s| s.utilization_percent.is_none()));
    }

    #[test]
    fn test_remaining_sessions_under_limit() {
        let windows = compute_windows(&[
            entry("2024-01-01T00:00:00Z", "s", None, 0.0),
            entry("2024-01-01T05:00:00Z", "s", None, 0.0),
        ]);

        let summaries = summarize_windows_by_month(windows.into_values(), Some(8));
        assert_eq!(summaries[0].remaining_sessions, Some(6));
        assert!((summaries[0].utilization_percent.unwrap() - 25.0).abs() < 1e-9);

        let windows = compute_windows(&[entry("2024-01-01T00:00:00Z", "s", None, 0.0)]);
        let unlimited = summarize_windows_by_month(windows.into_values(), Some(0));
        assert!(unlimited[0].session_limit.is_none());
    }
}
