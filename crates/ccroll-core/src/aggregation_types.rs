//! Aggregation data types for ccroll
//!
//! Pure data structures produced by the aggregation passes. Every value is
//! built once per invocation and handed back to the caller; none of them
//! carry identity across calls.

use crate::types::{DailyDate, SessionId, TokenCounts};
use serde::{Deserialize, Serialize};

/// Per-model token and cost subtotal within an aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBreakdown {
    /// Model name
    pub model_name: String,
    /// Tokens attributed to this model
    pub tokens: TokenCounts,
    /// Cost attributed to this model in USD
    pub cost: f64,
}

/// Daily usage summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsage {
    /// Calendar date of usage
    pub date: DailyDate,
    /// Token counts for the day
    pub tokens: TokenCounts,
    /// Total cost for the day in USD
    pub total_cost: f64,
    /// Unique billable models used during the day, sorted
    pub models_used: Vec<String>,
    /// Per-model subtotals, highest cost first
    pub model_breakdowns: Vec<ModelBreakdown>,
}

/// Session usage summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUsage {
    /// Session identifier
    pub session_id: SessionId,
    /// Project path the session belongs to
    pub project_path: String,
    /// Token counts for the session
    pub tokens: TokenCounts,
    /// Total cost for the session in USD
    pub total_cost: f64,
    /// Date of the most recent event in the session
    pub last_activity: DailyDate,
    /// Tool versions seen in the session, unique and sorted
    pub versions: Vec<String>,
    /// Unique billable models used, sorted
    pub models_used: Vec<String>,
    /// Per-model subtotals, highest cost first
    pub model_breakdowns: Vec<ModelBreakdown>,
}

/// Monthly usage summary, re-aggregated from daily summaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyUsage {
    /// Year and month in YYYY-MM format
    pub month: String,
    /// Sum of the month's daily token counts
    pub tokens: TokenCounts,
    /// Sum of the month's daily costs in USD
    pub total_cost: f64,
    /// Unique billable models used during the month, sorted
    pub models_used: Vec<String>,
    /// Per-model subtotals merged from daily breakdowns, highest cost first
    pub model_breakdowns: Vec<ModelBreakdown>,
}

/// Usage inside one fixed 5-hour UTC window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowUsage {
    /// Window identifier, `YYYY-MM-DD-HH` with HH in {00,05,10,15,20}
    pub window_id: String,
    /// Earliest timestamp observed in the window
    pub start_timestamp: String,
    /// Latest timestamp observed in the window
    pub end_timestamp: String,
    /// Number of records in the window
    pub message_count: u64,
    /// Number of distinct sessions with records in the window
    pub session_count: usize,
    /// Token counts for the window
    pub tokens: TokenCounts,
    /// Total cost for the window in USD
    pub total_cost: f64,
    /// Milliseconds between the first and last record
    pub duration_ms: i64,
    /// Distinct billable models, in order of first appearance
    pub models: Vec<String>,
}

/// Windows rolled up per calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyWindowSummary {
    /// Year and month in YYYY-MM format
    pub month: String,
    /// Number of windows with activity during the month
    pub window_count: usize,
    /// Summed cost of the month's windows
    pub total_cost: f64,
    /// Summed tokens (all four categories) of the month's windows
    pub total_tokens: u64,
    /// Configured monthly session limit, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_limit: Option<u32>,
    /// Sessions left before the limit, floored at zero
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_sessions: Option<u32>,
    /// Window count as a percentage of the limit, may exceed 100
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization_percent: Option<f64>,
    /// The month's windows, most recent first
    pub windows: Vec<WindowUsage>,
}

/// Calculate totals from aggregated data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Totals {
    pub tokens: TokenCounts,
    pub total_cost: f64,
}

impl Totals {
    pub fn from_daily(daily_usage: &[DailyUsage]) -> Self {
        let mut totals = Self::default();
        for daily in daily_usage {
            totals.tokens += daily.tokens;
            totals.total_cost += daily.total_cost;
        }
        totals
    }

    pub fn from_sessions(sessions: &[SessionUsage]) -> Self {
        let mut totals = Self::default();
        for session in sessions {
            totals.tokens += session.tokens;
            totals.total_cost += session.total_cost;
        }
        totals
    }

    pub fn from_monthly(monthly_usage: &[MonthlyUsage]) -> Self {
        let mut totals = Self::default();
        for monthly in monthly_usage {
            totals.tokens += monthly.tokens;
            totals.total_cost += monthly.total_cost;
        }
        totals
    }

    pub fn from_windows(summaries: &[MonthlyWindowSummary]) -> Self {
        let mut totals = Self::default();
        for window in summaries.iter().flat_map(|s| &s.windows) {
            totals.tokens += window.tokens;
            totals.total_cost += window.total_cost;
        }
        totals
    }
}
