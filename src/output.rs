//! Output formatting module for ccroll
//!
//! This module provides formatters for displaying usage data in different formats:
//! - Table format for human-readable terminal output
//! - JSON format for machine-readable output and integration with other tools
//!
//! # Examples
//!
//! ```
//! use ccroll::output::get_formatter;
//! use ccroll_core::aggregation_types::{DailyUsage, Totals};
//! use ccroll_core::types::{DailyDate, TokenCounts};
//! use chrono::NaiveDate;
//!
//! let daily_data = vec![DailyUsage {
//!     date: DailyDate::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
//!     tokens: TokenCounts::new(1000, 500, 100, 50),
//!     total_cost: 0.025,
//!     models_used: vec!["claude-3-opus".to_string()],
//!     model_breakdowns: vec![],
//! }];
//!
//! let totals = Totals::from_daily(&daily_data);
//!
//! let table = get_formatter(false).format_daily(&daily_data, &totals);
//! assert!(table.contains("2024-01-01"));
//!
//! let json = get_formatter(true).format_daily(&daily_data, &totals);
//! assert!(json.contains("\"daily\""));
//! ```

use ccroll_core::aggregation_types::{
    DailyUsage, MonthlyUsage, MonthlyWindowSummary, SessionUsage, Totals, WindowUsage,
};
use prettytable::{Cell, Row, Table, format, row};
use serde_json::{Value, json};

/// Trait for output formatters
pub trait OutputFormatter {
    /// Format daily usage data with totals
    fn format_daily(&self, data: &[DailyUsage], totals: &Totals) -> String;

    /// Format session usage data with totals
    fn format_sessions(&self, data: &[SessionUsage], totals: &Totals) -> String;

    /// Format monthly usage data with totals
    fn format_monthly(&self, data: &[MonthlyUsage], totals: &Totals) -> String;

    /// Format 5-hour windows grouped by month
    fn format_windows(&self, data: &[MonthlyWindowSummary], totals: &Totals) -> String;
}

/// Table formatter for human-readable output
///
/// Numbers get thousands separators and costs a dollar sign.
pub struct TableFormatter;

impl TableFormatter {
    /// Format a number with thousands separators
    fn format_number(n: u64) -> String {
        let s = n.to_string();
        let mut result = String::new();

        for (count, ch) in s.chars().rev().enumerate() {
            if count > 0 && count % 3 == 0 {
                result.push(',');
            }
            result.push(ch);
        }

        result.chars().rev().collect()
    }

    /// Format currency with dollar sign
    fn format_currency(amount: f64) -> String {
        format!("${amount:.2}")
    }

    /// Format milliseconds as hours and minutes
    fn format_duration(ms: i64) -> String {
        let minutes = ms.max(0) / 60_000;
        format!("{}h {}m", minutes / 60, minutes % 60)
    }

    fn new_table() -> Table {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
        table
    }

    /// Create a totals row for the token-column tables
    fn format_totals_row(label_columns: usize, totals: &Totals) -> Row {
        let mut cells = vec![Cell::new("TOTAL").style_spec("b")];
        cells.extend((1..label_columns).map(|_| Cell::new("")));
        cells.extend([
            Cell::new(&Self::format_number(totals.tokens.input_tokens)).style_spec("br"),
            Cell::new(&Self::format_number(totals.tokens.output_tokens)).style_spec("br"),
            Cell::new(&Self::format_number(totals.tokens.cache_creation_tokens)).style_spec("br"),
            Cell::new(&Self::format_number(totals.tokens.cache_read_tokens)).style_spec("br"),
            Cell::new(&Self::format_number(totals.tokens.total())).style_spec("br"),
            Cell::new(&Self::format_currency(totals.total_cost)).style_spec("br"),
            Cell::new(""),
        ]);
        Row::new(cells)
    }

    fn separator(columns: usize) -> Row {
        Row::new(vec![Cell::new(""); columns])
    }

    fn format_window_row(window: &WindowUsage) -> Row {
        row![
            window.window_id,
            window.start_timestamp,
            Self::format_duration(window.duration_ms),
            r -> window.message_count,
            r -> window.session_count,
            r -> Self::format_number(window.tokens.total()),
            r -> Self::format_currency(window.total_cost),
            window.models.join(", ")
        ]
    }
}

impl OutputFormatter for TableFormatter {
    fn format_daily(&self, data: &[DailyUsage], totals: &Totals) -> String {
        let mut table = Self::new_table();

        table.set_titles(row![
            b -> "Date",
            b -> "Input",
            b -> "Output",
            b -> "Cache Create",
            b -> "Cache Read",
            b -> "Total",
            b -> "Cost",
            b -> "Models"
        ]);

        for entry in data {
            table.add_row(row![
                entry.date.format("%Y-%m-%d"),
                r -> Self::format_number(entry.tokens.input_tokens),
                r -> Self::format_number(entry.tokens.output_tokens),
                r -> Self::format_number(entry.tokens.cache_creation_tokens),
                r -> Self::format_number(entry.tokens.cache_read_tokens),
                r -> Self::format_number(entry.tokens.total()),
                r -> Self::format_currency(entry.total_cost),
                entry.models_used.join(", ")
            ]);
        }

        table.add_row(Self::separator(8));
        table.add_row(Self::format_totals_row(1, totals));

        table.to_string()
    }

    fn format_sessions(&self, data: &[SessionUsage], totals: &Totals) -> String {
        let mut table = Self::new_table();

        table.set_titles(row![
            b -> "Project",
            b -> "Session",
            b -> "Last Activity",
            b -> "Input",
            b -> "Output",
            b -> "Cache Create",
            b -> "Cache Read",
            b -> "Total",
            b -> "Cost",
            b -> "Models"
        ]);

        for session in data {
            table.add_row(row![
                session.project_path,
                session.session_id.as_str(),
                session.last_activity.format("%Y-%m-%d"),
                r -> Self::format_number(session.tokens.input_tokens),
                r -> Self::format_number(session.tokens.output_tokens),
                r -> Self::format_number(session.tokens.cache_creation_tokens),
                r -> Self::format_number(session.tokens.cache_read_tokens),
                r -> Self::format_number(session.tokens.total()),
                r -> Self::format_currency(session.total_cost),
                session.models_used.join(", ")
            ]);
        }

        table.add_row(Self::separator(10));
        table.add_row(Self::format_totals_row(3, totals));

        table.to_string()
    }

    fn format_monthly(&self, data: &[MonthlyUsage], totals: &Totals) -> String {
        let mut table = Self::new_table();

        table.set_titles(row![
            b -> "Month",
            b -> "Input",
            b -> "Output",
            b -> "Cache Create",
            b -> "Cache Read",
            b -> "Total",
            b -> "Cost",
            b -> "Models"
        ]);

        for entry in data {
            table.add_row(row![
                entry.month,
                r -> Self::format_number(entry.tokens.input_tokens),
                r -> Self::format_number(entry.tokens.output_tokens),
                r -> Self::format_number(entry.tokens.cache_creation_tokens),
                r -> Self::format_number(entry.tokens.cache_read_tokens),
                r -> Self::format_number(entry.tokens.total()),
                r -> Self::format_currency(entry.total_cost),
                entry.models_used.join(", ")
            ]);
        }

        table.add_row(Self::separator(8));
        table.add_row(Self::format_totals_row(1, totals));

        table.to_string()
    }

    fn format_windows(&self, data: &[MonthlyWindowSummary], totals: &Totals) -> String {
        let mut output = String::new();

        for summary in data {
            let mut header = format!(
                "{}: {} windows, {} tokens, {}",
                summary.month,
                summary.window_count,
                Self::format_number(summary.total_tokens),
                Self::format_currency(summary.total_cost)
            );
            if let (Some(limit), Some(remaining), Some(utilization)) = (
                summary.session_limit,
                summary.remaining_sessions,
                summary.utilization_percent,
            ) {
                header.push_str(&format!(
                    " (limit {limit}, {remaining} remaining, {utilization:.1}% used)"
                ));
            }
            output.push_str(&header);
            output.push('\n');

            let mut table = Self::new_table();
            table.set_titles(row![
                b -> "Window",
                b -> "First Activity",
                b -> "Duration",
                b -> "Messages",
                b -> "Sessions",
                b -> "Total Tokens",
                b -> "Cost",
                b -> "Models"
            ]);
            for window in &summary.windows {
                table.add_row(Self::format_window_row(window));
            }
            output.push_str(&table.to_string());
            output.push('\n');
        }

        output.push_str(&format!(
            "Total: {} tokens, {}\n",
            Self::format_number(totals.tokens.total()),
            Self::format_currency(totals.total_cost)
        ));
        output
    }
}

/// JSON formatter for machine-readable output
///
/// Rows are emitted exactly as the aggregate types serialize, next to a
/// `totals` object.
pub struct JsonFormatter;

impl JsonFormatter {
    fn render(key: &str, rows: Value, totals: &Totals) -> String {
        let mut output = serde_json::Map::new();
        output.insert(key.to_string(), rows);
        output.insert(
            "totals".to_string(),
            json!({
                "tokens": {
                    "input_tokens": totals.tokens.input_tokens,
                    "output_tokens": totals.tokens.output_tokens,
                    "cache_creation_tokens": totals.tokens.cache_creation_tokens,
                    "cache_read_tokens": totals.tokens.cache_read_tokens,
                    "total": totals.tokens.total(),
                },
                "total_cost": totals.total_cost,
            }),
        );

        let output = Value::Object(output);
        serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_daily(&self, data: &[DailyUsage], totals: &Totals) -> String {
        Self::render("daily", json!(data), totals)
    }

    fn format_sessions(&self, data: &[SessionUsage], totals: &Totals) -> String {
        Self::render("sessions", json!(data), totals)
    }

    fn format_monthly(&self, data: &[MonthlyUsage], totals: &Totals) -> String {
        Self::render("monthly", json!(data), totals)
    }

    fn format_windows(&self, data: &[MonthlyWindowSummary], totals: &Totals) -> String {
        Self::render("windows", json!(data), totals)
    }
}

/// Pick the formatter for `--json`
pub fn get_formatter(json: bool) -> Box<dyn OutputFormatter> {
    if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TableFormatter)
    }
}
