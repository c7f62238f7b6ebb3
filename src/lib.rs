//! ccroll - Roll up Claude Code usage logs
//!
//! This library turns the JSONL logs Claude Code writes under `~/.claude`
//! into usage reports:
//! - Daily, per-session and monthly token and cost summaries
//! - Fixed 5-hour UTC usage windows, rolled up by month against an
//!   optional session limit
//! - Costs taken from the logs, calculated from LiteLLM pricing, or both
//! - Table and JSON output
//!
//! # Examples
//!
//! ```no_run
//! use ccroll::{LoadOptions, load_daily, load_windows};
//! use ccroll_core::types::CostMode;
//!
//! #[tokio::main]
//! async fn main() -> ccroll::Result<()> {
//!     let options = LoadOptions {
//!         mode: CostMode::Auto,
//!         offline: true,
//!         ..Default::default()
//!     };
//!
//!     let daily = load_daily(&options).await?;
//!     let windows = load_windows(&options, Some(50)).await?;
//!     println!("{} days, {} months of windows", daily.len(), windows.len());
//!     Ok(())
//! }
//! ```

pub mod aggregation;
pub mod cli;
pub mod load;
pub mod output;
pub mod windows;

// Re-export commonly used types
pub use ccroll_core::aggregation_types::{
    DailyUsage, ModelBreakdown, MonthlyUsage, MonthlyWindowSummary, SessionUsage, Totals,
    WindowUsage,
};
pub use ccroll_core::{CcrollError, CostMode, Result, SortOrder};
pub use load::{LoadOptions, UsageLoader, load_daily, load_monthly, load_session, load_windows};
pub use windows::{compute_windows, summarize_windows_by_month};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
