//! CLI interface for ccroll
//!
//! This module defines the command-line interface using clap. Every report
//! shares one set of global flags that map onto [`LoadOptions`].
//!
//! # Example
//!
//! ```bash
//! # Daily usage for January 2024, oldest first
//! ccroll daily --since 20240101 --until 20240131 --order asc
//!
//! # Sessions as JSON without touching the network
//! ccroll session --mode display --json
//!
//! # 5-hour windows against a 50-session monthly allowance
//! ccroll windows --session-limit 50
//! ```

use crate::load::LoadOptions;
use ccroll_core::error::Result;
use ccroll_core::filters::parse_compact_date;
use ccroll_core::timezone::TimezoneConfig;
use ccroll_core::types::{CostMode, SortOrder};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Roll up Claude Code usage logs
#[derive(Parser, Debug, Clone)]
#[command(name = "ccroll")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show informational output (default is quiet mode with only warnings and errors)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Claude data directory (defaults to $CLAUDE_CONFIG_DIR, then ~/.claude)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Cost calculation mode: auto, calculate or display
    #[arg(long, default_value_t = CostMode::Auto, global = true)]
    pub mode: CostMode,

    /// Sort order: asc or desc
    #[arg(long, default_value_t = SortOrder::Desc, global = true)]
    pub order: SortOrder,

    /// Use the bundled pricing snapshot instead of fetching LiteLLM data
    #[arg(long, global = true)]
    pub offline: bool,

    /// Filter by start date (YYYYMMDD, inclusive)
    #[arg(long, value_parser = parse_date_arg, global = true)]
    pub since: Option<NaiveDate>,

    /// Filter by end date (YYYYMMDD, inclusive)
    #[arg(long, value_parser = parse_date_arg, global = true)]
    pub until: Option<NaiveDate>,

    /// Timezone for date grouping (e.g. "America/New_York", "Asia/Tokyo", "UTC")
    /// If not specified, uses the system's local timezone
    #[arg(long, short = 'z', global = true)]
    pub timezone: Option<String>,

    /// Use UTC for date grouping (overrides --timezone)
    #[arg(long, global = true)]
    pub utc: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available reports
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show daily usage summary
    Daily,
    /// Show usage per conversation session
    Session,
    /// Show monthly usage summary
    Monthly,
    /// Show fixed 5-hour usage windows grouped by month
    Windows {
        /// Monthly session allowance to measure windows against
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        session_limit: Option<u32>,
    },
}

impl Cli {
    /// Build load options from the global flags
    ///
    /// # Errors
    ///
    /// Returns an error if the timezone name is not recognized.
    pub fn load_options(&self) -> Result<LoadOptions> {
        Ok(LoadOptions {
            root_path: self.root.clone(),
            mode: self.mode,
            order: self.order,
            offline: self.offline,
            since: self.since,
            until: self.until,
            timezone: TimezoneConfig::from_cli(self.timezone.as_deref(), self.utc)?,
        })
    }
}

/// clap adapter for compact `YYYYMMDD` dates
fn parse_date_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_compact_date(s).map_err(|e| e.to_string())
}
