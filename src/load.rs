//! Aggregation entry points
//!
//! Each `load_*` call runs the whole pipeline once: resolve the data
//! directory, order and read the log files, validate and deduplicate
//! records, resolve costs, then fold, filter and sort. Nothing is shared
//! between calls, so concurrent loads against the same directory are safe.
//!
//! The pricing provider is acquired inside the call (only for modes that
//! can need it) and released before the call returns.
//!
//! # Examples
//!
//! ```no_run
//! use ccroll::load::{LoadOptions, load_daily};
//! use ccroll_core::types::{CostMode, SortOrder};
//!
//! # async fn example() -> ccroll_core::Result<()> {
//! let options = LoadOptions {
//!     mode: CostMode::Display,
//!     order: SortOrder::Asc,
//!     ..Default::default()
//! };
//!
//! for day in load_daily(&options).await? {
//!     println!("{}: ${:.2}", day.date, day.total_cost);
//! }
//! # Ok(())
//! # }
//! ```

use crate::aggregation::{Aggregator, filter_by_date, sort_by_date};
use crate::windows::{compute_windows, summarize_windows_by_month};
use ccroll_core::aggregation_types::{
    DailyUsage, MonthlyUsage, MonthlyWindowSummary, SessionUsage, WindowUsage,
};
use ccroll_core::error::{CcrollError, Result};
use ccroll_core::filters::DateFilter;
use ccroll_core::timezone::TimezoneConfig;
use ccroll_core::types::{CostMode, SortOrder, UsageEntry};
use ccroll_pricing::{CostCalculator, PricingSource};
use ccroll_provider_claude::DataLoader;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Options shared by every entry point
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Claude data directory; `CLAUDE_CONFIG_DIR` or `~/.claude` when unset
    pub root_path: Option<PathBuf>,
    /// How each record's cost is determined
    pub mode: CostMode,
    /// Sort direction of the returned rows
    pub order: SortOrder,
    /// Use the embedded pricing snapshot instead of fetching
    pub offline: bool,
    /// Earliest representative date to keep (inclusive)
    pub since: Option<NaiveDate>,
    /// Latest representative date to keep (inclusive)
    pub until: Option<NaiveDate>,
    /// Timezone for calendar dates; windows always use UTC
    pub timezone: TimezoneConfig,
}

impl LoadOptions {
    /// The inclusive date range these options describe
    pub fn date_filter(&self) -> DateFilter {
        DateFilter {
            since: self.since,
            until: self.until,
        }
    }
}

/// Runs the load pipeline for one set of options
///
/// A pricing source can be injected for `calculate` and `auto` modes;
/// otherwise a [`PricingFetcher`](ccroll_pricing::PricingFetcher) is built
/// per call.
pub struct UsageLoader {
    options: LoadOptions,
    pricing: Option<Arc<dyn PricingSource>>,
}

impl UsageLoader {
    /// Loader that builds its own pricing provider when the mode needs one
    pub fn new(options: LoadOptions) -> Self {
        Self {
            options,
            pricing: None,
        }
    }

    /// Use `source` instead of fetching pricing data
    pub fn with_pricing_source(mut self, source: Arc<dyn PricingSource>) -> Self {
        self.pricing = Some(source);
        self
    }

    /// The options every load uses
    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Deduplicated records with their resolved costs, in load order
    pub async fn load_entries(&self) -> Result<Vec<UsageEntry>> {
        let loader = DataLoader::new(self.options.root_path.as_deref()).await?;
        let records = loader.load_records().await?;

        let mode = self.options.mode;
        let calculator = match &self.pricing {
            Some(source) if mode.needs_pricing() => CostCalculator::with_source(source.clone()),
            _ => CostCalculator::for_mode(mode, self.options.offline).await,
        };

        let mut entries = Vec::with_capacity(records.len());
        for (session, record) in records {
            let cost = calculator.resolve(&record, mode).await?;
            entries.push(UsageEntry {
                session,
                record,
                cost,
            });
        }

        info!(
            "Resolved costs for {} entries (mode: {})",
            entries.len(),
            mode
        );
        Ok(entries)
    }

    fn aggregator(&self) -> Aggregator {
        Aggregator::new(self.options.timezone.clone())
    }

    /// Daily summaries, filtered and sorted
    pub async fn load_daily(&self) -> Result<Vec<DailyUsage>> {
        let entries = self.load_entries().await?;
        let mut daily = self.aggregator().aggregate_daily(&entries);

        filter_by_date(&mut daily, &self.options.date_filter());
        sort_by_date(&mut daily, self.options.order);
        debug!("Produced {} daily rows", daily.len());
        Ok(daily)
    }

    /// Session summaries, filtered and sorted by last activity
    pub async fn load_session(&self) -> Result<Vec<SessionUsage>> {
        let entries = self.load_entries().await?;
        let mut sessions = self.aggregator().aggregate_sessions(&entries);

        filter_by_date(&mut sessions, &self.options.date_filter());
        sort_by_date(&mut sessions, self.options.order);
        debug!("Produced {} session rows", sessions.len());
        Ok(sessions)
    }

    /// Monthly summaries derived from unfiltered daily summaries
    ///
    /// The date range applies to each month's first day.
    pub async fn load_monthly(&self) -> Result<Vec<MonthlyUsage>> {
        let entries = self.load_entries().await?;
        let daily = self.aggregator().aggregate_daily(&entries);
        let mut monthly = Aggregator::aggregate_monthly(&daily);

        filter_by_date(&mut monthly, &self.options.date_filter());
        sort_by_date(&mut monthly, self.options.order);
        debug!("Produced {} monthly rows", monthly.len());
        Ok(monthly)
    }

    /// Window summaries by month, most recent first
    ///
    /// The date range applies to each window's UTC date. `order` does not
    /// apply here.
    ///
    /// # Errors
    ///
    /// Returns [`CcrollError::InvalidArgument`] for a session limit of zero,
    /// before any file is read.
    pub async fn load_windows(&self, session_limit: Option<u32>) -> Result<Vec<MonthlyWindowSummary>> {
        if session_limit == Some(0) {
            return Err(CcrollError::InvalidArgument(
                "session limit must be at least 1".to_string(),
            ));
        }

        let entries = self.load_entries().await?;
        let mut windows: Vec<WindowUsage> = compute_windows(&entries).into_values().collect();

        filter_by_date(&mut windows, &self.options.date_filter());
        debug!("Produced {} windows", windows.len());
        Ok(summarize_windows_by_month(windows, session_limit))
    }
}

/// Daily usage for `options`
pub async fn load_daily(options: &LoadOptions) -> Result<Vec<DailyUsage>> {
    UsageLoader::new(options.clone()).load_daily().await
}

/// Session usage for `options`
pub async fn load_session(options: &LoadOptions) -> Result<Vec<SessionUsage>> {
    UsageLoader::new(options.clone()).load_session().await
}

/// Monthly usage for `options`
pub async fn load_monthly(options: &LoadOptions) -> Result<Vec<MonthlyUsage>> {
    UsageLoader::new(options.clone()).load_monthly().await
}

/// Monthly window summaries for `options`
pub async fn load_windows(
    options: &LoadOptions,
    session_limit: Option<u32>,
) -> Result<Vec<MonthlyWindowSummary>> {
    UsageLoader::new(options.clone())
        .load_windows(session_limit)
        .await
}
