//! Aggregation module for summarizing usage data
//!
//! Every function here is a pure fold over already deduplicated and costed
//! [`UsageEntry`] values: no I/O, no pricing lookups, no state kept between
//! calls. Grouping goes through `BTreeMap`s so that output order is
//! deterministic before any caller-requested sort is applied.
//!
//! Records served by the synthetic model (`<synthetic>`) still count toward
//! totals but never appear in `models_used` or in model breakdowns.
//!
//! # Examples
//!
//! ```
//! use ccroll::aggregation::Aggregator;
//! use ccroll_core::timezone::TimezoneConfig;
//!
//! let aggregator = Aggregator::new(TimezoneConfig::utc());
//! let daily = aggregator.aggregate_daily(&[]);
//! let monthly = Aggregator::aggregate_monthly(&daily);
//! assert!(monthly.is_empty());
//! ```

use ccroll_core::aggregation_types::{
    DailyUsage, ModelBreakdown, MonthlyUsage, SessionUsage, WindowUsage,
};
use ccroll_core::filters::DateFilter;
use ccroll_core::timezone::TimezoneConfig;
use ccroll_core::types::{
    DailyDate, ISOTimestamp, ModelName, SessionKey, SortOrder, TokenCounts, UsageEntry,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

/// Per-model token and cost sums, synthetic model excluded
#[derive(Default)]
struct BreakdownAccumulator {
    models: BTreeMap<String, (TokenCounts, f64)>,
}

impl BreakdownAccumulator {
    fn add(&mut self, model: Option<&ModelName>, tokens: TokenCounts, cost: f64) {
        let Some(model) = model.filter(|m| !m.is_synthetic()) else {
            return;
        };
        let slot = self
            .models
            .entry(model.as_str().to_string())
            .or_insert((TokenCounts::default(), 0.0));
        slot.0 += tokens;
        slot.1 += cost;
    }

    fn merge(&mut self, breakdowns: &[ModelBreakdown]) {
        for b in breakdowns {
            let slot = self
                .models
                .entry(b.model_name.clone())
                .or_insert((TokenCounts::default(), 0.0));
            slot.0 += b.tokens;
            slot.1 += b.cost;
        }
    }

    /// Sorted model names and breakdowns, highest cost first
    fn finish(self) -> (Vec<String>, Vec<ModelBreakdown>) {
        let models_used = self.models.keys().cloned().collect();
        let mut breakdowns: Vec<ModelBreakdown> = self
            .models
            .into_iter()
            .map(|(model_name, (tokens, cost))| ModelBreakdown {
                model_name,
                tokens,
                cost,
            })
            .collect();
        breakdowns.sort_by(|a, b| b.cost.total_cmp(&a.cost));
        (models_used, breakdowns)
    }
}

/// Accumulator for daily aggregation
#[derive(Default)]
struct DailyAccumulator {
    tokens: TokenCounts,
    cost: f64,
    breakdown: BreakdownAccumulator,
}

impl DailyAccumulator {
    fn add_entry(&mut self, entry: &UsageEntry) {
        self.tokens += entry.record.tokens;
        self.cost += entry.cost;
        self.breakdown
            .add(entry.record.model.as_ref(), entry.record.tokens, entry.cost);
    }

    fn into_daily_usage(self, date: DailyDate) -> DailyUsage {
        let (models_used, model_breakdowns) = self.breakdown.finish();
        DailyUsage {
            date,
            tokens: self.tokens,
            total_cost: self.cost,
            models_used,
            model_breakdowns,
        }
    }
}

/// Accumulator for session aggregation
#[derive(Default)]
struct SessionAccumulator {
    tokens: TokenCounts,
    cost: f64,
    /// Raw and parsed timestamp of the latest record
    latest: Option<(String, ISOTimestamp)>,
    versions: BTreeSet<String>,
    breakdown: BreakdownAccumulator,
}

impl SessionAccumulator {
    fn add_entry(&mut self, entry: &UsageEntry) {
        let record = &entry.record;

        self.tokens += record.tokens;
        self.cost += entry.cost;
        self.breakdown
            .add(record.model.as_ref(), record.tokens, entry.cost);

        if let Some(version) = &record.version {
            self.versions.insert(version.clone());
        }

        let is_later = match &self.latest {
            Some((raw, _)) => record.raw_timestamp > *raw,
            None => true,
        };
        if is_later {
            self.latest = Some((record.raw_timestamp.clone(), record.timestamp));
        }
    }

    fn into_session_usage(self, key: SessionKey, tz: &chrono_tz::Tz) -> Option<SessionUsage> {
        let (_, latest) = self.latest?;
        let (models_used, model_breakdowns) = self.breakdown.finish();
        Some(SessionUsage {
            session_id: key.session_id,
            project_path: key.project_path,
            tokens: self.tokens,
            total_cost: self.cost,
            last_activity: latest.to_daily_date_with_tz(tz),
            versions: self.versions.into_iter().collect(),
            models_used,
            model_breakdowns,
        })
    }
}

/// Main aggregation engine
///
/// Holds only the timezone used to turn timestamps into calendar dates.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    timezone_config: TimezoneConfig,
}

impl Aggregator {
    /// Create a new Aggregator
    pub fn new(timezone_config: TimezoneConfig) -> Self {
        Self { timezone_config }
    }

    /// Get the timezone configuration
    pub fn timezone_config(&self) -> &TimezoneConfig {
        &self.timezone_config
    }

    /// Group entries by calendar date, oldest first
    pub fn aggregate_daily(&self, entries: &[UsageEntry]) -> Vec<DailyUsage> {
        let mut daily_map: BTreeMap<DailyDate, DailyAccumulator> = BTreeMap::new();

        for entry in entries {
            let date = DailyDate::from_timestamp_with_tz(
                &entry.record.timestamp,
                &self.timezone_config.tz,
            );
            daily_map.entry(date).or_default().add_entry(entry);
        }

        daily_map
            .into_iter()
            .map(|(date, acc)| acc.into_daily_usage(date))
            .collect()
    }

    /// Group entries by project path and session ID
    pub fn aggregate_sessions(&self, entries: &[UsageEntry]) -> Vec<SessionUsage> {
        let mut session_map: BTreeMap<SessionKey, SessionAccumulator> = BTreeMap::new();

        for entry in entries {
            session_map
                .entry(entry.session.clone())
                .or_default()
                .add_entry(entry);
        }

        session_map
            .into_iter()
            .filter_map(|(key, acc)| acc.into_session_usage(key, &self.timezone_config.tz))
            .collect()
    }

    /// Re-aggregate daily summaries by `YYYY-MM`, oldest first
    ///
    /// Totals are the sums of daily totals and breakdowns are merged from
    /// daily breakdowns, so the month never sees raw records.
    pub fn aggregate_monthly(daily_usage: &[DailyUsage]) -> Vec<MonthlyUsage> {
        let mut monthly_map: BTreeMap<String, (TokenCounts, f64, BreakdownAccumulator)> =
            BTreeMap::new();

        for daily in daily_usage {
            let entry = monthly_map
                .entry(daily.date.month_key())
                .or_insert_with(|| (TokenCounts::default(), 0.0, BreakdownAccumulator::default()));

            entry.0 += daily.tokens;
            entry.1 += daily.total_cost;
            entry.2.merge(&daily.model_breakdowns);
        }

        monthly_map
            .into_iter()
            .map(|(month, (tokens, total_cost, breakdown))| {
                let (models_used, model_breakdowns) = breakdown.finish();
                MonthlyUsage {
                    month,
                    tokens,
                    total_cost,
                    models_used,
                    model_breakdowns,
                }
            })
            .collect()
    }
}

/// A report row with a representative calendar date
///
/// Date filters and sort order both key on this date.
pub trait Dated {
    /// The row's representative date, if it has a well-formed one
    fn representative_date(&self) -> Option<NaiveDate>;
}

impl Dated for DailyUsage {
    fn representative_date(&self) -> Option<NaiveDate> {
        Some(*self.date.inner())
    }
}

impl Dated for SessionUsage {
    fn representative_date(&self) -> Option<NaiveDate> {
        Some(*self.last_activity.inner())
    }
}

impl Dated for MonthlyUsage {
    fn representative_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&format!("{}-01", self.month), "%Y-%m-%d").ok()
    }
}

impl Dated for WindowUsage {
    fn representative_date(&self) -> Option<NaiveDate> {
        let date = self.window_id.get(..10)?;
        NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
    }
}

/// Keep rows whose representative date falls inside `filter`
///
/// Rows without a representative date only survive an empty filter.
pub fn filter_by_date<T: Dated>(rows: &mut Vec<T>, filter: &DateFilter) {
    if filter.is_empty() {
        return;
    }
    rows.retain(|row| {
        row.representative_date()
            .is_some_and(|date| filter.matches(&date))
    });
}

/// Stable sort by representative date
pub fn sort_by_date<T: Dated>(rows: &mut [T], order: SortOrder) {
    match order {
        SortOrder::Asc => rows.sort_by_key(|row| row.representative_date()),
        SortOrder::Desc => {
            rows.sort_by(|a, b| b.representative_date().cmp(&a.representative_date()))
        }
    }
}
