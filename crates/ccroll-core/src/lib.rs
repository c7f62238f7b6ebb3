//! Core types, errors, and utilities for ccroll
//!
//! This crate provides the foundational types shared by the pricing,
//! provider, and aggregation crates: strongly-typed identifiers, token
//! counts, the validated usage record, aggregate summaries, date filters,
//! and timezone configuration.

pub mod aggregation_types;
pub mod error;
pub mod filters;
pub mod timezone;
pub mod types;

// Re-export commonly used types
pub use error::{CcrollError, Result};
pub use types::{
    CostMode, DailyDate, ISOTimestamp, ModelName, SessionId, SessionKey, SortOrder, TokenCounts,
    UsageEntry, UsageRecord,
};
