//! Claude Code provider for ccroll
//!
//! Finds the `.jsonl` logs Claude Code writes under its data directory,
//! orders them chronologically, validates each line into a
//! [`UsageRecord`](ccroll_core::UsageRecord) and drops repeated events.

pub mod data_loader;
pub mod dedup;
pub mod parser;

#[cfg(test)]
pub mod test_utils;

pub use data_loader::{CLAUDE_CONFIG_DIR_ENV, DataLoader, resolve_root};
pub use dedup::Deduplicator;
pub use parser::parse_usage_line;
