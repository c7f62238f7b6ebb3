//! Run-scoped duplicate suppression
//!
//! Claude Code rewrites earlier turns into new files when a conversation is
//! resumed, so the same API response can appear many times. The first
//! occurrence of a (message ID, request ID) pair wins.

use ccroll_core::types::UsageRecord;
use std::collections::HashSet;
use tracing::trace;

/// Tracks identity keys seen during one load
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<(String, String)>,
    duplicates: usize,
}

impl Deduplicator {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a record should be kept
    ///
    /// Records without an identity key are always kept.
    pub fn admit(&mut self, record: &UsageRecord) -> bool {
        let Some((msg_id, req_id)) = record.identity_key() else {
            return true;
        };

        if self.seen.insert((msg_id.to_string(), req_id.to_string())) {
            return true;
        }

        trace!("Skipping duplicate entry {} / {}", msg_id, req_id);
        self.duplicates += 1;
        false
    }

    /// Number of records rejected so far
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Number of distinct keys seen
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether no keyed record has been seen yet
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
