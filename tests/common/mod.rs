//! Common test utilities for ccroll integration tests
//!
//! Builders for Claude Code JSONL lines and a throwaway data directory laid
//! out the way Claude Code writes it: `{root}/projects/{project}/{session}/*.jsonl`.

#![allow(dead_code)]

use ccroll::LoadOptions;
use ccroll_core::timezone::TimezoneConfig;
use ccroll_core::types::{CostMode, ModelPricing};
use ccroll_pricing::StaticPricing;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Model priced by [`test_pricing`]
pub const SONNET: &str = "claude-sonnet-4-20250514";

/// Model priced by [`test_pricing`]
pub const OPUS: &str = "claude-opus-4-20250514";

/// Builder for one usage line
#[derive(Debug, Clone)]
pub struct LogLine {
    timestamp: String,
    model: Option<String>,
    input_tokens: u64,
    output_tokens: u64,
    cache_creation_tokens: u64,
    cache_read_tokens: u64,
    cost_usd: Option<f64>,
    message_id: Option<String>,
    request_id: Option<String>,
    version: Option<String>,
}

impl LogLine {
    pub fn new(timestamp: &str) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            model: Some(SONNET.to_string()),
            input_tokens: 100,
            output_tokens: 50,
            cache_creation_tokens: 0,
            cache_read_tokens: 0,
            cost_usd: None,
            message_id: None,
            request_id: None,
            version: None,
        }
    }

    pub fn model(mut self, model: &str) -> Self {
        self.model = Some(model.to_string());
        self
    }

    pub fn no_model(mut self) -> Self {
        self.model = None;
        self
    }

    pub fn tokens(mut self, input: u64, output: u64) -> Self {
        self.input_tokens = input;
        self.output_tokens = output;
        self
    }

    pub fn cache_tokens(mut self, creation: u64, read: u64) -> Self {
        self.cache_creation_tokens = creation;
        self.cache_read_tokens = read;
        self
    }

    pub fn cost(mut self, cost: f64) -> Self {
        self.cost_usd = Some(cost);
        self
    }

    pub fn ids(mut self, message_id: &str, request_id: &str) -> Self {
        self.message_id = Some(message_id.to_string());
        self.request_id = Some(request_id.to_string());
        self
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "timestamp": self.timestamp,
            "type": "assistant",
            "message": {
                "usage": {
                    "input_tokens": self.input_tokens,
                    "output_tokens": self.output_tokens,
                    "cache_creation_input_tokens": self.cache_creation_tokens,
                    "cache_read_input_tokens": self.cache_read_tokens,
                }
            }
        });
        if let Some(model) = &self.model {
            value["message"]["model"] = model.as_str().into();
        }
        if let Some(id) = &self.message_id {
            value["message"]["id"] = id.as_str().into();
        }
        if let Some(id) = &self.request_id {
            value["requestId"] = id.as_str().into();
        }
        if let Some(cost) = self.cost_usd {
            value["costUSD"] = cost.into();
        }
        if let Some(version) = &self.version {
            value["version"] = version.as_str().into();
        }
        value
    }
}

impl std::fmt::Display for LogLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_value())
    }
}

/// A temporary Claude data directory
pub struct ClaudeDir {
    dir: TempDir,
}

impl ClaudeDir {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("projects")).unwrap();
        Self { dir }
    }

    /// A root without a `projects/` directory
    pub fn without_projects() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write raw lines to `projects/{project}/{session}/{file_name}`
    pub fn write_raw(&self, project: &str, session: &str, file_name: &str, lines: &[&str]) -> PathBuf {
        let dir = self.root().join("projects").join(project).join(session);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file_name);
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    /// Write usage lines to `projects/{project}/{session}/{file_name}`
    pub fn write(&self, project: &str, session: &str, file_name: &str, lines: &[LogLine]) -> PathBuf {
        let rendered: Vec<String> = lines.iter().map(ToString::to_string).collect();
        let borrowed: Vec<&str> = rendered.iter().map(String::as_str).collect();
        self.write_raw(project, session, file_name, &borrowed)
    }

    /// UTC options for this root
    pub fn options(&self, mode: CostMode) -> LoadOptions {
        LoadOptions {
            root_path: Some(self.root().to_path_buf()),
            mode,
            offline: true,
            timezone: TimezoneConfig::utc(),
            ..Default::default()
        }
    }
}

/// Fixed rates for [`SONNET`] and [`OPUS`]
pub fn test_pricing() -> Arc<StaticPricing> {
    Arc::new(
        StaticPricing::new()
            .with_model(
                SONNET,
                ModelPricing {
                    input_cost_per_mtok: Some(3.0),
                    output_cost_per_mtok: Some(15.0),
                    cache_write_cost_per_mtok: Some(3.75),
                    cache_read_cost_per_mtok: Some(0.3),
                },
            )
            .with_model(
                OPUS,
                ModelPricing {
                    input_cost_per_mtok: Some(15.0),
                    output_cost_per_mtok: Some(75.0),
                    cache_write_cost_per_mtok: Some(18.75),
                    cache_read_cost_per_mtok: Some(1.5),
                },
            ),
    )
}

pub fn assert_cost_eq(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected cost {expected}, got {actual}"
    );
}
