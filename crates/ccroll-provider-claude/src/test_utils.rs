//! Helpers for this crate's unit tests
//!
//! Integration tests under the workspace `tests/` directory carry their own
//! builders in `tests/common/mod.rs`; this module is only compiled for
//! `cargo test` on this crate.

use once_cell::sync::Lazy;
use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Serializes tests that touch process environment variables
pub static ENV_MUTEX: Lazy<tokio::sync::Mutex<()>> = Lazy::new(|| tokio::sync::Mutex::new(()));

/// Restores every variable it changed when dropped, panics included
#[derive(Default)]
pub struct EnvVarGuard {
    saved: Vec<(&'static str, Option<OsString>)>,
}

impl EnvVarGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &'static str, value: impl AsRef<OsStr>) {
        self.saved.push((key, env::var_os(key)));
        // SAFETY: callers hold ENV_MUTEX
        unsafe {
            env::set_var(key, value);
        }
    }

    pub fn remove(&mut self, key: &'static str) {
        self.saved.push((key, env::var_os(key)));
        // SAFETY: callers hold ENV_MUTEX
        unsafe {
            env::remove_var(key);
        }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..).rev() {
            unsafe {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }
    }
}

/// Write `lines` to `{root}/projects/{project}/{session}/{file_name}`
pub fn write_session_file(
    root: &Path,
    project: &str,
    session: &str,
    file_name: &str,
    lines: &[String],
) -> PathBuf {
    let dir = root.join("projects").join(project).join(session);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(file_name);
    std::fs::write(&path, lines.join("\n")).unwrap();
    path
}

/// A minimal valid usage line
pub fn usage_line(
    timestamp: &str,
    input_tokens: u64,
    message_id: Option<&str>,
    request_id: Option<&str>,
) -> String {
    let mut value = serde_json::json!({
        "timestamp": timestamp,
        "message": {
            "model": "claude-sonnet-4-20250514",
            "usage": { "input_tokens": input_tokens, "output_tokens": 0 }
        }
    });
    if let Some(id) = message_id {
        value["message"]["id"] = id.into();
    }
    if let Some(id) = request_id {
        value["requestId"] = id.into();
    }
    value.to_string()
}
