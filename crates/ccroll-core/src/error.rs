//! Error types for ccroll
//!
//! Only failures that abort a whole aggregation call are represented here.
//! Malformed lines and unreadable files are recovered where they occur and
//! never surface as a `CcrollError`.
//!
//! # Example
//!
//! ```
//! use ccroll_core::error::{CcrollError, Result};
//!
//! fn example_function() -> Result<()> {
//!     // io::Error converts into CcrollError automatically
//!     let _file = std::fs::read_to_string("nonexistent.txt")?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for ccroll operations
#[derive(Error, Debug)]
pub enum CcrollError {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// The data root could not be resolved to an existing directory
    #[error("Invalid Claude data directory {}: {reason}", path.display())]
    DataDirectory {
        /// The path that was resolved
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },

    /// Invalid date format
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Invalid timezone
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A caller-supplied option is out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Convenience type alias for Results in ccroll
///
/// # Example
///
/// ```
/// use ccroll_core::Result;
///
/// fn process_data() -> Result<String> {
///     Ok("Processed successfully".to_string())
/// }
/// ```
pub type Result<T> = std::result::Result<T, CcrollError>;
