//! Data loader module for discovering and reading Claude Code logs
//!
//! Claude Code keeps one directory per conversation:
//!
//! ```text
//! {root}/projects/{project path segments...}/{session id}/{name}.jsonl
//! ```
//!
//! The root is `~/.claude` unless `CLAUDE_CONFIG_DIR` or an explicit path
//! says otherwise. Files are read one at a time in order of their earliest
//! timestamp, so duplicate suppression always keeps the oldest copy of an
//! event.
//!
//! # Examples
//!
//! ```no_run
//! use ccroll_provider_claude::DataLoader;
//!
//! # async fn example() -> ccroll_core::Result<()> {
//! let loader = DataLoader::new(None).await?;
//!
//! for (session, record) in loader.load_records().await? {
//!     println!("{}: {} tokens", session, record.tokens.total());
//! }
//! # Ok(())
//! # }
//! ```

use crate::dedup::Deduplicator;
use crate::parser::{parse_timestamp_only, parse_usage_line};
use ccroll_core::error::{CcrollError, Result};
use ccroll_core::types::{ISOTimestamp, SessionKey, UsageRecord};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::io::{BufRead, BufReader};
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncBufReadExt;
use tracing::{debug, info};

/// Environment variable overriding the Claude data directory
pub const CLAUDE_CONFIG_DIR_ENV: &str = "CLAUDE_CONFIG_DIR";

/// Subdirectory holding per-project conversation logs
const PROJECTS_DIR: &str = "projects";

/// Session ID used for a log sitting directly in `projects/`
const UNKNOWN_SESSION: &str = "unknown";

/// Resolve the Claude data directory
///
/// An explicit path wins, then `CLAUDE_CONFIG_DIR` (trimmed, ignored when
/// blank), then `~/.claude`. The result must be an existing directory.
pub fn resolve_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let candidate = match explicit {
        Some(path) => path.to_path_buf(),
        None => match std::env::var(CLAUDE_CONFIG_DIR_ENV) {
            Ok(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
            _ => dirs::home_dir()
                .map(|home| home.join(".claude"))
                .ok_or_else(|| CcrollError::DataDirectory {
                    path: PathBuf::from("~/.claude"),
                    reason: "home directory could not be determined".to_string(),
                })?,
        },
    };

    if !candidate.exists() {
        return Err(CcrollError::DataDirectory {
            path: candidate,
            reason: "directory does not exist".to_string(),
        });
    }
    if !candidate.is_dir() {
        return Err(CcrollError::DataDirectory {
            path: candidate,
            reason: "not a directory".to_string(),
        });
    }

    debug!("Using Claude data directory {}", candidate.display());
    Ok(candidate)
}

/// Earliest valid timestamp in a file
///
/// Malformed lines are skipped; an unreadable file has no timestamp.
pub fn get_earliest_timestamp(path: &Path) -> Option<ISOTimestamp> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!("Cannot open {} for timestamp scan: {}", path.display(), e);
            return None;
        }
    };

    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut line_no = 0usize;
    let mut earliest: Option<ISOTimestamp> = None;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => line_no += 1,
            Err(e) => {
                debug!("Timestamp scan of {} stopped: {}", path.display(), e);
                break;
            }
        }

        let Some(line) = decode_line(&buf, path, line_no) else {
            continue;
        };
        if let Some(ts) = parse_timestamp_only(line)
            && earliest.is_none_or(|current| ts < current)
        {
            earliest = Some(ts);
        }
    }

    earliest
}

/// One raw line as UTF-8, or `None` (logged) when it is not valid text
fn decode_line<'a>(buf: &'a [u8], path: &Path, line_no: usize) -> Option<&'a str> {
    match std::str::from_utf8(buf) {
        Ok(line) => Some(line),
        Err(e) => {
            debug!(
                "Skipping line {} of {}: invalid UTF-8 ({})",
                line_no,
                path.display(),
                e
            );
            None
        }
    }
}

/// Order files by their earliest timestamp, oldest first
///
/// Files without a timestamp go last. The sort is stable, so ties keep
/// their discovery order. Files are scanned in parallel.
pub fn sort_files_by_timestamp(files: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut scanned: Vec<(PathBuf, Option<ISOTimestamp>)> = files
        .into_par_iter()
        .map(|path| {
            let earliest = get_earliest_timestamp(&path);
            (path, earliest)
        })
        .collect();

    scanned.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    scanned.into_iter().map(|(path, _)| path).collect()
}

/// Session key for a log file, from its location under `projects_dir`
///
/// Returns `None` when the file is not below `projects_dir`.
pub fn session_key_from_path(projects_dir: &Path, file: &Path) -> Option<SessionKey> {
    let relative = file.strip_prefix(projects_dir).ok()?;
    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    // last segment is the file itself
    let dirs = segments.split_last().map(|(_, dirs)| dirs)?;
    let (session_id, project) = match dirs.split_last() {
        Some((session, project)) => (session.clone(), project),
        None => (UNKNOWN_SESSION.to_string(), &[][..]),
    };

    let project_path = project.join(std::path::MAIN_SEPARATOR_STR);
    Some(SessionKey::new(project_path, session_id))
}

/// Data loader for discovering and reading JSONL files
pub struct DataLoader {
    /// Resolved Claude data directory
    claude_path: PathBuf,
}

impl DataLoader {
    /// Create a loader for the resolved data directory
    ///
    /// # Errors
    ///
    /// Returns [`CcrollError::DataDirectory`] if the directory is missing
    /// or is not a directory.
    pub async fn new(root: Option<&Path>) -> Result<Self> {
        let claude_path = resolve_root(root)?;
        Ok(Self { claude_path })
    }

    /// The resolved data directory
    pub fn root(&self) -> &Path {
        &self.claude_path
    }

    /// Directory holding per-project logs
    pub fn projects_dir(&self) -> PathBuf {
        self.claude_path.join(PROJECTS_DIR)
    }

    /// Find all JSONL files under `projects/`, in file-name order
    ///
    /// A missing `projects/` directory yields no files.
    pub async fn find_jsonl_files(&self) -> Result<Vec<PathBuf>> {
        let projects_dir = self.projects_dir();
        if !projects_dir.is_dir() {
            debug!("No projects directory at {}", projects_dir.display());
            return Ok(Vec::new());
        }

        let files = tokio::task::spawn_blocking(move || {
            use walkdir::WalkDir;

            WalkDir::new(projects_dir)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        debug!("Skipping unreadable path: {}", e);
                        None
                    }
                })
                .filter(|entry| {
                    entry.file_type().is_file()
                        && entry.path().extension().and_then(|s| s.to_str()) == Some("jsonl")
                })
                .map(|entry| entry.into_path())
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| CcrollError::Io(std::io::Error::other(e.to_string())))?;

        info!("Found {} JSONL files to process", files.len());
        Ok(files)
    }

    /// Find all JSONL files, oldest content first
    pub async fn sorted_jsonl_files(&self) -> Result<Vec<PathBuf>> {
        let files = self.find_jsonl_files().await?;
        if files.len() < 2 {
            return Ok(files);
        }

        tokio::task::spawn_blocking(move || sort_files_by_timestamp(files))
            .await
            .map_err(|e| CcrollError::Io(std::io::Error::other(e.to_string())))
    }

    /// Load every valid, deduplicated record with its session key
    ///
    /// Files are read sequentially in chronological order. Unreadable files
    /// and invalid lines are skipped.
    pub async fn load_records(&self) -> Result<Vec<(SessionKey, UsageRecord)>> {
        let projects_dir = self.projects_dir();
        let files = self.sorted_jsonl_files().await?;

        let mut dedup = Deduplicator::new();
        let mut records = Vec::new();

        for path in files {
            let Some(session) = session_key_from_path(&projects_dir, &path) else {
                debug!("Skipping {} outside projects directory", path.display());
                continue;
            };

            if let Err(e) = Self::read_file(&path, &session, &mut dedup, &mut records).await {
                debug!("Skipping unreadable file {}: {}", path.display(), e);
            }
        }

        if dedup.duplicates() > 0 {
            info!("Skipped {} duplicate entries", dedup.duplicates());
        }
        debug!("Loaded {} usage records", records.len());

        Ok(records)
    }

    /// Append one file's admitted records to `out`
    async fn read_file(
        path: &Path,
        session: &SessionKey,
        dedup: &mut Deduplicator,
        out: &mut Vec<(SessionKey, UsageRecord)>,
    ) -> Result<()> {
        let file = tokio::fs::File::open(path).await?;
        let mut reader = tokio::io::BufReader::new(file);
        let mut buf = Vec::new();
        let mut line_no = 0usize;
        let mut rejected = 0usize;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            line_no += 1;

            let Some(line) = decode_line(&buf, path, line_no) else {
                rejected += 1;
                continue;
            };
            if line.trim().is_empty() {
                continue;
            }

            match parse_usage_line(line) {
                Some(record) => {
                    if dedup.admit(&record) {
                        out.push((session.clone(), record));
                    }
                }
                None => rejected += 1,
            }
        }

        if rejected > 0 {
            debug!("Skipped {} non-usage lines in {}", rejected, path.display());
        }
        Ok(())
    }
}
