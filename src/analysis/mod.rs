//! Change detection between the stored snapshot and the current friend list.
//!
//! Analysis is a pure function of the two lists; printing the report and
//! appending to the activity log are separate steps so a failed append
//! never hides the report.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use console::style;
use tracing::info;

use crate::error::{Result, TrackerError};
use crate::model::{nameless_fraction, FriendRecord, UserId};

/// Timestamp layout used in the activity log.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Friends that disappeared and appeared between two lists.
///
/// Both sides are ordered by ascending identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    /// In the old snapshot, absent now. Resolved from the old snapshot.
    pub removed: Vec<FriendRecord>,
    /// Absent from the old snapshot, present now. Resolved from the current list.
    pub added: Vec<FriendRecord>,
}

impl ChangeSet {
    /// Diff `old` against `current` by identifier.
    #[must_use]
    pub fn compute(old: &[FriendRecord], current: &[FriendRecord]) -> Self {
        let old_map: HashMap<UserId, &FriendRecord> = old.iter().map(|r| (r.id, r)).collect();
        let cur_map: HashMap<UserId, &FriendRecord> = current.iter().map(|r| (r.id, r)).collect();

        let old_ids: BTreeSet<UserId> = old_map.keys().copied().collect();
        let cur_ids: BTreeSet<UserId> = cur_map.keys().copied().collect();

        let removed = old_ids
            .difference(&cur_ids)
            .map(|id| old_map[id].clone())
            .collect();
        let added = cur_ids
            .difference(&old_ids)
            .map(|id| cur_map[id].clone())
            .collect();

        Self { removed, added }
    }

    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    /// Identifiers of removed friends.
    #[must_use]
    pub fn removed_ids(&self) -> BTreeSet<UserId> {
        self.removed.iter().map(|r| r.id).collect()
    }

    /// Identifiers of added friends.
    #[must_use]
    pub fn added_ids(&self) -> BTreeSet<UserId> {
        self.added.iter().map(|r| r.id).collect()
    }

    /// Activity-log lines, removals first, one per change.
    #[must_use]
    pub fn log_lines(&self, timestamp: &str) -> Vec<String> {
        let removed = self.removed.iter().map(|r| {
            format!("[{timestamp}] UNFRIENDED: {} (ID: {})", r.name_or_unknown(), r.id)
        });
        let added = self.added.iter().map(|r| {
            format!("[{timestamp}] NEW FRIEND: {} (ID: {})", r.name_or_unknown(), r.id)
        });
        removed.chain(added).collect()
    }

    /// Human-readable report grouping removals then additions.
    #[must_use]
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", style("--- ACTIVITY REPORT ---").magenta().bold());

        if !self.removed.is_empty() {
            let _ = writeln!(out, "{}", style(format!("LOST ({}):", self.removed.len())).red());
            for r in &self.removed {
                let _ = writeln!(out, "   - {} (@{})", r.name_or_unknown(), r.display_name_or_dash());
            }
        }

        if !self.added.is_empty() {
            let _ = writeln!(out, "{}", style(format!("NEW ({}):", self.added.len())).green());
            for r in &self.added {
                let _ = writeln!(out, "   + {} (@{})", r.name_or_unknown(), r.display_name_or_dash());
            }
        }

        let _ = writeln!(out, "{}", style("-----------------------").magenta().bold());
        out
    }
}

/// Result of comparing the current list with the stored snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Too many current records lack a name to trust a diff.
    SkippedCorrupt {
        /// Fraction of current records without a name.
        nameless_fraction: f64,
    },
    /// No previous snapshot exists for the account.
    FirstRun,
    /// Same identifiers as last time.
    NoChanges,
    /// Something was added or removed.
    Changes(ChangeSet),
}

/// Decides whether and what to report.
#[derive(Debug, Clone, Copy)]
pub struct ChangeAnalyzer {
    max_nameless: f64,
}

impl ChangeAnalyzer {
    /// Skip analysis once the nameless fraction reaches `max_nameless`.
    #[must_use]
    pub fn new(max_nameless: f64) -> Self {
        Self { max_nameless }
    }

    /// Compare `current` with the `previous` snapshot, if any.
    #[must_use]
    pub fn analyze(&self, current: &[FriendRecord], previous: Option<&[FriendRecord]>) -> AnalysisOutcome {
        let fraction = nameless_fraction(current);
        if !current.is_empty() && fraction >= self.max_nameless {
            return AnalysisOutcome::SkippedCorrupt {
                nameless_fraction: fraction,
            };
        }

        let Some(previous) = previous else {
            return AnalysisOutcome::FirstRun;
        };

        let changes = ChangeSet::compute(previous, current);
        if changes.is_empty() {
            AnalysisOutcome::NoChanges
        } else {
            AnalysisOutcome::Changes(changes)
        }
    }
}

/// Append-only per-account record of detected changes.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    path: PathBuf,
}

impl ActivityLog {
    /// Log stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line per change, stamped with `now`.
    pub fn record(&self, changes: &ChangeSet, now: DateTime<Local>) -> Result<usize> {
        let timestamp = now.format(LOG_TIMESTAMP_FORMAT).to_string();
        let lines = changes.log_lines(&timestamp);
        self.append(&lines)?;
        info!(path = %self.path.display(), lines = lines.len(), "Activity log updated");
        Ok(lines.len())
    }

    /// Append raw lines; nothing is written for an empty slice.
    pub fn append(&self, lines: &[String]) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                TrackerError::io(format!("Failed to create directory: {}", parent.display()), e)
            })?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                TrackerError::io(format!("Failed to open activity log: {}", self.path.display()), e)
            })?;

        let mut buf = String::new();
        for line in lines {
            buf.push_str(line);
            buf.push('\n');
        }
        file.write_all(buf.as_bytes()).map_err(|e| {
            TrackerError::io(format!("Failed to append to activity log: {}", self.path.display()), e)
        })
    }

    /// The last `limit` lines of the log, oldest first. Missing log is empty.
    pub fn tail(&self, limit: usize) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            TrackerError::io(format!("Failed to read activity log: {}", self.path.display()), e)
        })?;
        let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(limit);
        Ok(lines[start..].iter().map(|l| (*l).to_string()).collect())
    }
}
