//! Per-account snapshot persistence.
//!
//! Each account owns three files in the data directory:
//! `<account>_friends.json`, `<account>_friends.csv` and
//! `<account>_activity_log.txt`. The first two are replaced wholesale on
//! every accepted save; the log is only ever appended to.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::analysis::ActivityLog;
use crate::error::{Result, TrackerError};
use crate::model::{nameless_fraction, FriendRecord};
use crate::util::{atomic_write, atomic_write_with, sanitize_account_key};

/// Column order of the tabular export.
pub const CSV_COLUMNS: [&str; 4] = ["id", "name", "displayName", "hasVerifiedBadge"];

const SNAPSHOT_SUFFIX: &str = "_friends.json";

/// Outcome of a save request.
#[derive(Debug)]
pub enum SaveOutcome {
    /// The list was empty; nothing was touched.
    Empty,
    /// Too many records lack a name; the previous snapshot was kept.
    Aborted {
        /// Fraction of records without a name.
        nameless_fraction: f64,
    },
    /// Both writes were attempted; each reports its own result.
    Written {
        /// Structured snapshot write.
        json: Result<PathBuf>,
        /// Tabular export write.
        csv: Result<PathBuf>,
    },
}

impl SaveOutcome {
    /// Whether both files were written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Written { json: Ok(_), csv: Ok(_) })
    }
}

/// File locations for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFiles {
    /// Structured snapshot.
    pub snapshot: PathBuf,
    /// Tabular export.
    pub export: PathBuf,
    /// Append-only activity log.
    pub activity_log: PathBuf,
}

/// Reads and writes snapshots under a data directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    data_dir: PathBuf,
    max_nameless: f64,
}

impl SnapshotStore {
    /// Store rooted at `data_dir`, refusing saves once the nameless
    /// fraction reaches `max_nameless`.
    pub fn new(data_dir: impl Into<PathBuf>, max_nameless: f64) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_nameless,
        }
    }

    /// Root directory for account files.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Paths used for `account`.
    #[must_use]
    pub fn files(&self, account: &str) -> AccountFiles {
        let key = sanitize_account_key(account);
        AccountFiles {
            snapshot: self.data_dir.join(format!("{key}{SNAPSHOT_SUFFIX}")),
            export: self.data_dir.join(format!("{key}_friends.csv")),
            activity_log: self.data_dir.join(format!("{key}_activity_log.txt")),
        }
    }

    /// Account keys that have a stored snapshot, sorted.
    pub fn accounts(&self) -> Result<Vec<String>> {
        let entries = match std::fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(TrackerError::io(
                    format!("Failed to list data directory: {}", self.data_dir.display()),
                    e,
                ))
            }
        };

        let mut accounts: Vec<String> = entries.filter_map(snapshot_account).collect();
        accounts.sort();
        Ok(accounts)
    }

    /// Activity log for `account`.
    #[must_use]
    pub fn activity_log(&self, account: &str) -> ActivityLog {
        ActivityLog::new(self.files(account).activity_log)
    }

    /// Load the stored snapshot; `Ok(None)` when there is none yet.
    pub fn load(&self, account: &str) -> Result<Option<Vec<FriendRecord>>> {
        let path = self.files(account).snapshot;
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            TrackerError::io(format!("Failed to read snapshot: {}", path.display()), e)
        })?;
        let records = serde_json::from_str(&content).map_err(|e| {
            TrackerError::serialization(format!("Snapshot is not valid: {}", path.display()), e)
        })?;
        Ok(Some(records))
    }

    /// Load the stored snapshot for use as a fallback source.
    ///
    /// Unreadable snapshots are logged and treated as absent.
    pub fn load_or_empty(&self, account: &str) -> Vec<FriendRecord> {
        match self.load(account) {
            Ok(records) => records.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable snapshot");
                Vec::new()
            }
        }
    }

    /// Persist `friends` as the new snapshot for `account`.
    ///
    /// The structured file and the tabular export are written independently;
    /// a failure of one does not prevent the other.
    pub fn save(&self, account: &str, friends: &[FriendRecord]) -> SaveOutcome {
        if friends.is_empty() {
            return SaveOutcome::Empty;
        }

        let fraction = nameless_fraction(friends);
        if fraction >= self.max_nameless {
            error!(
                nameless_fraction = fraction,
                "Data corruption detected (names missing). Aborting save"
            );
            return SaveOutcome::Aborted {
                nameless_fraction: fraction,
            };
        }

        let files = self.files(account);

        let json = write_json(&files.snapshot, friends);
        if let Err(e) = &json {
            error!(error = %e, "Failed to save JSON snapshot");
        }

        let csv = atomic_write_with(&files.export, |w| write_csv(w, friends))
            .map(|()| files.export.clone());
        if let Err(e) = &csv {
            error!(error = %e, "Failed to save CSV export");
        }

        if json.is_ok() && csv.is_ok() {
            info!(count = friends.len(), "Database updated");
        }

        SaveOutcome::Written { json, csv }
    }
}

/// Account key of a directory entry holding a snapshot; unreadable entries are logged and skipped.
fn snapshot_account(entry: io::Result<std::fs::DirEntry>) -> Option<String> {
    match entry {
        Ok(entry) => entry
            .file_name()
            .to_str()
            .and_then(|name| name.strip_suffix(SNAPSHOT_SUFFIX))
            .map(str::to_string),
        Err(e) => {
            warn!(error = %e, "Skipping unreadable data directory entry");
            None
        }
    }
}

fn write_json(path: &Path, friends: &[FriendRecord]) -> Result<PathBuf> {
    let content = serde_json::to_vec_pretty(friends)
        .map_err(|e| TrackerError::serialization("Failed to encode snapshot", e))?;
    atomic_write(path, &content)?;
    Ok(path.to_path_buf())
}

/// Write `friends` as CSV with a header row.
pub fn write_csv<W: Write + ?Sized>(writer: &mut W, friends: &[FriendRecord]) -> io::Result<()> {
    write_row(writer, &CSV_COLUMNS)?;
    for friend in friends {
        let id = friend.id.to_string();
        let badge = friend
            .has_verified_badge
            .map(|b| if b { "True" } else { "False" })
            .unwrap_or("");
        write_row(
            writer,
            &[
                &id,
                friend.name.as_deref().unwrap_or(""),
                friend.display_name.as_deref().unwrap_or(""),
                badge,
            ],
        )?;
    }
    Ok(())
}

fn write_row<W: Write + ?Sized>(writer: &mut W, fields: &[&str]) -> io::Result<()> {
    let line: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    write!(writer, "{}\r\n", line.join(","))
}

/// Quote a field when it contains a delimiter, quote or line break.
fn escape_field(value: &str) -> String {
    let needs_quoting =
        value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r');

    if needs_quoting {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
