//! CLI command implementations.
//!
//! Each command is implemented in its own module with a `run` function
//! that handles the command logic.

pub mod config;
pub mod history;
pub mod show;
pub mod sync;

use crate::cli::Cli;
use crate::error::{Result, TrackerError};
use crate::store::SnapshotStore;

/// Snapshot store for the effective data directory.
pub fn open_store(cli: &Cli) -> Result<SnapshotStore> {
    let config = cli.load_config()?;
    Ok(SnapshotStore::new(
        config.data_dir()?,
        config.guard.save_max_nameless,
    ))
}

/// Pick the account to read: the one given, or the only one stored.
pub fn resolve_account(store: &SnapshotStore, account: Option<&str>) -> Result<String> {
    if let Some(account) = account {
        return Ok(account.to_string());
    }

    let mut accounts = store.accounts()?;
    match accounts.len() {
        1 => Ok(accounts.remove(0)),
        0 => Err(TrackerError::InvalidArgument {
            name: "account".to_string(),
            reason: format!("no snapshots in {}", store.data_dir().display()),
        }),
        _ => Err(TrackerError::InvalidArgument {
            name: "account".to_string(),
            reason: format!("several accounts stored, pick one of: {}", accounts.join(", ")),
        }),
    }
}
