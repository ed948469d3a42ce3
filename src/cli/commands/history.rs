//! History command implementation.
//!
//! Prints the most recent activity-log lines for an account.

use crate::cli::{Cli, HistoryArgs};
use crate::error::Result;

use super::{open_store, resolve_account};

/// Run the history command.
pub fn run(cli: &Cli, args: &HistoryArgs) -> Result<()> {
    let store = open_store(cli)?;
    let account = resolve_account(&store, args.account.as_deref())?;
    let lines = store.activity_log(&account).tail(args.limit)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
        return Ok(());
    }

    if lines.is_empty() {
        if !cli.quiet {
            println!("No recorded activity for {account}.");
        }
        return Ok(());
    }

    for line in &lines {
        println!("{line}");
    }
    Ok(())
}
